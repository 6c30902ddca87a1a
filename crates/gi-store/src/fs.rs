use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::{validate_key, KeyValueStore};

/// File-backed key/value store rooted at a repository's metadata directory.
///
/// Each key maps to one file; `/` in a key maps to a subdirectory. Writes go
/// to a temporary file in the destination directory and are renamed into
/// place, so a reader never observes a partially written value.
#[derive(Debug, Clone)]
pub struct FsKvStore {
    root: PathBuf,
}

impl FsKvStore {
    /// Open a store rooted at `root`. The directory is not created.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory (and parents) and open a store on it.
    pub fn create(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "created metadata directory");
        Ok(Self { root })
    }

    /// The metadata directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns `true` if the root directory exists.
    pub fn is_present(&self) -> bool {
        self.root.is_dir()
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

impl KeyValueStore for FsKvStore {
    fn save(&self, key: &str, content: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, namespace: &str) -> StoreResult<BTreeSet<String>> {
        let dir = self.path_for(namespace)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            // Skip in-flight temporary files.
            if name.starts_with('.') {
                continue;
            }
            keys.insert(format!("{namespace}/{name}"));
        }
        Ok(keys)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.path_for(key)?.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn store() -> (tempfile::TempDir, FsKvStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsKvStore::create(dir.path().join(".gi")).unwrap();
        (dir, store)
    }

    #[test]
    fn save_creates_nested_directories() {
        let (dir, store) = store();
        store.save("objects/blobs/abc", b"data").unwrap();
        let on_disk = fs::read(dir.path().join(".gi/objects/blobs/abc")).unwrap();
        assert_eq!(on_disk, b"data");
    }

    #[test]
    fn load_returns_saved_bytes() {
        let (_dir, store) = store();
        store.save_string("HEAD", "ref: master").unwrap();
        assert_eq!(store.load_string("HEAD").unwrap().unwrap(), "ref: master");
    }

    #[test]
    fn load_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.load("INDEX").unwrap().is_none());
        assert!(!store.exists("INDEX").unwrap());
    }

    #[test]
    fn save_overwrites() {
        let (_dir, store) = store();
        store.save("INDEX", b"one").unwrap();
        store.save("INDEX", b"two").unwrap();
        assert_eq!(store.load("INDEX").unwrap().unwrap(), b"two");
    }

    #[test]
    fn list_returns_direct_children_only() {
        let (_dir, store) = store();
        store.save("objects/trees/t1", b"1").unwrap();
        store.save("objects/trees/t2", b"2").unwrap();
        store.save("objects/blobs/b1", b"3").unwrap();

        let keys: Vec<String> = store.list("objects/trees").unwrap().into_iter().collect();
        assert_eq!(keys, vec!["objects/trees/t1", "objects/trees/t2"]);
        assert!(store.list("objects").unwrap().is_empty());
        assert!(store.list("objects/commits").unwrap().is_empty());
    }

    #[test]
    fn delete_then_exists() {
        let (_dir, store) = store();
        store.save("branches.json", b"{}").unwrap();
        assert!(store.exists("branches.json").unwrap());
        assert!(store.delete("branches.json").unwrap());
        assert!(!store.delete("branches.json").unwrap());
        assert!(!store.exists("branches.json").unwrap());
    }

    #[test]
    fn keys_cannot_escape_root() {
        let (_dir, store) = store();
        assert!(matches!(
            store.save("../outside", b"x"),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn open_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsKvStore::open(dir.path().join(".gi"));
        assert!(!store.is_present());
        assert!(store.load("HEAD").unwrap().is_none());
    }
}
