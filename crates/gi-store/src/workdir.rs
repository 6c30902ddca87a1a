use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};

/// Access to the files a repository tracks.
///
/// Paths are relative to the working-directory root, `/`-separated, with no
/// leading `/`; the empty path names the root itself. The metadata directory
/// is invisible through this trait.
pub trait WorkingDirectory: Send + Sync {
    /// Every file at or below `dir`, sorted. A missing `dir` lists nothing;
    /// a `dir` naming a file lists that file.
    fn list_files(&self, dir: &str) -> StoreResult<BTreeSet<String>>;

    /// Content of the file at `path`.
    fn read_file(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Write `content` to `path`, creating parent directories.
    fn write_file(&self, path: &str, content: &[u8]) -> StoreResult<()>;

    /// Delete the file at `path` and any parent directories left empty.
    ///
    /// Returns `false` if there was no such file.
    fn delete_file(&self, path: &str) -> StoreResult<bool>;

    /// Returns `true` if `path` is an existing regular file.
    fn file_exists(&self, path: &str) -> bool;

    /// Returns `true` if `path` is an existing directory.
    fn is_dir(&self, path: &str) -> bool;
}

fn check_path(path: &str) -> StoreResult<()> {
    let bad = path.starts_with('/')
        || path.contains('\\')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Returns `true` if `path` equals `dir` or lies below it.
fn is_under(path: &str, dir: &str) -> bool {
    dir.is_empty()
        || path == dir
        || (path.starts_with(dir) && path.as_bytes().get(dir.len()) == Some(&b'/'))
}

/// Collapse `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// File system
// ---------------------------------------------------------------------------

/// Working directory backed by a real directory tree.
///
/// The root is resolved against the current directory once, at construction;
/// nothing consults the current directory afterwards.
#[derive(Debug, Clone)]
pub struct FsWorkingDirectory {
    root: PathBuf,
    metadata_dir: String,
}

impl FsWorkingDirectory {
    /// Open the working directory at `root`, hiding `metadata_dir` (e.g. `.gi`).
    pub fn new(root: impl AsRef<Path>, metadata_dir: impl Into<String>) -> StoreResult<Self> {
        let root = normalize(&std::path::absolute(root.as_ref())?);
        Ok(Self {
            root,
            metadata_dir: metadata_dir.into(),
        })
    }

    /// Absolute root of the working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the metadata directory.
    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(&self.metadata_dir)
    }

    /// Convert a user-supplied path into a repository-relative one.
    ///
    /// Relative inputs are taken relative to the root. Fails if the path
    /// leaves the root or points into the metadata directory.
    pub fn relativize(&self, path: &Path) -> StoreResult<String> {
        let absolute = normalize(&self.root.join(path));
        let outside = || StoreError::InvalidPath(path.display().to_string());
        let relative = absolute.strip_prefix(&self.root).map_err(|_| outside())?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str().ok_or_else(outside)?),
                _ => return Err(outside()),
            }
        }
        if segments.contains(&self.metadata_dir.as_str()) {
            return Err(outside());
        }
        Ok(segments.join("/"))
    }

    /// Validate `path` and reject anything inside the metadata directory.
    fn check(&self, path: &str) -> StoreResult<()> {
        check_path(path)?;
        if path.split('/').any(|segment| segment == self.metadata_dir) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(())
    }

    fn absolute(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            return self.root.clone();
        }
        path.split('/').fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|c| match c {
                Component::Normal(name) => name.to_str(),
                _ => None,
            })
            .collect();
        Some(segments?.join("/"))
    }
}

impl WorkingDirectory for FsWorkingDirectory {
    fn list_files(&self, dir: &str) -> StoreResult<BTreeSet<String>> {
        if !dir.is_empty() {
            self.check(dir)?;
        }
        let base = self.absolute(dir);
        let mut files = BTreeSet::new();
        if !base.exists() {
            return Ok(files);
        }

        let metadata_dir = self.metadata_dir.as_str();
        let walker = WalkDir::new(&base)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == metadata_dir));
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            match self.relative(entry.path()) {
                Some(path) => {
                    files.insert(path);
                }
                None => debug!(path = %entry.path().display(), "skipping non-UTF-8 path"),
            }
        }
        Ok(files)
    }

    fn read_file(&self, path: &str) -> StoreResult<Vec<u8>> {
        self.check(path)?;
        match fs::read(self.absolute(path)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::FileNotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_file(&self, path: &str, content: &[u8]) -> StoreResult<()> {
        self.check(path)?;
        let target = self.absolute(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
        Ok(())
    }

    fn delete_file(&self, path: &str) -> StoreResult<bool> {
        self.check(path)?;
        let target = self.absolute(path);
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        let mut dir = target.parent();
        while let Some(current) = dir {
            if current == self.root.as_path() || !current.starts_with(&self.root) {
                break;
            }
            if fs::read_dir(current)?.next().is_some() {
                break;
            }
            fs::remove_dir(current)?;
            debug!(dir = %current.display(), "removed empty directory");
            dir = current.parent();
        }
        Ok(true)
    }

    fn file_exists(&self, path: &str) -> bool {
        self.check(path).is_ok() && self.absolute(path).is_file()
    }

    fn is_dir(&self, path: &str) -> bool {
        (path.is_empty() || self.check(path).is_ok()) && self.absolute(path).is_dir()
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Working directory held in memory; directories exist implicitly.
///
/// Intended for tests and embedding.
pub struct InMemoryWorkingDirectory {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryWorkingDirectory {
    /// Create an empty working directory.
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
        }
    }

    /// Every file path currently present, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for InMemoryWorkingDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkingDirectory for InMemoryWorkingDirectory {
    fn list_files(&self, dir: &str) -> StoreResult<BTreeSet<String>> {
        if !dir.is_empty() {
            check_path(dir)?;
        }
        let files = self.files.read().expect("lock poisoned");
        Ok(files
            .keys()
            .filter(|path| is_under(path, dir))
            .cloned()
            .collect())
    }

    fn read_file(&self, path: &str) -> StoreResult<Vec<u8>> {
        check_path(path)?;
        let files = self.files.read().expect("lock poisoned");
        files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::FileNotFound(path.to_string()))
    }

    fn write_file(&self, path: &str, content: &[u8]) -> StoreResult<()> {
        check_path(path)?;
        let mut files = self.files.write().expect("lock poisoned");
        files.insert(path.to_string(), content.to_vec());
        Ok(())
    }

    fn delete_file(&self, path: &str) -> StoreResult<bool> {
        check_path(path)?;
        let mut files = self.files.write().expect("lock poisoned");
        Ok(files.remove(path).is_some())
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files.read().expect("lock poisoned").contains_key(path)
    }

    fn is_dir(&self, path: &str) -> bool {
        let files = self.files.read().expect("lock poisoned");
        path.is_empty() || files.keys().any(|p| p != path && is_under(p, path))
    }
}

impl std::fmt::Debug for InMemoryWorkingDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWorkingDirectory")
            .field("files", &self.paths())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs_workdir() -> (tempfile::TempDir, FsWorkingDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let workdir = FsWorkingDirectory::new(dir.path(), ".gi").unwrap();
        (dir, workdir)
    }

    // -----------------------------------------------------------------------
    // Path helpers
    // -----------------------------------------------------------------------

    #[test]
    fn is_under_respects_segment_boundaries() {
        assert!(is_under("src/a.rs", "src"));
        assert!(is_under("src", "src"));
        assert!(is_under("anything", ""));
        assert!(!is_under("srcx/a.rs", "src"));
    }

    #[test]
    fn normalize_is_lexical() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
    }

    // -----------------------------------------------------------------------
    // File system
    // -----------------------------------------------------------------------

    #[test]
    fn write_creates_parents_and_reads_back() {
        let (dir, workdir) = fs_workdir();
        workdir.write_file("src/deep/main.rs", b"fn main() {}").unwrap();
        assert!(dir.path().join("src/deep/main.rs").is_file());
        assert_eq!(workdir.read_file("src/deep/main.rs").unwrap(), b"fn main() {}");
        assert!(workdir.is_dir("src"));
        assert!(workdir.file_exists("src/deep/main.rs"));
    }

    #[test]
    fn listing_hides_metadata_directory() {
        let (dir, workdir) = fs_workdir();
        fs::create_dir_all(dir.path().join(".gi/objects")).unwrap();
        fs::write(dir.path().join(".gi/HEAD"), "ref: master").unwrap();
        workdir.write_file("a.txt", b"a").unwrap();
        workdir.write_file("sub/b.txt", b"b").unwrap();

        let all: Vec<String> = workdir.list_files("").unwrap().into_iter().collect();
        assert_eq!(all, vec!["a.txt", "sub/b.txt"]);
        let sub: Vec<String> = workdir.list_files("sub").unwrap().into_iter().collect();
        assert_eq!(sub, vec!["sub/b.txt"]);
        assert!(workdir.list_files("missing").unwrap().is_empty());
    }

    #[test]
    fn listing_a_file_returns_it() {
        let (_dir, workdir) = fs_workdir();
        workdir.write_file("a.txt", b"a").unwrap();
        let listed: Vec<String> = workdir.list_files("a.txt").unwrap().into_iter().collect();
        assert_eq!(listed, vec!["a.txt"]);
    }

    #[test]
    fn delete_prunes_empty_parents() {
        let (dir, workdir) = fs_workdir();
        workdir.write_file("a/b/c.txt", b"c").unwrap();
        workdir.write_file("a/keep.txt", b"k").unwrap();

        assert!(workdir.delete_file("a/b/c.txt").unwrap());
        assert!(!dir.path().join("a/b").exists());
        assert!(dir.path().join("a/keep.txt").exists());

        assert!(workdir.delete_file("a/keep.txt").unwrap());
        assert!(!dir.path().join("a").exists());
        assert!(dir.path().exists());
    }

    #[test]
    fn delete_missing_is_false() {
        let (_dir, workdir) = fs_workdir();
        assert!(!workdir.delete_file("ghost.txt").unwrap());
    }

    #[test]
    fn read_missing_is_file_not_found() {
        let (_dir, workdir) = fs_workdir();
        assert!(matches!(
            workdir.read_file("ghost.txt"),
            Err(StoreError::FileNotFound(_))
        ));
    }

    #[test]
    fn relativize_inside_root() {
        let (dir, workdir) = fs_workdir();
        let rel = workdir
            .relativize(&dir.path().join("src/../lib/x.rs"))
            .unwrap();
        assert_eq!(rel, "lib/x.rs");
        assert_eq!(workdir.relativize(dir.path()).unwrap(), "");
    }

    #[test]
    fn relativize_resolves_relative_paths_against_root() {
        let (_dir, workdir) = fs_workdir();
        assert_eq!(workdir.relativize(Path::new("a.txt")).unwrap(), "a.txt");
        assert_eq!(workdir.relativize(Path::new("./src/../b.txt")).unwrap(), "b.txt");
        assert!(workdir.relativize(Path::new("../outside.txt")).is_err());
    }

    #[test]
    fn relativize_rejects_outside_and_metadata() {
        let (dir, workdir) = fs_workdir();
        assert!(matches!(
            workdir.relativize(&dir.path().join("../elsewhere")),
            Err(StoreError::InvalidPath(_))
        ));
        assert!(matches!(
            workdir.relativize(&dir.path().join(".gi/HEAD")),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn metadata_directory_is_unreachable() {
        let (dir, workdir) = fs_workdir();
        fs::create_dir_all(dir.path().join(".gi")).unwrap();
        fs::write(dir.path().join(".gi/branches.json"), "{}").unwrap();

        assert!(!workdir.file_exists(".gi/branches.json"));
        assert!(!workdir.is_dir(".gi"));
        for result in [
            workdir.read_file(".gi/branches.json").map(|_| ()),
            workdir.write_file(".gi/HEAD", b"x"),
            workdir.delete_file(".gi/branches.json").map(|_| ()),
            workdir.list_files(".gi").map(|_| ()),
        ] {
            assert!(matches!(result, Err(StoreError::InvalidPath(_))));
        }
        assert_eq!(fs::read_to_string(dir.path().join(".gi/branches.json")).unwrap(), "{}");
        assert!(!dir.path().join(".gi/HEAD").exists());
    }

    #[test]
    fn rejects_escaping_paths() {
        let (_dir, workdir) = fs_workdir();
        assert!(matches!(
            workdir.write_file("../x", b"x"),
            Err(StoreError::InvalidPath(_))
        ));
    }

    // -----------------------------------------------------------------------
    // In memory
    // -----------------------------------------------------------------------

    #[test]
    fn memory_lists_by_directory() {
        let workdir = InMemoryWorkingDirectory::new();
        workdir.write_file("a.txt", b"a").unwrap();
        workdir.write_file("dir/b.txt", b"b").unwrap();
        workdir.write_file("dirx/c.txt", b"c").unwrap();

        let listed: Vec<String> = workdir.list_files("dir").unwrap().into_iter().collect();
        assert_eq!(listed, vec!["dir/b.txt"]);
        assert_eq!(workdir.list_files("").unwrap().len(), 3);
        assert!(workdir.is_dir("dir"));
        assert!(!workdir.is_dir("a.txt"));
        assert!(workdir.is_dir(""));
    }

    #[test]
    fn memory_read_write_delete() {
        let workdir = InMemoryWorkingDirectory::new();
        workdir.write_file("x", b"1").unwrap();
        assert_eq!(workdir.read_file("x").unwrap(), b"1");
        assert!(workdir.delete_file("x").unwrap());
        assert!(!workdir.file_exists("x"));
        assert!(!workdir.delete_file("x").unwrap());
        assert!(!workdir.is_dir("x"));
    }
}
