//! The core Index structure managing staged entries in memory.
//!
//! The [`Index`] manages a `BTreeMap<String, ObjectId>` as the staging area.
//! File content flows through the [`WorkingDirectory`] passed to each
//! operation; blobs and trees go through the object store the index was
//! created with.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use gi_store::{BlobStore, ObjectStore, PathMap, Tree, TreeStore, WorkingDirectory};
use gi_types::ObjectId;
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// Returns `true` if `path` equals `dir` or lies below it. The empty `dir`
/// covers everything.
pub(crate) fn is_under(path: &str, dir: &str) -> bool {
    dir.is_empty()
        || path == dir
        || (path.starts_with(dir) && path.as_bytes().get(dir.len()) == Some(&b'/'))
}

/// The staging index: the path → blob mapping the next commit will record.
pub struct Index {
    /// All tracked entries, keyed by path.
    entries: BTreeMap<String, ObjectId>,
    /// Cached tree ObjectId for the current staged state (invalidated on changes).
    tree_cache: Option<ObjectId>,
    blobs: BlobStore,
    trees: TreeStore,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entries", &self.entries.len())
            .field("tree_cache", &self.tree_cache)
            .finish()
    }
}

impl PathMap for Index {
    fn path_map(&self) -> &BTreeMap<String, ObjectId> {
        &self.entries
    }
}

impl Index {
    /// Create a new empty index backed by the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            entries: BTreeMap::new(),
            tree_cache: None,
            blobs: BlobStore::new(store.clone()),
            trees: TreeStore::new(store),
        }
    }

    /// Create an index whose mapping equals `tree`.
    pub fn from_tree(store: Arc<dyn ObjectStore>, tree: &Tree) -> Self {
        let mut index = Self::new(store);
        index.entries = tree.path_map().clone();
        index
    }

    /// Load the persisted tree `id` as an index.
    pub fn load(store: Arc<dyn ObjectStore>, id: &ObjectId) -> IndexResult<Self> {
        let trees = TreeStore::new(store.clone());
        let tree = trees.load(id)?;
        let mut index = Self::from_tree(store, &tree);
        index.tree_cache = Some(*id);
        Ok(index)
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Blob staged at `path`.
    pub fn get(&self, path: &str) -> Option<&ObjectId> {
        self.entries.get(path)
    }

    /// Returns `true` if `path` is tracked.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ObjectId)> {
        self.entries.iter()
    }

    /// Tracked paths equal to or below `dir`, sorted.
    pub fn tracked_under(&self, dir: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|path| is_under(path, dir))
            .cloned()
            .collect()
    }

    // ---------------------------------------------------------------
    // Entry mutation
    // ---------------------------------------------------------------

    /// Track `path` at blob `id`, replacing any previous entry.
    pub fn upsert(&mut self, path: &str, id: ObjectId) -> IndexResult<()> {
        if path.is_empty() {
            return Err(IndexError::InvalidPath("empty path".to_string()));
        }
        if self.entries.insert(path.to_string(), id) != Some(id) {
            self.tree_cache = None;
        }
        Ok(())
    }

    /// Stop tracking exactly `path`. Returns `true` if it was tracked.
    pub fn remove(&mut self, path: &str) -> bool {
        let removed = self.entries.remove(path).is_some();
        if removed {
            self.tree_cache = None;
        }
        removed
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Stage `path` from the working directory.
    ///
    /// A directory stages every file beneath it and un-tracks entries below
    /// it whose files are gone. An existing file is stored as a blob and
    /// upserted. A missing path un-tracks whatever was tracked at or below it.
    pub fn stage(&mut self, workdir: &dyn WorkingDirectory, path: &str) -> IndexResult<()> {
        let mut worklist = vec![path.to_string()];
        while let Some(current) = worklist.pop() {
            if workdir.is_dir(&current) {
                for stale in self.tracked_under(&current) {
                    if !workdir.file_exists(&stale) {
                        self.remove(&stale);
                        debug!(path = %stale, "untracked deleted file");
                    }
                }
                worklist.extend(workdir.list_files(&current)?);
            } else if workdir.file_exists(&current) {
                let id = self.blobs.put(workdir, &current)?;
                self.upsert(&current, id)?;
                debug!(path = %current, blob = %id.short_hex(), "staged file");
            } else {
                for gone in self.tracked_under(&current) {
                    self.remove(&gone);
                    debug!(path = %gone, "untracked deleted file");
                }
            }
        }
        Ok(())
    }

    /// Stop tracking `path` and every tracked entry below it.
    ///
    /// The working directory is never touched. Returns the number of
    /// entries removed.
    pub fn unstage(&mut self, path: &str) -> usize {
        let targets = self.tracked_under(path);
        for target in &targets {
            self.remove(target);
        }
        debug!(path, removed = targets.len(), "unstaged");
        targets.len()
    }

    // ---------------------------------------------------------------
    // Tree conversion
    // ---------------------------------------------------------------

    /// Content-addressed ID of the current mapping. Writes nothing.
    pub fn identifier(&mut self) -> IndexResult<ObjectId> {
        if let Some(id) = self.tree_cache {
            return Ok(id);
        }
        let id = self.freeze().id()?;
        self.tree_cache = Some(id);
        Ok(id)
    }

    /// Snapshot the current mapping as a frozen tree.
    pub fn freeze(&self) -> Tree {
        Tree::new(self.entries.clone())
    }

    /// Persist the current mapping as a tree object and return its ID.
    pub fn write_tree(&mut self) -> IndexResult<ObjectId> {
        let id = self.trees.dump(&self.freeze())?;
        self.tree_cache = Some(id);
        Ok(id)
    }

    // ---------------------------------------------------------------
    // Working-directory sync
    // ---------------------------------------------------------------

    /// Bring `path` to the `target` state in both the working directory and
    /// the mapping: `Some(id)` writes the blob's content, `None` deletes.
    pub fn adopt(
        &mut self,
        workdir: &dyn WorkingDirectory,
        path: &str,
        target: Option<ObjectId>,
    ) -> IndexResult<()> {
        match target {
            Some(id) => {
                let content = self.blobs.get(&id)?;
                workdir.write_file(path, &content)?;
                self.upsert(path, id)?;
            }
            None => {
                workdir.delete_file(path)?;
                self.remove(path);
            }
        }
        Ok(())
    }

    /// Make the working directory and this index match `future`.
    ///
    /// Paths tracked here but absent from `future` are deleted from the
    /// working directory; every path of `future` is written from its blob.
    pub fn sync_working_directory_to(
        &mut self,
        workdir: &dyn WorkingDirectory,
        future: &Tree,
    ) -> IndexResult<()> {
        let stale = gi_diff::diff_added(&*self, future);
        for path in &stale {
            self.adopt(workdir, path, None)?;
        }
        for (path, id) in future.iter() {
            self.adopt(workdir, path, Some(*id))?;
        }
        debug!(
            deleted = stale.len(),
            written = future.len(),
            "synced working directory"
        );
        Ok(())
    }

    /// Restore only `paths` from `future`.
    ///
    /// A directory path covers every tracked or future path beneath it. A
    /// covered path absent from `future` is deleted from the working
    /// directory and the mapping; a present one is restored and upserted.
    pub fn sync_paths_to(
        &mut self,
        workdir: &dyn WorkingDirectory,
        future: &Tree,
        paths: &[String],
    ) -> IndexResult<()> {
        let mut targets = BTreeSet::new();
        for path in paths {
            targets.extend(self.tracked_under(path));
            targets.extend(future.paths().filter(|p| is_under(p, path)).cloned());
        }
        for path in &targets {
            self.adopt(workdir, path, future.get(path).copied())?;
        }
        debug!(restored = targets.len(), "synced paths");
        Ok(())
    }
}
