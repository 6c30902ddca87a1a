//! Working directory status types.
//!
//! Status compares three path maps: the HEAD commit's tree, the index, and a
//! fresh hash-only scan of the working directory. Nothing here writes to
//! storage.

use gi_diff::{diff_added, diff_modified, diff_removed};
use gi_store::{Blob, PathMap, Tree, WorkingDirectory};

use crate::error::IndexResult;

/// Complete status of the working directory relative to HEAD and the index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkdirStatus {
    /// Differences between the index and the HEAD tree, sorted by path.
    pub staged: Vec<StatusEntry>,
    /// Differences between the working directory and the index, sorted by path.
    pub unstaged: Vec<StatusEntry>,
    /// Files present in the working directory but not tracked.
    pub untracked: Vec<String>,
}

impl WorkdirStatus {
    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }
}

/// A single status entry representing a file change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusEntry {
    /// The file path relative to the workdir root.
    pub path: String,
    /// The kind of change.
    pub status: FileStatus,
}

impl StatusEntry {
    /// Create a new status entry.
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

/// The kind of file change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStatus {
    /// A path that did not previously exist.
    New,
    /// An existing path whose content has changed.
    Modified,
    /// A path that has been removed.
    Deleted,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new file"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Hash every file in the working directory without storing anything.
pub fn scan_working_directory(workdir: &dyn WorkingDirectory) -> IndexResult<Tree> {
    let mut scanned = Vec::new();
    for path in workdir.list_files("")? {
        let content = workdir.read_file(&path)?;
        scanned.push((path, Blob::id_of(&content)));
    }
    Ok(scanned.into_iter().collect())
}

fn entries(groups: Vec<(Vec<String>, FileStatus)>) -> Vec<StatusEntry> {
    let mut out: Vec<StatusEntry> = groups
        .into_iter()
        .flat_map(|(paths, status)| paths.into_iter().map(move |p| StatusEntry::new(p, status)))
        .collect();
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

/// Compute status from the HEAD tree, the index, and a working-directory scan.
///
/// Staged changes compare `index` against `head`; unstaged changes compare
/// `scanned` against `index`; untracked files are scanned paths the index
/// does not know.
pub fn compute_status<I>(head: &Tree, index: &I, scanned: &Tree) -> WorkdirStatus
where
    I: PathMap + ?Sized,
{
    let staged = entries(vec![
        (diff_added(index, head), FileStatus::New),
        (diff_modified(index, head), FileStatus::Modified),
        (diff_removed(index, head), FileStatus::Deleted),
    ]);
    let unstaged = entries(vec![
        (diff_modified(scanned, index), FileStatus::Modified),
        (diff_removed(scanned, index), FileStatus::Deleted),
    ]);
    WorkdirStatus {
        staged,
        unstaged,
        untracked: diff_added(scanned, index),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::index::Index;
    use gi_store::{InMemoryKvStore, InMemoryWorkingDirectory, KvObjectStore, ObjectStore};

    fn fixture(files: &[(&str, &str)]) -> (InMemoryWorkingDirectory, Index) {
        let objects: Arc<dyn ObjectStore> =
            Arc::new(KvObjectStore::new(Arc::new(InMemoryKvStore::new())));
        let wd = InMemoryWorkingDirectory::new();
        for (path, content) in files {
            wd.write_file(path, content.as_bytes()).unwrap();
        }
        (wd, Index::new(objects))
    }

    fn status_of(head: &Tree, index: &Index, wd: &InMemoryWorkingDirectory) -> WorkdirStatus {
        compute_status(head, index, &scan_working_directory(wd).unwrap())
    }

    #[test]
    fn empty_status_is_clean() {
        assert!(WorkdirStatus::default().is_clean());
    }

    #[test]
    fn clean_after_commit_state() {
        let (wd, mut index) = fixture(&[("a.txt", "hi")]);
        index.stage(&wd, "").unwrap();
        let head = index.freeze();
        assert!(status_of(&head, &index, &wd).is_clean());
    }

    #[test]
    fn untracked_file_reported() {
        let (wd, index) = fixture(&[("new.txt", "n")]);
        let status = status_of(&Tree::empty(), &index, &wd);
        assert_eq!(status.untracked, vec!["new.txt"]);
        assert!(status.staged.is_empty());
        assert!(status.unstaged.is_empty());
    }

    #[test]
    fn staged_new_modified_deleted() {
        let (wd, mut index) = fixture(&[("keep", "k"), ("edit", "v1"), ("drop", "d")]);
        index.stage(&wd, "").unwrap();
        let head = index.freeze();

        wd.write_file("edit", b"v2").unwrap();
        wd.write_file("add", b"a").unwrap();
        wd.delete_file("drop").unwrap();
        index.stage(&wd, "").unwrap();

        let status = status_of(&head, &index, &wd);
        assert_eq!(
            status.staged,
            vec![
                StatusEntry::new("add", FileStatus::New),
                StatusEntry::new("drop", FileStatus::Deleted),
                StatusEntry::new("edit", FileStatus::Modified),
            ]
        );
        assert!(status.unstaged.is_empty());
        assert!(status.untracked.is_empty());
    }

    #[test]
    fn unstaged_modified_and_deleted() {
        let (wd, mut index) = fixture(&[("a.txt", "hi"), ("b.txt", "bye")]);
        index.stage(&wd, "").unwrap();
        let head = index.freeze();

        wd.write_file("a.txt", b"changed").unwrap();
        wd.delete_file("b.txt").unwrap();

        let status = status_of(&head, &index, &wd);
        assert!(status.staged.is_empty());
        assert_eq!(
            status.unstaged,
            vec![
                StatusEntry::new("a.txt", FileStatus::Modified),
                StatusEntry::new("b.txt", FileStatus::Deleted),
            ]
        );
    }

    #[test]
    fn scan_hashes_every_file() {
        let (wd, _index) = fixture(&[("a.txt", "hi"), ("dir/b.txt", "b")]);
        let scanned = scan_working_directory(&wd).unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned.get("a.txt"), Some(&Blob::id_of(b"hi")));
        assert_eq!(scanned.get("dir/b.txt"), Some(&Blob::id_of(b"b")));
    }

    #[test]
    fn file_status_display() {
        assert_eq!(FileStatus::New.to_string(), "new file");
        assert_eq!(FileStatus::Modified.to_string(), "modified");
        assert_eq!(FileStatus::Deleted.to_string(), "deleted");
    }
}
