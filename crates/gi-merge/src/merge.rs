use std::collections::{BTreeMap, BTreeSet};

use gi_index::Index;
use gi_store::{PathMap, Tree, WorkingDirectory};
use gi_types::ObjectId;
use tracing::debug;

use crate::error::MergeResult;

/// The outcome of a three-way merge, decided per path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergePlan {
    /// Paths that take their version: `Some(id)` writes, `None` deletes.
    adopt: BTreeMap<String, Option<ObjectId>>,
    /// Paths changed differently on both sides.
    conflicts: BTreeSet<String>,
}

impl MergePlan {
    /// Paths to adopt from their side, in path order.
    pub fn adoptions(&self) -> impl Iterator<Item = (&String, &Option<ObjectId>)> {
        self.adopt.iter()
    }

    /// Conflicting paths, sorted.
    pub fn conflicts(&self) -> &BTreeSet<String> {
        &self.conflicts
    }

    /// Returns `true` if no path conflicts.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Returns `true` if applying the plan changes nothing.
    pub fn is_noop(&self) -> bool {
        self.adopt.is_empty()
    }
}

/// Decide the outcome of merging `theirs` into `ours` relative to `base`.
///
/// For every path in the union of the three maps, with "absent" as a state:
/// - theirs equals base, or theirs equals ours: keep ours;
/// - otherwise, ours equals base: adopt theirs;
/// - otherwise: conflict.
pub fn plan<O, T, B>(ours: &O, theirs: &T, base: &B) -> MergePlan
where
    O: PathMap + ?Sized,
    T: PathMap + ?Sized,
    B: PathMap + ?Sized,
{
    let (ours, theirs, base) = (ours.path_map(), theirs.path_map(), base.path_map());
    let paths: BTreeSet<&String> = ours.keys().chain(theirs.keys()).chain(base.keys()).collect();

    let mut merge = MergePlan::default();
    for path in paths {
        let o = ours.get(path);
        let t = theirs.get(path);
        let b = base.get(path);
        if t == b || t == o {
            continue;
        }
        if o == b {
            merge.adopt.insert(path.clone(), t.copied());
        } else {
            merge.conflicts.insert(path.clone());
        }
    }
    merge
}

/// Write every adoption in `plan` into `ours` and the working directory.
pub fn apply(
    plan: &MergePlan,
    ours: &mut Index,
    workdir: &dyn WorkingDirectory,
) -> MergeResult<()> {
    for (path, target) in plan.adoptions() {
        ours.adopt(workdir, path, *target)?;
    }
    debug!(
        adopted = plan.adopt.len(),
        conflicts = plan.conflicts.len(),
        "applied merge plan"
    );
    Ok(())
}

/// Merge `theirs` into `ours` against `base`, returning conflicting paths.
///
/// Non-conflicting changes from their side are written to the working
/// directory and staged in `ours`; conflicting paths are left untouched.
pub fn three_way_merge(
    ours: &mut Index,
    workdir: &dyn WorkingDirectory,
    theirs: &Tree,
    base: &Tree,
) -> MergeResult<BTreeSet<String>> {
    let merge = plan(&*ours, theirs, base);
    apply(&merge, ours, workdir)?;
    Ok(merge.conflicts)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use gi_store::{Blob, InMemoryKvStore, InMemoryWorkingDirectory, KvObjectStore, ObjectStore};

    fn tree(entries: &[(&str, &str)]) -> Tree {
        entries
            .iter()
            .map(|(path, content)| (path.to_string(), Blob::id_of(content.as_bytes())))
            .collect()
    }

    /// An index and working directory both holding `files`, with every
    /// referenced blob (including `extra`) stored.
    fn checkout(
        files: &[(&str, &str)],
        extra: &[&str],
    ) -> (InMemoryWorkingDirectory, Index) {
        let objects: Arc<dyn ObjectStore> =
            Arc::new(KvObjectStore::new(Arc::new(InMemoryKvStore::new())));
        let blobs = gi_store::BlobStore::new(objects.clone());
        for content in extra {
            blobs.put_bytes(content.as_bytes()).unwrap();
        }
        let wd = InMemoryWorkingDirectory::new();
        for (path, content) in files {
            wd.write_file(path, content.as_bytes()).unwrap();
        }
        let mut index = Index::new(objects);
        index.stage(&wd, "").unwrap();
        (wd, index)
    }

    // -----------------------------------------------------------------------
    // Planning
    // -----------------------------------------------------------------------

    #[test]
    fn theirs_changed_ours_unchanged_adopts_theirs() {
        let base = tree(&[("f", "1")]);
        let ours = tree(&[("f", "1")]);
        let theirs = tree(&[("f", "2")]);
        let merge = plan(&ours, &theirs, &base);
        assert!(merge.is_clean());
        let adopted: Vec<_> = merge.adoptions().collect();
        assert_eq!(adopted, vec![(&"f".to_string(), &Some(Blob::id_of(b"2")))]);
    }

    #[test]
    fn theirs_unchanged_keeps_ours() {
        let base = tree(&[("f", "1")]);
        let ours = tree(&[("f", "changed")]);
        let merge = plan(&ours, &base, &base);
        assert!(merge.is_noop());
        assert!(merge.is_clean());
    }

    #[test]
    fn identical_changes_do_not_conflict() {
        let base = tree(&[("f", "1")]);
        let both = tree(&[("f", "2")]);
        let merge = plan(&both, &both, &base);
        assert!(merge.is_noop());
        assert!(merge.is_clean());
    }

    #[test]
    fn divergent_changes_conflict() {
        let base = tree(&[("f", "1")]);
        let ours = tree(&[("f", "ours")]);
        let theirs = tree(&[("f", "theirs")]);
        let merge = plan(&ours, &theirs, &base);
        assert_eq!(merge.conflicts().iter().collect::<Vec<_>>(), vec!["f"]);
        assert!(merge.is_noop());
    }

    #[test]
    fn additions_and_deletions() {
        let base = tree(&[("gone", "g"), ("kept", "k")]);
        let ours = tree(&[("gone", "g"), ("kept", "k")]);
        let theirs = tree(&[("kept", "k"), ("added", "a")]);
        let merge = plan(&ours, &theirs, &base);
        let adopted: BTreeMap<_, _> = merge
            .adoptions()
            .map(|(p, t)| (p.clone(), *t))
            .collect();
        assert_eq!(adopted.get("added"), Some(&Some(Blob::id_of(b"a"))));
        assert_eq!(adopted.get("gone"), Some(&None));
        assert!(!adopted.contains_key("kept"));
    }

    #[test]
    fn absent_everywhere_but_one_side() {
        // Only we added the path: theirs == base (both absent), keep ours.
        let base = Tree::empty();
        let ours = tree(&[("mine", "m")]);
        let merge = plan(&ours, &base, &base);
        assert!(merge.is_noop());
        assert!(merge.is_clean());
    }

    #[test]
    fn delete_versus_modify_conflicts() {
        let base = tree(&[("f", "1")]);
        let ours = tree(&[("f", "2")]);
        let theirs = Tree::empty();
        let merge = plan(&ours, &theirs, &base);
        assert!(merge.conflicts().contains("f"));
    }

    #[test]
    fn both_add_different_content_conflicts() {
        let base = Tree::empty();
        let ours = tree(&[("f", "a")]);
        let theirs = tree(&[("f", "b")]);
        assert!(!plan(&ours, &theirs, &base).is_clean());
    }

    // -----------------------------------------------------------------------
    // Applying
    // -----------------------------------------------------------------------

    #[test]
    fn three_way_merge_writes_adopted_paths() {
        let (wd, mut ours) = checkout(
            &[("shared", "1"), ("ours_only", "o"), ("to_delete", "d")],
            &["2", "new"],
        );
        let base = tree(&[("shared", "1"), ("to_delete", "d")]);
        let theirs = tree(&[("shared", "2"), ("theirs_only", "new")]);

        let conflicts = three_way_merge(&mut ours, &wd, &theirs, &base).unwrap();

        assert!(conflicts.is_empty());
        assert_eq!(wd.read_file("shared").unwrap(), b"2");
        assert_eq!(wd.read_file("theirs_only").unwrap(), b"new");
        assert!(!wd.file_exists("to_delete"));
        assert!(wd.file_exists("ours_only"));
        assert_eq!(ours.get("shared"), Some(&Blob::id_of(b"2")));
        assert!(!ours.contains("to_delete"));
    }

    #[test]
    fn conflicting_paths_are_left_alone() {
        let (wd, mut ours) = checkout(&[("f", "ours"), ("g", "1")], &["theirs", "2"]);
        let base = tree(&[("f", "base"), ("g", "1")]);
        let theirs = tree(&[("f", "theirs"), ("g", "2")]);

        let conflicts = three_way_merge(&mut ours, &wd, &theirs, &base).unwrap();

        assert_eq!(conflicts.into_iter().collect::<Vec<_>>(), vec!["f"]);
        assert_eq!(wd.read_file("f").unwrap(), b"ours");
        assert_eq!(ours.get("f"), Some(&Blob::id_of(b"ours")));
        assert_eq!(wd.read_file("g").unwrap(), b"2");
    }

    #[test]
    fn plan_before_apply_writes_nothing() {
        let (wd, ours) = checkout(&[("f", "1")], &["2"]);
        let base = tree(&[("f", "1")]);
        let theirs = tree(&[("f", "2")]);
        let merge = plan(&ours, &theirs, &base);
        assert!(!merge.is_noop());
        assert_eq!(wd.read_file("f").unwrap(), b"1");
    }
}
