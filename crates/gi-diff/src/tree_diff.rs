//! Path-level diff: compare two path maps by path and blob id.

use gi_store::PathMap;

/// Paths present in `a` but absent from `b`, sorted.
pub fn diff_added<A, B>(a: &A, b: &B) -> Vec<String>
where
    A: PathMap + ?Sized,
    B: PathMap + ?Sized,
{
    let b = b.path_map();
    a.path_map()
        .keys()
        .filter(|path| !b.contains_key(*path))
        .cloned()
        .collect()
}

/// Paths present in `b` but absent from `a`, sorted.
pub fn diff_removed<A, B>(a: &A, b: &B) -> Vec<String>
where
    A: PathMap + ?Sized,
    B: PathMap + ?Sized,
{
    diff_added(b, a)
}

/// Paths present in both with different blob ids, sorted.
pub fn diff_modified<A, B>(a: &A, b: &B) -> Vec<String>
where
    A: PathMap + ?Sized,
    B: PathMap + ?Sized,
{
    let b = b.path_map();
    a.path_map()
        .iter()
        .filter(|(path, id)| b.get(*path).is_some_and(|other| other != *id))
        .map(|(path, _)| path.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gi_store::{Blob, Tree};

    fn tree(entries: &[(&str, &str)]) -> Tree {
        entries
            .iter()
            .map(|(path, content)| (path.to_string(), Blob::id_of(content.as_bytes())))
            .collect()
    }

    #[test]
    fn identical_trees_have_no_diff() {
        let t = tree(&[("a.txt", "a"), ("b.txt", "b")]);
        assert!(diff_added(&t, &t).is_empty());
        assert!(diff_removed(&t, &t).is_empty());
        assert!(diff_modified(&t, &t).is_empty());
    }

    #[test]
    fn added_is_keys_in_a_missing_from_b() {
        let a = tree(&[("a.txt", "a"), ("new.txt", "n")]);
        let b = tree(&[("a.txt", "a")]);
        assert_eq!(diff_added(&a, &b), vec!["new.txt"]);
        assert!(diff_added(&b, &a).is_empty());
    }

    #[test]
    fn removed_mirrors_added() {
        let a = tree(&[("a.txt", "a")]);
        let b = tree(&[("a.txt", "a"), ("gone.txt", "g")]);
        assert_eq!(diff_removed(&a, &b), diff_added(&b, &a));
        assert_eq!(diff_removed(&a, &b), vec!["gone.txt"]);
    }

    #[test]
    fn modified_requires_both_sides() {
        let a = tree(&[("same.txt", "s"), ("edit.txt", "v1"), ("only_a", "x")]);
        let b = tree(&[("same.txt", "s"), ("edit.txt", "v2"), ("only_b", "y")]);
        assert_eq!(diff_modified(&a, &b), vec!["edit.txt"]);
    }

    #[test]
    fn results_are_sorted() {
        let a = tree(&[("z", "1"), ("a", "1"), ("m/x", "1")]);
        let b = Tree::empty();
        assert_eq!(diff_added(&a, &b), vec!["a", "m/x", "z"]);
    }
}
