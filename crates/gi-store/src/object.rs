use std::collections::BTreeMap;

use gi_crypto::ContentHasher;
use gi_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Raw file content.
    Blob,
    /// Path-to-blob snapshot.
    Tree,
    /// Serialized commit record.
    Commit,
}

impl ObjectKind {
    /// Storage namespace holding objects of this kind.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Blob => "objects/blobs",
            Self::Tree => "objects/trees",
            Self::Commit => "objects/commits",
        }
    }

    /// The domain-separated hasher for this kind.
    pub fn hasher(&self) -> &'static ContentHasher {
        match self {
            Self::Blob => &ContentHasher::BLOB,
            Self::Tree => &ContentHasher::TREE,
            Self::Commit => &ContentHasher::COMMIT,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// contents of the data; it only keys them by content hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The serialized bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        self.kind.hasher().hash(&self.data)
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw file content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// The ID `data` would be stored under, without storing anything.
    pub fn id_of(data: &[u8]) -> ObjectId {
        ContentHasher::BLOB.hash(data)
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Read access to a relative-path → blob-id mapping.
///
/// Implemented by the frozen [`Tree`] and by the mutable staging index, so
/// diffs and merges work over either.
pub trait PathMap {
    /// The mapping, sorted by path.
    fn path_map(&self) -> &BTreeMap<String, ObjectId>;
}

/// Frozen snapshot mapping relative paths to blob IDs.
///
/// A `Tree` is never mutated once built. Its canonical serialization is the
/// JSON object of its path-sorted entries, so equal mappings always hash to
/// the same ID.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree {
    entries: BTreeMap<String, ObjectId>,
}

impl Tree {
    /// Create a tree from a path mapping.
    pub fn new(entries: BTreeMap<String, ObjectId>) -> Self {
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Blob ID stored at `path`.
    pub fn get(&self, path: &str) -> Option<&ObjectId> {
        self.entries.get(path)
    }

    /// Returns `true` if the tree tracks `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of tracked paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree tracks nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ObjectId)> {
        self.entries.iter()
    }

    /// Iterate tracked paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Iterate referenced blob IDs (may repeat).
    pub fn blob_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.entries.values()
    }

    /// Consume the tree, returning its mapping.
    pub fn into_entries(self) -> BTreeMap<String, ObjectId> {
        self.entries
    }

    /// Canonical serialized form.
    pub fn canonical_bytes(&self) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(&self.entries).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Content-addressed ID of this tree.
    pub fn id(&self) -> StoreResult<ObjectId> {
        Ok(ContentHasher::TREE.hash(&self.canonical_bytes()?))
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Ok(StoredObject::new(ObjectKind::Tree, self.canonical_bytes()?))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::CorruptObject {
            id: obj.compute_id(),
            reason: e.to_string(),
        })
    }
}

impl PathMap for Tree {
    fn path_map(&self) -> &BTreeMap<String, ObjectId> {
        &self.entries
    }
}

impl FromIterator<(String, ObjectId)> for Tree {
    fn from_iter<I: IntoIterator<Item = (String, ObjectId)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Tree {
        [
            ("src/main.rs".to_string(), Blob::id_of(b"fn main() {}")),
            ("a.txt".to_string(), Blob::id_of(b"hi")),
        ]
        .into_iter()
        .collect()
    }

    // -----------------------------------------------------------------------
    // StoredObject
    // -----------------------------------------------------------------------

    #[test]
    fn stored_object_size_matches_data() {
        let obj = StoredObject::new(ObjectKind::Blob, b"hello".to_vec());
        assert_eq!(obj.size, 5);
    }

    #[test]
    fn kinds_hash_apart() {
        let blob = StoredObject::new(ObjectKind::Blob, b"{}".to_vec());
        let tree = StoredObject::new(ObjectKind::Tree, b"{}".to_vec());
        let commit = StoredObject::new(ObjectKind::Commit, b"{}".to_vec());
        assert_ne!(blob.compute_id(), tree.compute_id());
        assert_ne!(tree.compute_id(), commit.compute_id());
    }

    #[test]
    fn namespaces_are_distinct() {
        assert_eq!(ObjectKind::Blob.namespace(), "objects/blobs");
        assert_eq!(ObjectKind::Tree.namespace(), "objects/trees");
        assert_eq!(ObjectKind::Commit.namespace(), "objects/commits");
    }

    // -----------------------------------------------------------------------
    // Blob
    // -----------------------------------------------------------------------

    #[test]
    fn blob_id_of_matches_stored_id() {
        let blob = Blob::new(b"content".to_vec());
        assert_eq!(Blob::id_of(b"content"), blob.to_stored_object().compute_id());
    }

    #[test]
    fn blob_rejects_wrong_kind() {
        let obj = StoredObject::new(ObjectKind::Tree, b"{}".to_vec());
        assert!(matches!(
            Blob::from_stored_object(&obj),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Tree
    // -----------------------------------------------------------------------

    #[test]
    fn tree_serialization_is_path_sorted() {
        let tree = sample_tree();
        let text = String::from_utf8(tree.canonical_bytes().unwrap()).unwrap();
        let a = text.find("a.txt").unwrap();
        let src = text.find("src/main.rs").unwrap();
        assert!(a < src);
        assert!(text.starts_with('{'));
    }

    #[test]
    fn tree_roundtrips_through_stored_object() {
        let tree = sample_tree();
        let obj = tree.to_stored_object().unwrap();
        let decoded = Tree::from_stored_object(&obj).unwrap();
        assert_eq!(decoded, tree);
        assert_eq!(obj.compute_id(), tree.id().unwrap());
    }

    #[test]
    fn equal_mappings_share_an_id() {
        let a: Tree = [("x".to_string(), Blob::id_of(b"1"))].into_iter().collect();
        let b: Tree = [("x".to_string(), Blob::id_of(b"1"))].into_iter().collect();
        let c: Tree = [("x".to_string(), Blob::id_of(b"2"))].into_iter().collect();
        assert_eq!(a.id().unwrap(), b.id().unwrap());
        assert_ne!(a.id().unwrap(), c.id().unwrap());
    }

    #[test]
    fn empty_tree_has_stable_id() {
        assert_eq!(Tree::empty().id().unwrap(), Tree::default().id().unwrap());
        assert_eq!(Tree::empty().canonical_bytes().unwrap(), b"{}");
    }

    #[test]
    fn corrupt_tree_data_is_reported() {
        let obj = StoredObject::new(ObjectKind::Tree, b"not json".to_vec());
        assert!(matches!(
            Tree::from_stored_object(&obj),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn accessors() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 2);
        assert!(tree.contains("a.txt"));
        assert_eq!(tree.get("a.txt"), Some(&Blob::id_of(b"hi")));
        assert_eq!(
            tree.paths().cloned().collect::<Vec<_>>(),
            vec!["a.txt".to_string(), "src/main.rs".to_string()]
        );
        assert_eq!(tree.blob_ids().count(), 2);
    }
}
