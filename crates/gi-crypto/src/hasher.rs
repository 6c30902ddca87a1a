use gi_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"gi-blob-v1"`, `"gi-commit-v1"`)
/// that is prepended to every hash computation. A blob and a tree with
/// identical bytes therefore never share an identifier.
#[derive(Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for blob objects (raw file content).
    pub const BLOB: Self = Self {
        domain: "gi-blob-v1",
    };
    /// Hasher for tree objects (canonical path map).
    pub const TREE: Self = Self {
        domain: "gi-tree-v1",
    };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self {
        domain: "gi-commit-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }
}
