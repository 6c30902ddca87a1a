//! Error types for the commit graph.

use gi_store::StoreError;
use gi_types::ObjectId;

/// Errors that can occur during commit graph operations.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// No commit matches the given id or prefix.
    #[error("commit not found: {0}")]
    NotFound(String),

    /// An abbreviated id matches several commits equally well.
    #[error("ambiguous commit prefix {prefix:?}: {candidates} candidates")]
    Ambiguous {
        /// The abbreviated id as given.
        prefix: String,
        /// How many commits share it.
        candidates: usize,
    },

    /// A parent reference points to a commit that does not exist.
    #[error("dangling parent reference: commit {node} references missing parent {parent}")]
    DanglingParent {
        /// The commit containing the bad reference.
        node: ObjectId,
        /// The missing parent.
        parent: ObjectId,
    },

    /// The commit's tree has not been stored.
    #[error("tree not found: {0}")]
    MissingTree(ObjectId),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for DAG results.
pub type DagResult<T> = Result<T, DagError>;
