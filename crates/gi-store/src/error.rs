use gi_types::ObjectId;

use crate::object::ObjectKind;

/// Errors from object store and working-directory operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No stored object matches the requested id or prefix.
    #[error("{kind} not found: {key}")]
    NotFound { kind: ObjectKind, key: String },

    /// An abbreviated id matches several stored objects equally well.
    #[error("ambiguous {kind} prefix {prefix:?}: {candidates} candidates")]
    Ambiguous {
        kind: ObjectKind,
        prefix: String,
        candidates: usize,
    },

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {kind} {id}: content hashes to {computed}")]
    HashMismatch {
        kind: ObjectKind,
        id: ObjectId,
        computed: ObjectId,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// A storage key is empty, absolute, or escapes its namespace.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// A working-directory file that was expected to exist does not.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A path lies outside the working directory or inside the metadata area.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
