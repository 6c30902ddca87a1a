//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The branch was not found.
    #[error("branch not found: {name}")]
    NotFound { name: String },

    /// A branch with this name already exists.
    #[error("branch already exists: {name}")]
    AlreadyExists { name: String },

    /// The branch name is invalid.
    #[error("invalid branch name {name:?}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// The persisted HEAD line could not be parsed.
    #[error("malformed HEAD: {0:?}")]
    MalformedHead(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage failure while reading or writing refs.
    #[error(transparent)]
    Store(#[from] gi_store::StoreError),
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
