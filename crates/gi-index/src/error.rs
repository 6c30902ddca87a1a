//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Store or working-directory operation failed.
    #[error(transparent)]
    Store(#[from] gi_store::StoreError),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
