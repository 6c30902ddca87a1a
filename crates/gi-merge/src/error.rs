//! Error types for the merge crate.

/// Errors that can occur while applying a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Updating the index or working directory failed.
    #[error(transparent)]
    Index(#[from] gi_index::IndexError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
