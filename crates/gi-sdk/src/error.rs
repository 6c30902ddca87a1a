use thiserror::Error;

use gi_dag::DagError;
use gi_index::IndexError;
use gi_merge::MergeError;
use gi_refs::RefError;
use gi_store::StoreError;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("not a gi repository (run `gi init` first)")]
    NotInitialized,

    #[error("repository already initialized")]
    AlreadyInitialized,

    #[error("no commit or branch matches {0:?}")]
    NotFound(String),

    #[error("ambiguous revision {token:?}: {candidates} commits match")]
    Ambiguous { token: String, candidates: usize },

    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    #[error("branch already exists: {0}")]
    BranchExists(String),

    #[error("cannot delete the checked-out branch {0}")]
    DeleteCurrentBranch(String),

    #[error("invalid branch name {name:?}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    #[error("merge conflict in: {}", .0.join(", "))]
    MergeConflict(Vec<String>),

    #[error("staged changes present; commit them first")]
    UncommittedChanges,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("history error: {0}")]
    Dag(DagError),

    #[error("ref error: {0}")]
    Ref(RefError),
}

impl From<DagError> for SdkError {
    fn from(err: DagError) -> Self {
        match err {
            DagError::NotFound(token) => Self::NotFound(token),
            DagError::Ambiguous { prefix, candidates } => Self::Ambiguous {
                token: prefix,
                candidates,
            },
            DagError::Store(e) => Self::Storage(e),
            other => Self::Dag(other),
        }
    }
}

impl From<RefError> for SdkError {
    fn from(err: RefError) -> Self {
        match err {
            RefError::NotFound { name } => Self::NotFound(name),
            RefError::AlreadyExists { name } => Self::BranchExists(name),
            RefError::InvalidBranchName { name, reason } => {
                Self::InvalidBranchName { name, reason }
            }
            RefError::Store(e) => Self::Storage(e),
            other => Self::Ref(other),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
