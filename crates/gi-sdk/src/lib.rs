//! High-level SDK for gi.
//!
//! [`Repository`] is the entry point: it owns HEAD and the staging index and
//! drives the object store, commit graph, and branch table to implement
//! `init`, staging, `commit`, `checkout`, `reset`, `status`, `log`, branch
//! management, `merge`, and garbage collection.
//!
//! Storage and the working directory are injected as trait objects, so the
//! same repository logic runs on disk ([`Repository::init_at`],
//! [`Repository::open_at`]) or fully in memory.

pub mod config;
pub mod error;
pub mod repository;
pub mod revision;

pub use config::RepositoryConfig;
pub use error::{SdkError, SdkResult};
pub use repository::{CommitOutcome, GcReport, LogEntry, MergeOutcome, Repository, StatusReport};
pub use revision::{Revision, RevisionResolver};

// Re-export key types
pub use gi_dag::Commit;
pub use gi_index::{FileStatus, StatusEntry, WorkdirStatus};
pub use gi_refs::BranchInfo;
pub use gi_store::{FsWorkingDirectory, Tree};
pub use gi_types::ObjectId;
