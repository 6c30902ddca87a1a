//! Staging index for gi.
//!
//! The index is the mutable staging tree: the set of paths and blob ids that
//! the next commit will snapshot. It is persisted as an ordinary tree object
//! whenever it changes. This crate also brings the working directory in line
//! with a target tree and computes working-tree status.
//!
//! # Key Types
//!
//! - [`Index`] -- The mutable staging tree (BTreeMap-backed)
//! - [`WorkdirStatus`] -- Result of status computation
//! - [`FileStatus`] -- Kind of change (New, Modified, Deleted)

pub mod error;
pub mod index;
pub mod status;

pub use error::{IndexError, IndexResult};
pub use index::Index;
pub use status::{compute_status, scan_working_directory, FileStatus, StatusEntry, WorkdirStatus};
