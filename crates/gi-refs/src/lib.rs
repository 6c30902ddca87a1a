//! Reference management for gi.
//!
//! References are the human-readable entry points into the commit graph.
//!
//! # Architecture
//!
//! - **Branches** are mutable `name → commit` pointers, kept together in one
//!   table persisted as `branches.json`. Repinning a branch writes the table
//!   immediately.
//! - **HEAD** names the current branch (`ref: <name>`), or holds a commit id
//!   directly when detached.
//!
//! # Modules
//!
//! - [`error`]: Error types for ref operations
//! - [`types`]: Core ref types: [`Head`], [`BranchInfo`]
//! - [`branches`]: The persisted [`BranchTable`]
//! - [`names`]: Branch name validation

pub mod branches;
pub mod error;
pub mod names;
pub mod types;

pub use branches::BranchTable;
pub use error::{RefError, RefResult};
pub use names::validate_branch_name;
pub use types::{BranchInfo, Head};
