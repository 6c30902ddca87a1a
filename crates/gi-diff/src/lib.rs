//! Diff primitives for gi.
//!
//! Compares two path maps (a frozen [`gi_store::Tree`] or the staging index)
//! by path and blob id. Everything here is pure: no storage access, no
//! working-directory access. Renames are not detected.
//!
//! [`diff_added`], [`diff_removed`] and [`diff_modified`] each return a
//! sorted list of paths.

pub mod tree_diff;

pub use tree_diff::{diff_added, diff_modified, diff_removed};
