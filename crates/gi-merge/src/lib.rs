//! Merge engine for gi.
//!
//! Implements a path-level three-way merge of two trees against their common
//! base. Merging is split into a pure [`plan`] step, which decides every
//! path's outcome without touching anything, and an [`apply`] step, which
//! writes the adopted paths into the index and working directory.
//! Conflicting paths keep "our" version; no conflict markers are written.

pub mod error;
pub mod merge;

pub use error::{MergeError, MergeResult};
pub use merge::{apply, plan, three_way_merge, MergePlan};
