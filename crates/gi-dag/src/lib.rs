//! Commit graph for gi.
//!
//! Commits are immutable records of a message, a timestamp, a tree, and the
//! parent commits they descend from. They are stored as content-addressed
//! objects, so the graph is acyclic by construction: a commit can only name
//! parents that already exist. Traversal queries (ancestors, merge base,
//! ancestry tests) walk parent edges breadth-first.

pub mod error;
pub mod graph;
pub mod node;

pub use error::{DagError, DagResult};
pub use graph::CommitGraph;
pub use node::Commit;
