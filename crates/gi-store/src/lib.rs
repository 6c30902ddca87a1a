//! Content-addressed object storage for gi.
//!
//! This crate implements the hash-keyed object store behind a repository's
//! `.gi/objects/` directory, plus the two collaborator contracts the rest of
//! the engine talks through: a durable key/value store and a working-directory
//! accessor.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file content
//! - [`Tree`] -- frozen snapshot mapping relative paths to blob ids
//! - commits are defined by `gi-dag` and stored as [`ObjectKind::Commit`]
//!
//! # Storage Layers
//!
//! - [`KeyValueStore`] -- durable byte/text storage keyed by relative names
//!   ([`FsKvStore`], [`InMemoryKvStore`])
//! - [`ObjectStore`] -- content-addressed objects namespaced by kind, with a
//!   sorted [`PrefixIndex`] for abbreviated ids ([`KvObjectStore`])
//! - [`BlobStore`] / [`TreeStore`] -- typed views over an object store
//! - [`WorkingDirectory`] -- files outside the metadata area
//!   ([`FsWorkingDirectory`], [`InMemoryWorkingDirectory`])
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writes are idempotent: re-writing an existing object is a no-op.
//! 3. Reads verify the stored bytes against the requested id.
//! 4. The object store never interprets object contents.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod blob;
pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod objects;
pub mod prefix;
pub mod traits;
pub mod trees;
pub mod workdir;

// Re-export primary types at crate root for ergonomic imports.
pub use blob::BlobStore;
pub use error::{StoreError, StoreResult};
pub use fs::FsKvStore;
pub use memory::InMemoryKvStore;
pub use object::{Blob, ObjectKind, PathMap, StoredObject, Tree};
pub use objects::KvObjectStore;
pub use prefix::{PrefixIndex, PrefixMatch};
pub use traits::{validate_key, KeyValueStore, ObjectStore};
pub use trees::TreeStore;
pub use workdir::{FsWorkingDirectory, InMemoryWorkingDirectory, WorkingDirectory};
