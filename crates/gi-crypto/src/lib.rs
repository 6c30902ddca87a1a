//! Content addressing for gi.
//!
//! Provides domain-separated BLAKE3 hashing. Every stored object (blob, tree,
//! commit) is identified by the hash its kind's [`ContentHasher`] computes over
//! the object's canonical bytes.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
