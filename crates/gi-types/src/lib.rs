//! Foundation types for gi.
//!
//! Every other gi crate depends on `gi-types`. It holds the one identifier
//! shared by blobs, trees and commits alike.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash)
//! - [`TypeError`]: Parse failures for identifiers

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::ObjectId;
