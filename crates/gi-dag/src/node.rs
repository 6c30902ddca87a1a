//! Commit records and their canonical serialization.

use chrono::{DateTime, Utc};
use gi_crypto::ContentHasher;
use gi_store::{ObjectKind, StoredObject};
use gi_types::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::{DagError, DagResult};

/// Persisted form of a commit. Field order is part of the hash.
#[derive(Serialize, Deserialize)]
struct CommitRecord {
    message: String,
    timestamp: DateTime<Utc>,
    tree: ObjectId,
    parents: Vec<ObjectId>,
}

/// An immutable commit.
///
/// The id is the hash of the canonical serialization of the message,
/// timestamp, tree, and parents, in that order. Two commits with identical
/// fields are the same object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// Content-addressed identifier for this commit.
    pub id: ObjectId,
    /// Free-form commit message.
    pub message: String,
    /// When the commit was recorded.
    pub timestamp: DateTime<Utc>,
    /// The tree this commit snapshots.
    pub tree: ObjectId,
    /// Parent commits (empty for a root commit, two for a merge).
    pub parents: Vec<ObjectId>,
}

impl Commit {
    /// Build a commit and compute its id.
    pub fn new(
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
        tree: ObjectId,
        parents: Vec<ObjectId>,
    ) -> DagResult<Self> {
        let record = CommitRecord {
            message: message.into(),
            timestamp,
            tree,
            parents,
        };
        let id = ContentHasher::COMMIT.hash(&encode(&record)?);
        Ok(Self::from_record(id, record))
    }

    fn from_record(id: ObjectId, record: CommitRecord) -> Self {
        Self {
            id,
            message: record.message,
            timestamp: record.timestamp,
            tree: record.tree,
            parents: record.parents,
        }
    }

    /// Returns `true` if this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns `true` if this commit joins two or more lines of history.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Returns a one-line summary of this commit.
    pub fn summary(&self) -> String {
        let first_line = self.message.lines().next().unwrap_or_default();
        format!("{} {}", self.id.short_hex(), first_line)
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> DagResult<StoredObject> {
        let record = CommitRecord {
            message: self.message.clone(),
            timestamp: self.timestamp,
            tree: self.tree,
            parents: self.parents.clone(),
        };
        Ok(StoredObject::new(ObjectKind::Commit, encode(&record)?))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> DagResult<Self> {
        if obj.kind != ObjectKind::Commit {
            return Err(DagError::Serialization(format!(
                "expected commit, got {}",
                obj.kind
            )));
        }
        let record: CommitRecord = serde_json::from_slice(&obj.data)
            .map_err(|e| DagError::Serialization(e.to_string()))?;
        Ok(Self::from_record(obj.compute_id(), record))
    }
}

fn encode(record: &CommitRecord) -> DagResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| DagError::Serialization(e.to_string()))
}
