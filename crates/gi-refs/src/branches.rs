//! The branch table: every branch name and the commit it points to.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use gi_store::KeyValueStore;
use gi_types::ObjectId;
use tracing::debug;

use crate::error::{RefError, RefResult};
use crate::names::validate_branch_name;

/// Storage key holding the serialized branch table.
pub const BRANCHES_KEY: &str = "branches.json";

/// Mutable `name → commit` table, persisted as one JSON object.
///
/// Every mutation writes the whole table back before returning.
pub struct BranchTable {
    kv: Arc<dyn KeyValueStore>,
    branches: BTreeMap<String, ObjectId>,
}

impl std::fmt::Debug for BranchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchTable")
            .field("branches", &self.branches)
            .finish()
    }
}

impl BranchTable {
    /// Load the table from `kv`; an absent table is empty.
    pub fn load(kv: Arc<dyn KeyValueStore>) -> RefResult<Self> {
        let branches = match kv.load(BRANCHES_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| RefError::Serialization(format!("{BRANCHES_KEY}: {e}")))?,
            None => BTreeMap::new(),
        };
        Ok(Self { kv, branches })
    }

    fn persist(&self) -> RefResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.branches)
            .map_err(|e| RefError::Serialization(e.to_string()))?;
        self.kv.save(BRANCHES_KEY, &bytes)?;
        Ok(())
    }

    /// Number of branches.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Returns `true` if there are no branches.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Returns `true` if `name` is a branch.
    pub fn exists(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    /// The commit `name` points to.
    pub fn resolve(&self, name: &str) -> RefResult<ObjectId> {
        self.branches
            .get(name)
            .copied()
            .ok_or_else(|| RefError::NotFound {
                name: name.to_string(),
            })
    }

    /// Point `name` at `commit`, creating it if needed.
    pub fn pin(&mut self, name: &str, commit: ObjectId) -> RefResult<()> {
        validate_branch_name(name)?;
        self.branches.insert(name.to_string(), commit);
        self.persist()?;
        debug!(branch = name, commit = %commit.short_hex(), "pinned branch");
        Ok(())
    }

    /// Create a new branch; fails if it already exists.
    pub fn create(&mut self, name: &str, commit: ObjectId) -> RefResult<()> {
        if self.exists(name) {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        self.pin(name, commit)
    }

    /// Remove `name`, returning the commit it pointed to.
    pub fn delete(&mut self, name: &str) -> RefResult<ObjectId> {
        let commit = self.branches.remove(name).ok_or_else(|| RefError::NotFound {
            name: name.to_string(),
        })?;
        self.persist()?;
        debug!(branch = name, "deleted branch");
        Ok(commit)
    }

    /// The distinct commits at branch tips.
    pub fn tip_commits(&self) -> BTreeSet<ObjectId> {
        self.branches.values().copied().collect()
    }

    /// Branches pointing at `commit`, sorted by name.
    pub fn names_at(&self, commit: &ObjectId) -> Vec<&str> {
        self.branches
            .iter()
            .filter(|(_, id)| *id == commit)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Iterate `(name, commit)` pairs sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectId)> {
        self.branches.iter().map(|(name, id)| (name.as_str(), id))
    }
}
