//! The stored commit graph and its traversal algorithms.
//!
//! [`CommitGraph`] reads and writes commits through an [`ObjectStore`].
//!
//! # Invariants
//!
//! - The graph is acyclic: a commit can only be recorded once its parents
//!   exist, and its id depends on theirs.
//! - Every recorded commit's tree exists in the store.
//! - Timestamps are informational; they are not required to increase.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gi_store::{ObjectKind, ObjectStore, StoreError};
use gi_types::ObjectId;
use tracing::debug;

use crate::error::{DagError, DagResult};
use crate::node::Commit;

/// Commit storage plus history queries.
#[derive(Clone)]
pub struct CommitGraph {
    objects: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for CommitGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitGraph").finish_non_exhaustive()
    }
}

impl CommitGraph {
    /// Create a graph over `objects`.
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Record a new commit.
    ///
    /// The tree must already be stored and every parent must already exist.
    /// Recording a commit identical to an existing one returns the existing
    /// commit.
    pub fn record(
        &self,
        message: impl Into<String>,
        tree: ObjectId,
        parents: Vec<ObjectId>,
        timestamp: DateTime<Utc>,
    ) -> DagResult<Commit> {
        let commit = Commit::new(message, timestamp, tree, parents)?;

        if !self.objects.exists(ObjectKind::Tree, &tree)? {
            return Err(DagError::MissingTree(tree));
        }
        for parent in &commit.parents {
            if !self.objects.exists(ObjectKind::Commit, parent)? {
                return Err(DagError::DanglingParent {
                    node: commit.id,
                    parent: *parent,
                });
            }
        }

        self.objects.write(&commit.to_stored_object()?)?;
        debug!(
            commit = %commit.id.short_hex(),
            tree = %tree.short_hex(),
            parents = commit.parents.len(),
            "recorded commit"
        );
        Ok(commit)
    }

    /// Delete every commit not in `keep`; returns how many were removed.
    pub fn sweep(&self, keep: &HashSet<ObjectId>) -> DagResult<usize> {
        Ok(self.objects.sweep(ObjectKind::Commit, keep)?)
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// Retrieve a commit by its full id.
    pub fn get(&self, id: &ObjectId) -> DagResult<Commit> {
        let obj = self
            .objects
            .read(ObjectKind::Commit, id)?
            .ok_or_else(|| DagError::NotFound(id.to_hex()))?;
        Commit::from_stored_object(&obj)
    }

    /// Retrieve a commit by full or abbreviated id.
    ///
    /// An exact id wins; otherwise the unique longest stored id sharing the
    /// prefix. Empty or non-hex input is [`DagError::NotFound`].
    pub fn load(&self, id_or_prefix: &str) -> DagResult<Commit> {
        let id = self
            .objects
            .resolve_prefix(ObjectKind::Commit, id_or_prefix)
            .map_err(|e| match e {
                StoreError::NotFound { .. } => DagError::NotFound(id_or_prefix.to_string()),
                StoreError::Ambiguous { candidates, .. } => DagError::Ambiguous {
                    prefix: id_or_prefix.to_string(),
                    candidates,
                },
                other => DagError::Store(other),
            })?;
        self.get(&id)
    }

    /// Returns `true` if some stored commit matches `id_or_prefix`.
    ///
    /// An ambiguous prefix counts as existing.
    pub fn exists(&self, id_or_prefix: &str) -> DagResult<bool> {
        match self.load(id_or_prefix) {
            Ok(_) | Err(DagError::Ambiguous { .. }) => Ok(true),
            Err(DagError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every stored commit id, sorted.
    pub fn ids(&self) -> DagResult<Vec<ObjectId>> {
        Ok(self.objects.ids(ObjectKind::Commit)?)
    }

    // ---------------------------------------------------------------
    // Traversal
    // ---------------------------------------------------------------

    /// Every commit reachable from `roots` (BFS upward), roots included.
    ///
    /// Each commit appears once, in breadth-first discovery order.
    pub fn ancestors_of(&self, roots: &[ObjectId]) -> DagResult<Vec<Commit>> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        for root in roots {
            if visited.insert(*root) {
                queue.push_back(*root);
            }
        }

        let mut result = Vec::new();
        while let Some(current) = queue.pop_front() {
            let commit = self.get(&current)?;
            for parent in &commit.parents {
                if visited.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
            result.push(commit);
        }
        Ok(result)
    }

    /// Returns `true` if `ancestor` is reachable from `descendant`
    /// (a commit is its own ancestor).
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> DagResult<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        Ok(self
            .ancestors_of(&[*descendant])?
            .iter()
            .any(|commit| commit.id == *ancestor))
    }

    /// The common ancestor of `a` and `b` with the latest timestamp.
    ///
    /// Ties on timestamp go to the larger id so the result is deterministic.
    pub fn merge_base(&self, a: &ObjectId, b: &ObjectId) -> DagResult<Option<Commit>> {
        if a == b {
            return self.get(a).map(Some);
        }
        let ancestors_a: HashSet<ObjectId> = self
            .ancestors_of(&[*a])?
            .into_iter()
            .map(|commit| commit.id)
            .collect();
        Ok(self
            .ancestors_of(&[*b])?
            .into_iter()
            .filter(|commit| ancestors_a.contains(&commit.id))
            .max_by(|x, y| x.timestamp.cmp(&y.timestamp).then(x.id.cmp(&y.id))))
    }
}
