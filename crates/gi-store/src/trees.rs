use std::collections::HashSet;
use std::sync::Arc;

use gi_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, Tree};
use crate::traits::ObjectStore;

/// Typed access to tree objects.
#[derive(Clone)]
pub struct TreeStore {
    objects: Arc<dyn ObjectStore>,
}

impl TreeStore {
    /// Create a tree view over `objects`.
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Persist `tree` and return its ID.
    pub fn dump(&self, tree: &Tree) -> StoreResult<ObjectId> {
        let id = self.objects.write(&tree.to_stored_object()?)?;
        debug!(tree = %id.short_hex(), entries = tree.len(), "dumped tree");
        Ok(id)
    }

    /// Load the tree `id`.
    pub fn load(&self, id: &ObjectId) -> StoreResult<Tree> {
        let obj = self
            .objects
            .read(ObjectKind::Tree, id)?
            .ok_or_else(|| StoreError::NotFound {
                kind: ObjectKind::Tree,
                key: id.to_hex(),
            })?;
        Tree::from_stored_object(&obj)
    }

    /// Returns `true` if the tree `id` is stored.
    pub fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        self.objects.exists(ObjectKind::Tree, id)
    }

    /// Delete every tree not in `keep`; returns how many were removed.
    pub fn sweep(&self, keep: &HashSet<ObjectId>) -> StoreResult<usize> {
        self.objects.sweep(ObjectKind::Tree, keep)
    }
}

impl std::fmt::Debug for TreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeStore").finish_non_exhaustive()
    }
}
