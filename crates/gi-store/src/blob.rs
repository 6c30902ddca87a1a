use std::collections::HashSet;
use std::sync::Arc;

use gi_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, ObjectKind};
use crate::traits::ObjectStore;
use crate::workdir::WorkingDirectory;

/// Typed access to blob objects.
///
/// Blobs are created when a file is staged and removed only by [`sweep`].
///
/// [`sweep`]: BlobStore::sweep
#[derive(Clone)]
pub struct BlobStore {
    objects: Arc<dyn ObjectStore>,
}

impl BlobStore {
    /// Create a blob view over `objects`.
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// The ID `content` would be stored under. Writes nothing.
    pub fn id_of(content: &[u8]) -> ObjectId {
        Blob::id_of(content)
    }

    /// Store `content` if absent and return its ID.
    pub fn put_bytes(&self, content: &[u8]) -> StoreResult<ObjectId> {
        self.objects.write(&Blob::new(content.to_vec()).to_stored_object())
    }

    /// Read `path` through the working directory and store its content.
    pub fn put(&self, workdir: &dyn WorkingDirectory, path: &str) -> StoreResult<ObjectId> {
        let content = workdir.read_file(path)?;
        let id = self.put_bytes(&content)?;
        debug!(path, blob = %id.short_hex(), "stored file content");
        Ok(id)
    }

    /// Content of the blob `id`.
    pub fn get(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        let obj = self
            .objects
            .read(ObjectKind::Blob, id)?
            .ok_or_else(|| StoreError::NotFound {
                kind: ObjectKind::Blob,
                key: id.to_hex(),
            })?;
        Ok(Blob::from_stored_object(&obj)?.data)
    }

    /// Returns `true` if the blob `id` is stored.
    pub fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        self.objects.exists(ObjectKind::Blob, id)
    }

    /// Delete every blob not in `keep`; returns how many were removed.
    pub fn sweep(&self, keep: &HashSet<ObjectId>) -> StoreResult<usize> {
        self.objects.sweep(ObjectKind::Blob, keep)
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore").finish_non_exhaustive()
    }
}
