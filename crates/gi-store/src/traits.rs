use std::collections::{BTreeSet, HashSet};

use gi_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};

/// Durable byte storage keyed by relative, `/`-separated names.
///
/// This is the only place repository metadata touches persistent storage.
/// Implementations must satisfy:
/// - `save` replaces any previous value atomically.
/// - `load` of an unknown key is `Ok(None)`, never an error.
/// - `list(namespace)` returns full keys of entries directly under the
///   namespace (not recursive).
/// - All I/O errors are propagated.
pub trait KeyValueStore: Send + Sync {
    /// Store `content` under `key`, replacing any previous value.
    fn save(&self, key: &str, content: &[u8]) -> StoreResult<()>;

    /// Load the value stored under `key`.
    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Keys stored directly under `namespace`.
    fn list(&self, namespace: &str) -> StoreResult<BTreeSet<String>>;

    /// Remove `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Check whether `key` holds a value.
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Store UTF-8 text under `key`.
    fn save_string(&self, key: &str, content: &str) -> StoreResult<()> {
        self.save(key, content.as_bytes())
    }

    /// Load UTF-8 text stored under `key`.
    fn load_string(&self, key: &str) -> StoreResult<Option<String>> {
        match self.load(key)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }
}

/// Reject keys that are empty, absolute, or contain `.`/`..`/empty segments.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Content-addressed object store, namespaced by [`ObjectKind`].
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; the same data always produces the
///   same ID.
/// - Writing an object that already exists is a no-op.
/// - Reads verify that the stored bytes hash to the requested ID.
/// - The store never interprets object contents.
pub trait ObjectStore: Send + Sync {
    /// Read an object by kind and ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists.
    fn exists(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<bool>;

    /// Delete an object. Returns `true` if it existed.
    ///
    /// Intended for garbage collection only.
    fn delete(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<bool>;

    /// Every stored ID of the given kind, sorted.
    fn ids(&self, kind: ObjectKind) -> StoreResult<Vec<ObjectId>>;

    /// Resolve a full or abbreviated hex ID to a stored object ID.
    ///
    /// An exact match wins; otherwise the unique longest stored name sharing
    /// the prefix. Equally long candidates are [`StoreError::Ambiguous`];
    /// no candidate, an empty prefix, or non-hex input is
    /// [`StoreError::NotFound`].
    fn resolve_prefix(&self, kind: ObjectKind, prefix: &str) -> StoreResult<ObjectId>;

    /// Delete every object of `kind` whose ID is not in `keep`.
    ///
    /// Returns the number of objects removed.
    fn sweep(&self, kind: ObjectKind, keep: &HashSet<ObjectId>) -> StoreResult<usize> {
        let mut removed = 0;
        for id in self.ids(kind)? {
            if !keep.contains(&id) && self.delete(kind, &id)? {
                removed += 1;
            }
        }
        debug!(%kind, removed, kept = keep.len(), "swept objects");
        Ok(removed)
    }
}
