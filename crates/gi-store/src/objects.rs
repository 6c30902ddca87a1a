use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use gi_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::prefix::{PrefixIndex, PrefixMatch};
use crate::traits::{KeyValueStore, ObjectStore};

/// Object store layered over a [`KeyValueStore`].
///
/// Objects live under `objects/<kind>/<hex id>`. A [`PrefixIndex`] per kind is
/// built lazily from the key listing on first lookup and kept in step with
/// writes and deletes made through this store.
pub struct KvObjectStore {
    kv: Arc<dyn KeyValueStore>,
    indexes: RwLock<HashMap<ObjectKind, PrefixIndex>>,
}

impl KvObjectStore {
    /// Create an object store writing through `kv`.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            indexes: RwLock::new(HashMap::new()),
        }
    }

    fn key(kind: ObjectKind, id: &ObjectId) -> String {
        format!("{}/{}", kind.namespace(), id.to_hex())
    }

    fn load_index(&self, kind: ObjectKind) -> StoreResult<PrefixIndex> {
        let namespace = kind.namespace();
        let mut index = PrefixIndex::new();
        for key in self.kv.list(namespace)? {
            let name = &key[namespace.len() + 1..];
            if ObjectId::from_hex(name).is_ok() {
                index.insert(name);
            } else {
                warn!(%kind, key = %key, "ignoring stray entry in object namespace");
            }
        }
        debug!(%kind, count = index.len(), "loaded prefix index");
        Ok(index)
    }

    /// Run `f` against the (lazily loaded) prefix index for `kind`.
    fn with_index<R>(&self, kind: ObjectKind, f: impl FnOnce(&mut PrefixIndex) -> R) -> StoreResult<R> {
        let mut indexes = self.indexes.write().expect("lock poisoned");
        if !indexes.contains_key(&kind) {
            let loaded = self.load_index(kind)?;
            indexes.insert(kind, loaded);
        }
        let index = indexes.entry(kind).or_default();
        Ok(f(index))
    }

    /// Update a loaded index; unloaded indexes pick the change up on load.
    fn touch_index(&self, kind: ObjectKind, f: impl FnOnce(&mut PrefixIndex)) {
        let mut indexes = self.indexes.write().expect("lock poisoned");
        if let Some(index) = indexes.get_mut(&kind) {
            f(index);
        }
    }
}

impl ObjectStore for KvObjectStore {
    fn read(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let Some(data) = self.kv.load(&Self::key(kind, id))? else {
            return Ok(None);
        };
        let object = StoredObject::new(kind, data);
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch {
                kind,
                id: *id,
                computed,
            });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let key = Self::key(object.kind, &id);
        // Idempotent: content-addressing guarantees the same id always maps
        // to the same bytes.
        if !self.kv.exists(&key)? {
            self.kv.save(&key, &object.data)?;
            debug!(kind = %object.kind, id = %id.short_hex(), size = object.size, "stored object");
        }
        self.touch_index(object.kind, |index| {
            index.insert(id.to_hex());
        });
        Ok(id)
    }

    fn exists(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<bool> {
        self.kv.exists(&Self::key(kind, id))
    }

    fn delete(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<bool> {
        let removed = self.kv.delete(&Self::key(kind, id))?;
        self.touch_index(kind, |index| {
            index.remove(&id.to_hex());
        });
        Ok(removed)
    }

    fn ids(&self, kind: ObjectKind) -> StoreResult<Vec<ObjectId>> {
        self.with_index(kind, |index| {
            index
                .iter()
                .filter_map(|name| ObjectId::from_hex(name).ok())
                .collect()
        })
    }

    fn resolve_prefix(&self, kind: ObjectKind, prefix: &str) -> StoreResult<ObjectId> {
        let not_found = || StoreError::NotFound {
            kind,
            key: prefix.to_string(),
        };
        if !ObjectId::is_valid_prefix(prefix) {
            return Err(not_found());
        }

        let resolved = self.with_index(kind, |index| match index.resolve(prefix) {
            PrefixMatch::Unique(name) => Ok(name.to_string()),
            PrefixMatch::Ambiguous(candidates) => Err(StoreError::Ambiguous {
                kind,
                prefix: prefix.to_string(),
                candidates,
            }),
            PrefixMatch::None => Err(not_found()),
        })??;

        ObjectId::from_hex(&resolved).map_err(|_| not_found())
    }
}

impl std::fmt::Debug for KvObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded: Vec<ObjectKind> = self
            .indexes
            .read()
            .expect("lock poisoned")
            .keys()
            .copied()
            .collect();
        f.debug_struct("KvObjectStore")
            .field("loaded_indexes", &loaded)
            .finish()
    }
}
