use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::{validate_key, KeyValueStore};

/// In-memory, BTreeMap-based key/value store.
///
/// Intended for tests and embedding. Values are held behind a `RwLock` and
/// cloned on read/write.
pub struct InMemoryKvStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Every stored key, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryKvStore {
    fn save(&self, key: &str, content: &[u8]) -> StoreResult<()> {
        validate_key(key)?;
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), content.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn list(&self, namespace: &str) -> StoreResult<BTreeSet<String>> {
        validate_key(namespace)?;
        let prefix = format!("{namespace}/");
        let map = self.entries.read().expect("lock poisoned");
        Ok(map
            .range(prefix.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&prefix))
            .filter(|key| !key[prefix.len()..].contains('/'))
            .cloned()
            .collect())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("key_count", &self.len())
            .finish()
    }
}
