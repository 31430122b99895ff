//! Volatile study storage for embedded hosts and in-process runs.
//!
//! Nothing survives the process. Hosts that embed the study in something
//! that already persists its own state (or that only want one session) pair
//! this with [`crate::HostEffects`].

use async_trait::async_trait;
use cohort_core::effects::{StorageEffects, StorageError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Process-local key/value map. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorageHandler {
    entries: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorageHandler {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `entries`, e.g. an enrollment exported from
    /// another host.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }

    /// Copy of every stored entry.
    pub fn entries(&self) -> BTreeMap<String, Vec<u8>> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl StorageEffects for MemoryStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::InvalidKey {
                reason: "Key cannot be empty".to_string(),
            });
        }
        self.entries.write().insert(key.to_owned(), value);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read();
        let prefix = prefix.unwrap_or("");
        Ok(entries
            .range(prefix.to_owned()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
