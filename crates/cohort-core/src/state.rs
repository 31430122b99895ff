//! Typed persisted-state access over [`StorageEffects`].
//!
//! Values are JSON-encoded under the `study.` namespace, so a filesystem or
//! memory backend stores exactly what `status` tooling prints.

use crate::effects::{StorageEffects, StorageError};
use crate::keys;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Typed `get/set/clear` view over a storage backend.
pub struct PersistedState<'a, S: StorageEffects + ?Sized> {
    storage: &'a S,
}

impl<'a, S: StorageEffects + ?Sized> PersistedState<'a, S> {
    /// Wrap a storage backend.
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Read and decode `key`; `None` when absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let qualified = keys::qualified(key);
        let Some(bytes) = self.storage.retrieve(&qualified).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: qualified,
                reason: e.to_string(),
            })
    }

    /// Encode and write `value` under `key`.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| StorageError::WriteFailed(format!("encode {key}: {e}")))?;
        self.storage.store(&keys::qualified(key), bytes).await
    }

    /// Remove `key`; returns whether it existed.
    pub async fn clear(&self, key: &str) -> Result<bool, StorageError> {
        self.storage.remove(&keys::qualified(key)).await
    }

    /// Every `study.*` value, decoded as raw JSON, keyed by bare name.
    pub async fn snapshot(&self) -> Result<BTreeMap<String, serde_json::Value>, StorageError> {
        let mut out = BTreeMap::new();
        for qualified in self.storage.list_keys(Some(keys::NAMESPACE)).await? {
            let Some(bytes) = self.storage.retrieve(&qualified).await? else {
                continue;
            };
            let value = serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
                key: qualified.clone(),
                reason: e.to_string(),
            })?;
            let bare = qualified
                .strip_prefix(keys::NAMESPACE)
                .unwrap_or(&qualified)
                .to_string();
            out.insert(bare, value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<String, Vec<u8>>>);

    #[async_trait]
    impl StorageEffects for MapStore {
        async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
            self.0.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }

        async fn remove(&self, key: &str) -> Result<bool, StorageError> {
            Ok(self.0.lock().unwrap().remove(key).is_some())
        }

        async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
            let mut keys: Vec<String> = self
                .0
                .lock()
                .unwrap()
                .keys()
                .filter(|k| prefix.map_or(true, |p| k.starts_with(p)))
                .cloned()
                .collect();
            keys.sort();
            Ok(keys)
        }
    }

    #[tokio::test]
    async fn values_are_namespaced_json() {
        let store = MapStore::default();
        let state = PersistedState::new(&store);
        state.set(keys::VARIATION, "control").await.unwrap();
        state.set(keys::API_ENABLED, &true).await.unwrap();

        let raw = store.retrieve("study.variation").await.unwrap().unwrap();
        assert_eq!(raw, br#""control""#.to_vec());
        assert_eq!(
            state.get::<String>(keys::VARIATION).await.unwrap().as_deref(),
            Some("control")
        );
        assert_eq!(state.get::<bool>(keys::API_ENABLED).await.unwrap(), Some(true));
    }

    #[tokio::test]
    async fn clear_and_missing_keys() {
        let store = MapStore::default();
        let state = PersistedState::new(&store);
        assert_eq!(state.get::<u64>(keys::EXPIRE_AT).await.unwrap(), None);
        state.set(keys::EXPIRE_AT, &42u64).await.unwrap();
        assert!(state.clear(keys::EXPIRE_AT).await.unwrap());
        assert!(!state.clear(keys::EXPIRE_AT).await.unwrap());
    }

    #[tokio::test]
    async fn wrong_type_is_corrupt() {
        let store = MapStore::default();
        let state = PersistedState::new(&store);
        state.set(keys::EXPIRE_AT, "soon").await.unwrap();
        let err = state.get::<u64>(keys::EXPIRE_AT).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn snapshot_strips_namespace() {
        let store = MapStore::default();
        store.store("other.key", b"1".to_vec()).await.unwrap();
        let state = PersistedState::new(&store);
        state.set(keys::INTERVAL_PROMPT_DAYS, &2u32).await.unwrap();
        let snapshot = state.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["intervalPromptDays"], serde_json::json!(2));
    }
}
