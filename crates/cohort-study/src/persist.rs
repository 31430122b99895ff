//! Best-effort persisted-state access.
//!
//! Reads fall back to `None` on failure; writes are retried once, then
//! logged and dropped. The next trigger re-derives from whatever is stored.

use cohort_core::effects::StorageEffects;
use cohort_core::PersistedState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Read `key`, treating failures as absent.
pub(crate) async fn read_or_none<S, T>(storage: &S, key: &str) -> Option<T>
where
    S: StorageEffects + ?Sized,
    T: DeserializeOwned,
{
    match PersistedState::new(storage).get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Persisted read failed, using default");
            None
        }
    }
}

/// Write `key`, retrying once. Returns whether the value landed.
pub(crate) async fn write_with_retry<S, T>(storage: &S, key: &str, value: &T) -> bool
where
    S: StorageEffects + ?Sized,
    T: Serialize + ?Sized + Sync,
{
    let state = PersistedState::new(storage);
    for attempt in 1..=2 {
        match state.set(key, value).await {
            Ok(()) => {
                debug!(key, attempt, "Persisted write");
                return true;
            }
            Err(e) if attempt == 1 => debug!(key, error = %e, "Persisted write failed, retrying"),
            Err(e) => warn!(key, error = %e, "Persisted write dropped"),
        }
    }
    false
}

/// Remove `key`, retrying once. Returns whether the removal landed.
pub(crate) async fn clear_with_retry<S>(storage: &S, key: &str) -> bool
where
    S: StorageEffects + ?Sized,
{
    let state = PersistedState::new(storage);
    for attempt in 1..=2 {
        match state.clear(key).await {
            Ok(_) => return true,
            Err(e) if attempt == 1 => debug!(key, error = %e, "Persisted clear failed, retrying"),
            Err(e) => warn!(key, error = %e, "Persisted clear dropped"),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_core::keys;
    use cohort_testkit::{MockEffects, WriteFailure};

    #[tokio::test]
    async fn single_write_failure_is_retried() {
        let effects = MockEffects::new();
        effects.fail_writes(WriteFailure::Once);
        assert!(write_with_retry(&effects, keys::API_ENABLED, &true).await);
        assert_eq!(effects.write_attempts(), 2);
        assert_eq!(effects.stored("study.apiEnabled"), Some(b"true".to_vec()));
    }

    #[tokio::test]
    async fn persistent_write_failure_is_dropped_after_two_attempts() {
        let effects = MockEffects::new();
        effects.fail_writes(WriteFailure::Always);
        assert!(!write_with_retry(&effects, keys::API_ENABLED, &true).await);
        assert_eq!(effects.write_attempts(), 2);
    }

    #[tokio::test]
    async fn failed_read_is_none() {
        let effects = MockEffects::new();
        assert!(write_with_retry(&effects, keys::VARIATION, "short").await);
        effects.fail_reads(true);
        assert_eq!(read_or_none::<_, String>(&effects, keys::VARIATION).await, None);
    }
}
