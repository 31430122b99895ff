//! Persisted prompt state.

use crate::persist::{clear_with_retry, read_or_none, write_with_retry};
use cohort_core::effects::StorageEffects;
use cohort_core::{keys, PersistedState, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What the scheduler knows about past prompts on this install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptState {
    /// Last dismissal.
    pub last_prompt_timestamp: Option<Timestamp>,
    /// Provider the user opted into.
    pub opted_in_provider_key: Option<String>,
    /// Master switch.
    pub api_enabled: bool,
}

impl PromptState {
    /// Load with fallbacks: unreadable values count as never prompted and
    /// not opted in. An unreadable `apiEnabled` counts as enabled; an absent
    /// one as disabled.
    pub async fn load<S: StorageEffects + ?Sized>(storage: &S) -> Self {
        let api_enabled = match PersistedState::new(storage)
            .get::<bool>(keys::API_ENABLED)
            .await
        {
            Ok(value) => value.unwrap_or(false),
            Err(e) => {
                warn!(error = %e, "apiEnabled unreadable, assuming enabled");
                true
            }
        };
        Self {
            last_prompt_timestamp: read_or_none(storage, keys::LAST_PROMPT_TIMESTAMP).await,
            opted_in_provider_key: read_or_none(storage, keys::OPTED_IN_PROVIDER_KEY).await,
            api_enabled,
        }
    }

    /// Enable prompting and record the active interval.
    pub(crate) async fn activate<S: StorageEffects + ?Sized>(storage: &S, interval_days: u32) {
        write_with_retry(storage, keys::API_ENABLED, &true).await;
        write_with_retry(storage, keys::INTERVAL_PROMPT_DAYS, &interval_days).await;
    }

    /// Ending cleanup: drop every prompt key, then pin `apiEnabled` off.
    pub(crate) async fn clear<S: StorageEffects + ?Sized>(storage: &S) {
        for key in keys::PROMPT_STATE_KEYS {
            clear_with_retry(storage, key).await;
        }
        Self::disable(storage).await;
    }

    /// Persist `apiEnabled = false`.
    pub(crate) async fn disable<S: StorageEffects + ?Sized>(storage: &S) {
        write_with_retry(storage, keys::API_ENABLED, &false).await;
    }
}
