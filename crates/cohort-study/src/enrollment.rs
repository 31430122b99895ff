//! Enrollment record: the write-once result of bucketing an install.

use crate::persist::write_with_retry;
use cohort_core::effects::{StorageEffects, StorageError};
use cohort_core::{keys, EndingReason, PersistedState, Timestamp};
use serde::{Deserialize, Serialize};

/// Persisted enrollment of this install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    /// Salt the variation was derived from (`studyName + clientId`).
    pub client_salt: String,
    /// Resolved variation name.
    pub variation: String,
    /// Enrollment time.
    pub first_run_timestamp: Timestamp,
    /// `first_run_timestamp + expire.days`.
    pub expire_at: Timestamp,
}

impl EnrollmentRecord {
    /// True once `now` is strictly past `expire_at`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expire_at
    }

    /// Persist every field that is not stored yet. Stored fields are never
    /// overwritten.
    pub(crate) async fn persist_missing<S: StorageEffects + ?Sized>(
        &self,
        storage: &S,
        stored: &StoredEnrollment,
    ) {
        if stored.variation.is_none() {
            write_with_retry(storage, keys::VARIATION, &self.variation).await;
        }
        if stored.client_salt.is_none() {
            write_with_retry(storage, keys::CLIENT_SALT, &self.client_salt).await;
        }
        if stored.first_run_timestamp.is_none() {
            write_with_retry(storage, keys::FIRST_RUN_TIMESTAMP, &self.first_run_timestamp).await;
        }
        if stored.expire_at.is_none() {
            write_with_retry(storage, keys::EXPIRE_AT, &self.expire_at).await;
        }
    }
}

/// Whatever part of an enrollment is on disk, plus the terminal marker.
///
/// Unlike prompt state, a failed read here is an error: absent keys get
/// written, so guessing "absent" would overwrite a write-once value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StoredEnrollment {
    pub(crate) variation: Option<String>,
    pub(crate) client_salt: Option<String>,
    pub(crate) first_run_timestamp: Option<Timestamp>,
    pub(crate) expire_at: Option<Timestamp>,
    pub(crate) ended_reason: Option<EndingReason>,
}

impl StoredEnrollment {
    pub(crate) async fn load<S: StorageEffects + ?Sized>(
        storage: &S,
    ) -> Result<Self, StorageError> {
        let state = PersistedState::new(storage);
        Ok(Self {
            variation: state.get(keys::VARIATION).await?,
            client_salt: state.get(keys::CLIENT_SALT).await?,
            first_run_timestamp: state.get(keys::FIRST_RUN_TIMESTAMP).await?,
            expire_at: state.get(keys::EXPIRE_AT).await?,
            ended_reason: state.get(keys::ENDED_REASON).await?,
        })
    }

    /// A variation has already been assigned to this install.
    pub(crate) fn is_enrolled(&self) -> bool {
        self.variation.is_some()
    }
}
