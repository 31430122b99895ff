//! Cancelable one-shot alarms.
//!
//! A fired alarm is delivered as [`crate::events::StudyEvent::AlarmFired`] on
//! the event bus, so alarm handling runs through the same one-at-a-time
//! dispatch as every other trigger.

use crate::errors::CohortError;
use crate::time::Timestamp;
use async_trait::async_trait;
use uuid::Uuid;

/// Handle for a scheduled alarm.
pub type AlarmId = Uuid;

/// Alarm name used for study expiry.
pub const EXPIRY_ALARM: &str = "study-expiry";

/// One-shot alarm scheduling.
#[async_trait]
pub trait AlarmEffects: Send + Sync {
    /// Schedule `name` to fire at `at`. Past times fire promptly.
    async fn schedule_alarm(&self, name: &str, at: Timestamp) -> Result<AlarmId, CohortError>;

    /// Cancel an alarm; returns whether it was still pending.
    async fn cancel_alarm(&self, id: AlarmId) -> bool;
}

#[async_trait]
impl<T: AlarmEffects + ?Sized> AlarmEffects for std::sync::Arc<T> {
    async fn schedule_alarm(&self, name: &str, at: Timestamp) -> Result<AlarmId, CohortError> {
        (**self).schedule_alarm(name, at).await
    }

    async fn cancel_alarm(&self, id: AlarmId) -> bool {
        (**self).cancel_alarm(id).await
    }
}
