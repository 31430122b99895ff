//! Wall-clock time effect.

use crate::time::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for time operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    /// System clock is before the Unix epoch or otherwise unusable
    #[error("Clock unavailable: {reason}")]
    ClockUnavailable {
        /// Details from the clock source
        reason: String,
    },
}

/// Physical clock used for enrollment, expiry and interval gating.
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current time in epoch seconds.
    async fn now(&self) -> Result<Timestamp, TimeError>;
}

/// Blanket implementation for Arc<T> where T: PhysicalTimeEffects
#[async_trait]
impl<T: PhysicalTimeEffects + ?Sized> PhysicalTimeEffects for std::sync::Arc<T> {
    async fn now(&self) -> Result<Timestamp, TimeError> {
        (**self).now().await
    }
}
