//! Real time effect handler for production use

use async_trait::async_trait;
use cohort_core::effects::{PhysicalTimeEffects, TimeError};
use cohort_core::Timestamp;
use std::time::{SystemTime, UNIX_EPOCH};

/// System clock handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn now(&self) -> Result<Timestamp, TimeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Timestamp::from_secs(d.as_secs()))
            .map_err(|e| TimeError::ClockUnavailable {
                reason: e.to_string(),
            })
    }
}
