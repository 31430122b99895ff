//! Telemetry handler that records pings through `tracing`.
//!
//! Transport to a collection pipeline is the host's concern; this handler
//! emits each ping as a structured `info` event on the `cohort::telemetry`
//! target so a subscriber layer can forward it.

use async_trait::async_trait;
use cohort_core::effects::{TelemetryEffects, TelemetryPayload};
use cohort_core::{CohortError, TelemetryConfig};
use tracing::{debug, info};

/// Tracing-backed telemetry handler.
#[derive(Debug, Clone)]
pub struct TracingTelemetryHandler {
    client_id: String,
    config: TelemetryConfig,
}

impl TracingTelemetryHandler {
    /// Create a handler for the install identified by `client_id`.
    pub fn new(client_id: impl Into<String>, config: TelemetryConfig) -> Self {
        Self {
            client_id: client_id.into(),
            config,
        }
    }
}

#[async_trait]
impl TelemetryEffects for TracingTelemetryHandler {
    async fn client_id(&self) -> Result<String, CohortError> {
        if self.client_id.is_empty() {
            return Err(CohortError::telemetry("client id is not available"));
        }
        Ok(self.client_id.clone())
    }

    async fn send(&self, payload: TelemetryPayload) -> Result<(), CohortError> {
        let body = serde_json::to_string(&payload.fields)?;
        if !self.config.send {
            debug!(event = payload.event.as_str(), %body, "Telemetry disabled, ping not sent");
            return Ok(());
        }
        info!(
            target: "cohort::telemetry",
            event = payload.event.as_str(),
            client_id = %self.client_id,
            %body,
            "Telemetry ping"
        );
        Ok(())
    }
}
