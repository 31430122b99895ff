//! Study telemetry pings. Fire and forget.

use cohort_core::effects::{TelemetryEffects, TelemetryEventKind, TelemetryPayload};
use cohort_core::StudyConfig;
use tracing::warn;

/// Payload carrying the fields every study ping has.
pub(crate) fn payload(
    kind: TelemetryEventKind,
    config: Option<&StudyConfig>,
    variation: Option<&str>,
) -> TelemetryPayload {
    let mut payload = TelemetryPayload::new(kind);
    if let Some(config) = config {
        payload = payload
            .with_field("study", config.study_name.as_str())
            .with_field("testing", (!config.telemetry.remove_testing_flag).to_string());
    }
    if let Some(variation) = variation {
        payload = payload.with_field("variation", variation);
    }
    payload
}

/// Send, logging instead of failing.
pub(crate) async fn emit<E: TelemetryEffects + ?Sized>(effects: &E, payload: TelemetryPayload) {
    let event = payload.event.as_str();
    if let Err(e) = effects.send(payload).await {
        warn!(event, error = %e, "Telemetry send failed");
    }
}
