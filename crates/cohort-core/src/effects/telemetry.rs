//! Telemetry effect.
//!
//! The core fires and forgets: a failed `send` is logged by the caller and
//! never blocks a lifecycle transition. Retries belong to the handler.

use crate::errors::CohortError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named telemetry events emitted by the study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TelemetryEventKind {
    /// First enrollment of this install.
    Enter,
    /// A candidate-detected trigger arrived.
    Trigger,
    /// A prompt was handed to the renderer.
    PromptShown,
    /// The user closed the prompt, or it timed out.
    PromptDismissed,
    /// The user saved a provider choice.
    PromptAccepted,
    /// The study is ending.
    Exit,
}

impl TelemetryEventKind {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Trigger => "trigger",
            Self::PromptShown => "prompt-shown",
            Self::PromptDismissed => "prompt-dismissed",
            Self::PromptAccepted => "prompt-accepted",
            Self::Exit => "exit",
        }
    }
}

/// Flat string-map ping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    /// Event name.
    pub event: TelemetryEventKind,
    /// Event attributes (`study`, `variation`, `testing`, ...).
    pub fields: BTreeMap<String, String>,
}

impl TelemetryPayload {
    /// Payload with no attributes.
    pub fn new(event: TelemetryEventKind) -> Self {
        Self {
            event,
            fields: BTreeMap::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attribute lookup.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Telemetry transport and install identity.
#[async_trait]
pub trait TelemetryEffects: Send + Sync {
    /// Stable per-install client identifier.
    async fn client_id(&self) -> Result<String, CohortError>;

    /// Send a ping.
    async fn send(&self, payload: TelemetryPayload) -> Result<(), CohortError>;
}

#[async_trait]
impl<T: TelemetryEffects + ?Sized> TelemetryEffects for std::sync::Arc<T> {
    async fn client_id(&self) -> Result<String, CohortError> {
        (**self).client_id().await
    }

    async fn send(&self, payload: TelemetryPayload) -> Result<(), CohortError> {
        (**self).send(payload).await
    }
}
