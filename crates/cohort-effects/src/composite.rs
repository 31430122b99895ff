//! Composite handler bundling one production handler per effect.
//!
//! Hosts that only need to swap storage (memory vs. filesystem) can use
//! [`HostEffects`] directly; hosts with real UI or navigation implement the
//! traits themselves.

use crate::alarm::TokioAlarmHandler;
use crate::eligibility::StaticEligibilityHandler;
use crate::event_bus::EventBus;
use crate::navigation::LogNavigationHandler;
use crate::prompt::LogPromptRenderer;
use crate::telemetry::TracingTelemetryHandler;
use crate::time::RealTimeHandler;
use async_trait::async_trait;
use cohort_core::effects::{
    AlarmEffects, AlarmId, EligibilityEffects, EventBusEffects, NavigationEffects,
    PhysicalTimeEffects, PromptRendererEffects, StorageEffects, StorageError, TelemetryEffects,
    TelemetryPayload, TimeError,
};
use cohort_core::{CohortError, PromptView, StudyEvent, Subscription, TelemetryConfig, Timestamp};

/// Production effect bundle over a chosen storage backend.
#[derive(Debug, Clone)]
pub struct HostEffects<S> {
    storage: S,
    time: RealTimeHandler,
    telemetry: TracingTelemetryHandler,
    eligibility: StaticEligibilityHandler,
    navigation: LogNavigationHandler,
    alarms: TokioAlarmHandler<RealTimeHandler>,
    prompts: LogPromptRenderer,
    bus: EventBus,
}

impl<S: StorageEffects> HostEffects<S> {
    /// Bundle `storage` with the default handlers.
    pub fn new(storage: S, client_id: impl Into<String>, telemetry: TelemetryConfig) -> Self {
        let bus = EventBus::new();
        let time = RealTimeHandler::new();
        Self {
            storage,
            time,
            telemetry: TracingTelemetryHandler::new(client_id, telemetry),
            eligibility: StaticEligibilityHandler::allow_all(),
            navigation: LogNavigationHandler::new(),
            alarms: TokioAlarmHandler::new(bus.clone(), time),
            prompts: LogPromptRenderer::new(),
            bus,
        }
    }

    /// Replace the eligibility answer.
    pub fn with_eligibility(mut self, eligibility: StaticEligibilityHandler) -> Self {
        self.eligibility = eligibility;
        self
    }

    /// Shared event bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Navigation log.
    pub fn navigation(&self) -> &LogNavigationHandler {
        &self.navigation
    }

    /// Headless renderer state.
    pub fn prompts(&self) -> &LogPromptRenderer {
        &self.prompts
    }
}

#[async_trait]
impl<S: StorageEffects> StorageEffects for HostEffects<S> {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.storage.store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.storage.retrieve(key).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.storage.remove(key).await
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        self.storage.list_keys(prefix).await
    }
}

#[async_trait]
impl<S: StorageEffects> PhysicalTimeEffects for HostEffects<S> {
    async fn now(&self) -> Result<Timestamp, TimeError> {
        self.time.now().await
    }
}

#[async_trait]
impl<S: StorageEffects> TelemetryEffects for HostEffects<S> {
    async fn client_id(&self) -> Result<String, CohortError> {
        self.telemetry.client_id().await
    }

    async fn send(&self, payload: TelemetryPayload) -> Result<(), CohortError> {
        self.telemetry.send(payload).await
    }
}

#[async_trait]
impl<S: StorageEffects> EligibilityEffects for HostEffects<S> {
    async fn is_eligible(&self) -> Result<bool, CohortError> {
        self.eligibility.is_eligible().await
    }
}

#[async_trait]
impl<S: StorageEffects> NavigationEffects for HostEffects<S> {
    async fn open_url(&self, url: &str) -> Result<(), CohortError> {
        self.navigation.open_url(url).await
    }
}

#[async_trait]
impl<S: StorageEffects> AlarmEffects for HostEffects<S> {
    async fn schedule_alarm(&self, name: &str, at: Timestamp) -> Result<AlarmId, CohortError> {
        self.alarms.schedule_alarm(name, at).await
    }

    async fn cancel_alarm(&self, id: AlarmId) -> bool {
        self.alarms.cancel_alarm(id).await
    }
}

#[async_trait]
impl<S: StorageEffects> PromptRendererEffects for HostEffects<S> {
    async fn show_prompt(&self, view: &PromptView) -> Result<(), CohortError> {
        self.prompts.show_prompt(view).await
    }

    async fn dismiss_prompt(&self) -> Result<(), CohortError> {
        self.prompts.dismiss_prompt().await
    }
}

impl<S: StorageEffects> EventBusEffects for HostEffects<S> {
    fn subscribe(&self, topics: &[&str]) -> Subscription {
        self.bus.subscribe(topics)
    }

    fn publish(&self, event: StudyEvent) -> usize {
        self.bus.publish(event)
    }
}
