//! Mock effects implementation for deterministic testing
//!
//! [`MockEffects`] implements every collaborator trait over in-memory state:
//!
//! - Settable wall clock (`set_now`, `advance`)
//! - In-memory storage with read/write failure injection
//! - Recorded telemetry, opened URLs, rendered prompts and alarms
//! - Scripted eligibility answers, including errors
//! - Optional cooperative yields inside every effect call, so `tokio::join!`
//!   interleaves concurrent study operations at each suspension point
//!
//! # Blocking Lock Usage
//!
//! Uses `std::sync::Mutex`; no lock is held across an await.

use async_trait::async_trait;
use cohort_core::effects::{
    AlarmEffects, AlarmId, EligibilityEffects, EventBusEffects, NavigationEffects,
    PhysicalTimeEffects, PromptRendererEffects, StorageEffects, StorageError, TelemetryEffects,
    TelemetryEventKind, TelemetryPayload, TimeError,
};
use cohort_core::{CohortError, PromptView, StudyEvent, Subscription, Timestamp};
use cohort_effects::EventBus;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Storage write failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailure {
    /// Writes succeed.
    #[default]
    Never,
    /// The next write fails, later ones succeed.
    Once,
    /// Every write fails.
    Always,
}

#[derive(Debug)]
struct MockState {
    storage: BTreeMap<String, Vec<u8>>,
    now: Timestamp,
    client_id: Option<String>,
    eligibility: Result<bool, String>,
    eligibility_calls: usize,
    fail_reads: bool,
    write_failure: WriteFailure,
    write_attempts: usize,
    fail_telemetry: bool,
    fail_navigation: bool,
    fail_render: bool,
    telemetry: Vec<TelemetryPayload>,
    opened_urls: Vec<String>,
    shown: Vec<PromptView>,
    dismissals: usize,
    alarms: BTreeMap<AlarmId, (String, Timestamp)>,
    cancelled: Vec<AlarmId>,
}

/// Mock effects implementation for deterministic testing
#[derive(Debug, Clone)]
pub struct MockEffects {
    state: Arc<Mutex<MockState>>,
    bus: EventBus,
    yielding: bool,
}

impl Default for MockEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEffects {
    /// Eligible install with an empty store, clock at epoch zero.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                storage: BTreeMap::new(),
                now: Timestamp::default(),
                client_id: Some("client-0000".to_string()),
                eligibility: Ok(true),
                eligibility_calls: 0,
                fail_reads: false,
                write_failure: WriteFailure::Never,
                write_attempts: 0,
                fail_telemetry: false,
                fail_navigation: false,
                fail_render: false,
                telemetry: Vec::new(),
                opened_urls: Vec::new(),
                shown: Vec::new(),
                dismissals: 0,
                alarms: BTreeMap::new(),
                cancelled: Vec::new(),
            })),
            bus: EventBus::new(),
            yielding: false,
        }
    }

    /// Builder: per-install client id.
    pub fn with_client_id(self, client_id: &str) -> Self {
        self.state.lock().unwrap().client_id = Some(client_id.to_string());
        self
    }

    /// Builder: yield to the scheduler inside every effect call.
    pub fn with_yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    /// Replace the client id.
    pub fn set_client_id(&self, client_id: &str) {
        self.state.lock().unwrap().client_id = Some(client_id.to_string());
    }

    /// Simulate a host that cannot provide a client id.
    pub fn clear_client_id(&self) {
        self.state.lock().unwrap().client_id = None;
    }

    /// A fresh handle over the same storage, as after a process restart.
    /// Recordings, alarms and the bus start empty.
    pub fn restarted(&self) -> Self {
        let old = self.state.lock().unwrap();
        let fresh = Self::new();
        {
            let mut state = fresh.state.lock().unwrap();
            state.storage = old.storage.clone();
            state.now = old.now;
            state.client_id = old.client_id.clone();
        }
        fresh
    }

    // Clock

    /// Set the wall clock.
    pub fn set_now(&self, now: Timestamp) {
        self.state.lock().unwrap().now = now;
    }

    /// Move the wall clock forward.
    pub fn advance(&self, secs: u64) {
        let mut state = self.state.lock().unwrap();
        state.now = state.now.plus_secs(secs);
    }

    // Failure injection

    /// Answer for the next eligibility checks.
    pub fn set_eligible(&self, eligible: bool) {
        self.state.lock().unwrap().eligibility = Ok(eligible);
    }

    /// Make the eligibility check fail.
    pub fn fail_eligibility(&self, message: &str) {
        self.state.lock().unwrap().eligibility = Err(message.to_string());
    }

    /// Make every storage read fail.
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    /// Configure storage write failures.
    pub fn fail_writes(&self, mode: WriteFailure) {
        self.state.lock().unwrap().write_failure = mode;
    }

    /// Make telemetry sends fail.
    pub fn fail_telemetry(&self, fail: bool) {
        self.state.lock().unwrap().fail_telemetry = fail;
    }

    /// Make URL opening fail.
    pub fn fail_navigation(&self, fail: bool) {
        self.state.lock().unwrap().fail_navigation = fail;
    }

    /// Make prompt rendering fail.
    pub fn fail_render(&self, fail: bool) {
        self.state.lock().unwrap().fail_render = fail;
    }

    // Inspection

    /// Raw value stored under a fully qualified key.
    pub fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().storage.get(key).cloned()
    }

    /// Fully qualified keys present in storage.
    pub fn storage_keys(&self) -> Vec<String> {
        self.state.lock().unwrap().storage.keys().cloned().collect()
    }

    /// Write attempts, including failed ones.
    pub fn write_attempts(&self) -> usize {
        self.state.lock().unwrap().write_attempts
    }

    /// Number of eligibility checks performed.
    pub fn eligibility_calls(&self) -> usize {
        self.state.lock().unwrap().eligibility_calls
    }

    /// Every telemetry payload accepted so far.
    pub fn telemetry(&self) -> Vec<TelemetryPayload> {
        self.state.lock().unwrap().telemetry.clone()
    }

    /// Payloads of one kind.
    pub fn telemetry_of(&self, kind: TelemetryEventKind) -> Vec<TelemetryPayload> {
        self.telemetry()
            .into_iter()
            .filter(|p| p.event == kind)
            .collect()
    }

    /// URLs opened so far.
    pub fn opened_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().opened_urls.clone()
    }

    /// Every prompt view rendered.
    pub fn shown_prompts(&self) -> Vec<PromptView> {
        self.state.lock().unwrap().shown.clone()
    }

    /// Number of `dismiss_prompt` calls.
    pub fn dismissals(&self) -> usize {
        self.state.lock().unwrap().dismissals
    }

    /// Alarms scheduled and neither fired nor cancelled.
    pub fn pending_alarms(&self) -> Vec<(AlarmId, String, Timestamp)> {
        self.state
            .lock()
            .unwrap()
            .alarms
            .iter()
            .map(|(id, (name, at))| (*id, name.clone(), *at))
            .collect()
    }

    /// Alarms cancelled so far.
    pub fn cancelled_alarms(&self) -> Vec<AlarmId> {
        self.state.lock().unwrap().cancelled.clone()
    }

    /// Fire a pending alarm onto the bus. Returns false if it is not pending.
    pub fn fire_alarm(&self, id: AlarmId) -> bool {
        let Some((name, _)) = self.state.lock().unwrap().alarms.remove(&id) else {
            return false;
        };
        self.bus.publish(StudyEvent::AlarmFired { name, id });
        true
    }

    /// Shared event bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    async fn suspend(&self) {
        if self.yielding {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl StorageEffects for MockEffects {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.suspend().await;
        let mut state = self.state.lock().unwrap();
        state.write_attempts += 1;
        match state.write_failure {
            WriteFailure::Always => {
                return Err(StorageError::WriteFailed(format!("injected: {key}")));
            }
            WriteFailure::Once => {
                state.write_failure = WriteFailure::Never;
                return Err(StorageError::WriteFailed(format!("injected once: {key}")));
            }
            WriteFailure::Never => {}
        }
        state.storage.insert(key.to_string(), value);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.suspend().await;
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(StorageError::ReadFailed(format!("injected: {key}")));
        }
        Ok(state.storage.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.suspend().await;
        let mut state = self.state.lock().unwrap();
        if state.write_failure == WriteFailure::Always {
            return Err(StorageError::DeleteFailed(format!("injected: {key}")));
        }
        Ok(state.storage.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(StorageError::ReadFailed("injected: list".to_string()));
        }
        Ok(state
            .storage
            .keys()
            .filter(|k| prefix.map_or(true, |p| k.starts_with(p)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PhysicalTimeEffects for MockEffects {
    async fn now(&self) -> Result<Timestamp, TimeError> {
        Ok(self.state.lock().unwrap().now)
    }
}

#[async_trait]
impl TelemetryEffects for MockEffects {
    async fn client_id(&self) -> Result<String, CohortError> {
        self.state
            .lock()
            .unwrap()
            .client_id
            .clone()
            .ok_or_else(|| CohortError::telemetry("client id unavailable"))
    }

    async fn send(&self, payload: TelemetryPayload) -> Result<(), CohortError> {
        self.suspend().await;
        let mut state = self.state.lock().unwrap();
        if state.fail_telemetry {
            return Err(CohortError::telemetry("injected send failure"));
        }
        state.telemetry.push(payload);
        Ok(())
    }
}

#[async_trait]
impl EligibilityEffects for MockEffects {
    async fn is_eligible(&self) -> Result<bool, CohortError> {
        self.suspend().await;
        let mut state = self.state.lock().unwrap();
        state.eligibility_calls += 1;
        state.eligibility.clone().map_err(CohortError::eligibility)
    }
}

#[async_trait]
impl NavigationEffects for MockEffects {
    async fn open_url(&self, url: &str) -> Result<(), CohortError> {
        self.suspend().await;
        let mut state = self.state.lock().unwrap();
        if state.fail_navigation {
            return Err(CohortError::navigation("injected navigation failure"));
        }
        state.opened_urls.push(url.to_string());
        Ok(())
    }
}

#[async_trait]
impl AlarmEffects for MockEffects {
    async fn schedule_alarm(&self, name: &str, at: Timestamp) -> Result<AlarmId, CohortError> {
        let id = Uuid::new_v4();
        self.state
            .lock()
            .unwrap()
            .alarms
            .insert(id, (name.to_string(), at));
        Ok(id)
    }

    async fn cancel_alarm(&self, id: AlarmId) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.alarms.remove(&id).is_some() {
            state.cancelled.push(id);
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl PromptRendererEffects for MockEffects {
    async fn show_prompt(&self, view: &PromptView) -> Result<(), CohortError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_render {
            return Err(CohortError::render("injected render failure"));
        }
        state.shown.push(view.clone());
        Ok(())
    }

    async fn dismiss_prompt(&self) -> Result<(), CohortError> {
        self.state.lock().unwrap().dismissals += 1;
        Ok(())
    }
}

impl EventBusEffects for MockEffects {
    fn subscribe(&self, topics: &[&str]) -> Subscription {
        self.bus.subscribe(topics)
    }

    fn publish(&self, event: StudyEvent) -> usize {
        self.bus.publish(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_once_failure_recovers() {
        let effects = MockEffects::new();
        effects.fail_writes(WriteFailure::Once);
        assert!(effects.store("study.k", vec![1]).await.is_err());
        assert!(effects.store("study.k", vec![1]).await.is_ok());
        assert_eq!(effects.write_attempts(), 2);
    }

    #[tokio::test]
    async fn restart_keeps_storage_only() {
        let effects = MockEffects::new();
        effects.store("study.k", vec![7]).await.unwrap();
        effects
            .send(TelemetryPayload::new(TelemetryEventKind::Enter))
            .await
            .unwrap();

        let restarted = effects.restarted();
        assert_eq!(restarted.stored("study.k"), Some(vec![7]));
        assert!(restarted.telemetry().is_empty());
    }

    #[tokio::test]
    async fn fired_alarm_is_published() {
        let effects = MockEffects::new();
        let mut sub = effects.subscribe(&[cohort_core::events::ALARM]);
        let id = effects
            .schedule_alarm("study-expiry", Timestamp::from_secs(10))
            .await
            .unwrap();
        assert!(effects.fire_alarm(id));
        assert!(!effects.fire_alarm(id));
        assert!(matches!(
            sub.try_recv(),
            Some(StudyEvent::AlarmFired { name, .. }) if name == "study-expiry"
        ));
    }
}
