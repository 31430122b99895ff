//! Study facade and event runtime.
//!
//! [`Study`] is the explicit context object a host constructs once per
//! process. It owns the lifecycle, the scheduler and the prompt currently on
//! screen, and exposes the [`StudyApi`] surface any host adapter can drive.

use crate::effects::{StudyEffects, StudyRuntimeEffects};
use crate::lifecycle::{EndOutcome, LifecycleState, SetupOutcome, StudyLifecycle};
use crate::policy::PromptPolicy;
use crate::prompt_state::PromptState;
use crate::scheduler::{PromptDecision, PromptScheduler, SuppressReason};
use crate::selection::PromptSelection;
use crate::telemetry;
use async_trait::async_trait;
use cohort_core::effects::{TelemetryEventKind, EXPIRY_ALARM};
use cohort_core::events::ALL_TOPICS;
use cohort_core::{
    EndingReason, PromptOutcome, PromptResponse, ProviderCandidate, Result, StudyConfig,
    StudyEvent, Subscription,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Host-facing study surface.
#[async_trait]
pub trait StudyApi: Send + Sync {
    /// Validate, enroll and activate.
    async fn setup(&self, config: StudyConfig, is_first_run: bool) -> Result<SetupOutcome>;

    /// Handle one trigger offering `candidates`; renders the prompt on `Show`.
    async fn decide(&self, candidates: Vec<ProviderCandidate>) -> Result<PromptDecision>;

    /// Persist the outcome of the shown prompt.
    async fn record_outcome(&self, outcome: PromptOutcome) -> Result<()>;

    /// End the study; idempotent.
    async fn end_study(&self, reason: EndingReason) -> EndOutcome;
}

/// What the runtime loop does after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep receiving.
    Continue,
    /// Tear down the subscription.
    Exit,
}

/// One study in one process.
pub struct Study<E> {
    effects: Arc<E>,
    lifecycle: StudyLifecycle<E>,
    scheduler: RwLock<PromptScheduler>,
    active_prompt: Mutex<Option<PromptSelection>>,
}

impl<E: StudyEffects> Study<E> {
    /// New study context over `effects`.
    pub fn new(effects: Arc<E>) -> Self {
        Self {
            lifecycle: StudyLifecycle::new(effects.clone()),
            effects,
            scheduler: RwLock::new(PromptScheduler::new()),
            active_prompt: Mutex::new(None),
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Lifecycle handle.
    pub fn lifecycle(&self) -> &StudyLifecycle<E> {
        &self.lifecycle
    }

    /// Active prompt policy.
    pub fn policy(&self) -> Option<PromptPolicy> {
        self.scheduler.read().policy().copied()
    }

    /// Selection of the prompt on screen.
    pub fn active_prompt(&self) -> Option<PromptSelection> {
        self.active_prompt.lock().clone()
    }

    /// Current persisted prompt state, with read fallbacks applied.
    pub async fn prompt_state(&self) -> PromptState {
        PromptState::load(&*self.effects).await
    }

    async fn send(&self, kind: TelemetryEventKind, extra: &[(&str, &str)]) {
        let config = self.lifecycle.config();
        let variation = self.lifecycle.variation();
        let mut payload = telemetry::payload(kind, config.as_deref(), variation.as_deref());
        for (key, value) in extra {
            payload = payload.with_field(*key, *value);
        }
        telemetry::emit(&*self.effects, payload).await;
    }

    /// React to a renderer response.
    pub async fn handle_response(&self, response: PromptResponse) -> Result<()> {
        match response {
            PromptResponse::Select { provider_key } => {
                let view = {
                    let mut active = self.active_prompt.lock();
                    let Some(selection) = active.as_mut() else {
                        debug!(provider = %provider_key, "Selection with no prompt shown");
                        return Ok(());
                    };
                    selection.select(&provider_key)?;
                    selection.view()
                };
                self.effects.show_prompt(&view).await
            }
            PromptResponse::Save => {
                let confirmed = self
                    .active_prompt
                    .lock()
                    .as_ref()
                    .map(PromptSelection::confirm);
                match confirmed {
                    Some(Ok(provider_key)) => {
                        self.record_outcome(PromptOutcome::Accepted { provider_key })
                            .await
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Save ignored");
                        Ok(())
                    }
                    None => {
                        debug!("Save with no prompt shown");
                        Ok(())
                    }
                }
            }
            PromptResponse::Dismiss { cause } => {
                if self.active_prompt.lock().is_none() {
                    debug!(cause = cause.as_str(), "Dismiss with no prompt shown");
                    return Ok(());
                }
                self.record_outcome(PromptOutcome::Dismissed { cause }).await
            }
        }
    }

    /// Dispatch one bus event.
    pub async fn handle_event(&self, event: StudyEvent) -> Result<Flow> {
        match event {
            StudyEvent::CandidateDetected { candidates } => {
                self.decide(candidates).await?;
            }
            StudyEvent::PromptResponded { response } => {
                self.handle_response(response).await?;
            }
            StudyEvent::AlarmFired { name, id } => {
                if name == EXPIRY_ALARM {
                    info!(alarm_id = %id, "Expiry alarm fired");
                    self.end_study(EndingReason::Expired).await;
                } else {
                    debug!(alarm = %name, "Ignoring unknown alarm");
                }
            }
            StudyEvent::DisableRequested => {
                self.end_study(EndingReason::UserDisable).await;
            }
            StudyEvent::HostShutdown { reason } => {
                if reason.ends_study() && !self.lifecycle.is_ending() {
                    self.end_study(EndingReason::UserDisable).await;
                }
                info!(reason = reason.as_str(), "Host shutting down");
                return Ok(Flow::Exit);
            }
        }
        Ok(match self.lifecycle.state() {
            LifecycleState::Ended { .. } => Flow::Exit,
            _ => Flow::Continue,
        })
    }
}

impl<E: StudyRuntimeEffects> Study<E> {
    /// Subscribe to every study topic on the host bus.
    pub fn subscribe(&self) -> Subscription {
        self.effects.subscribe(&ALL_TOPICS)
    }

    /// Deliver events one at a time until the study ends, the host shuts
    /// down, or the bus goes away. Event errors are logged and skipped.
    pub async fn run(&self, mut subscription: Subscription) {
        info!(subscription = %subscription.id(), "Study event loop started");
        if matches!(self.lifecycle.state(), LifecycleState::Ended { .. }) {
            subscription.unsubscribe();
            return;
        }
        while let Some(event) = subscription.recv().await {
            let topic = event.topic();
            match self.handle_event(event).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(e) => warn!(topic, error = %e, "Event handling failed"),
            }
        }
        subscription.unsubscribe();
        info!("Study event loop stopped");
    }
}

#[async_trait]
impl<E: StudyEffects> StudyApi for Study<E> {
    async fn setup(&self, config: StudyConfig, is_first_run: bool) -> Result<SetupOutcome> {
        let outcome = self.lifecycle.setup(config, is_first_run).await?;
        if let SetupOutcome::Active(activation) = &outcome {
            if let Some(policy) = activation.policy {
                self.scheduler.write().configure(policy);
            }
        }
        Ok(outcome)
    }

    async fn decide(&self, candidates: Vec<ProviderCandidate>) -> Result<PromptDecision> {
        let count = candidates.len().to_string();
        self.send(TelemetryEventKind::Trigger, &[("candidates", count.as_str())])
            .await;

        let state = self.prompt_state().await;
        let now = self.effects.now().await?;
        let lifecycle = self.lifecycle.state();
        let decision = if candidates.is_empty() && lifecycle.is_active() {
            PromptDecision::Suppress(SuppressReason::NoCandidates)
        } else {
            self.scheduler.read().decide(now, &state, &lifecycle)
        };
        let PromptDecision::Show(mode) = decision else {
            return Ok(decision);
        };

        let selection = PromptSelection::new(mode, candidates)?;
        let view = selection.view();
        // An ending may have started while state was loading
        if self.lifecycle.is_ending() {
            return Ok(PromptDecision::Suppress(SuppressReason::NotActive));
        }
        *self.active_prompt.lock() = Some(selection);

        if let Err(e) = self.effects.show_prompt(&view).await {
            self.active_prompt.lock().take();
            return Err(e);
        }
        self.send(
            TelemetryEventKind::PromptShown,
            &[("provider", view.provider_label.as_str())],
        )
        .await;
        Ok(decision)
    }

    async fn record_outcome(&self, outcome: PromptOutcome) -> Result<()> {
        if !self.lifecycle.state().is_active() || self.lifecycle.is_ending() {
            debug!(?outcome, "Outcome ignored, study not active");
            return Ok(());
        }
        let now = self.effects.now().await?;
        let previous = self.prompt_state().await;
        let scheduler = self.scheduler.read().clone();
        scheduler
            .record_outcome(&*self.effects, now, &outcome, &previous)
            .await;

        self.active_prompt.lock().take();
        if let Err(e) = self.effects.dismiss_prompt().await {
            warn!(error = %e, "Failed to clear prompt");
        }

        match &outcome {
            PromptOutcome::Dismissed { cause } => {
                self.send(TelemetryEventKind::PromptDismissed, &[("cause", cause.as_str())])
                    .await;
            }
            PromptOutcome::Accepted { provider_key } => {
                info!(provider = %provider_key, "User opted in");
                self.send(
                    TelemetryEventKind::PromptAccepted,
                    &[("provider", provider_key.as_str())],
                )
                .await;
            }
        }
        Ok(())
    }

    async fn end_study(&self, reason: EndingReason) -> EndOutcome {
        let outcome = self.lifecycle.end_study(reason).await;
        if outcome.performed {
            self.active_prompt.lock().take();
        }
        outcome
    }
}

impl<E> std::fmt::Debug for Study<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Study")
            .field("lifecycle", &self.lifecycle)
            .field("scheduler", &*self.scheduler.read())
            .finish_non_exhaustive()
    }
}
