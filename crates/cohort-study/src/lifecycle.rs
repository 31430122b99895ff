//! Study lifecycle: enrollment, expiry and idempotent ending.
//!
//! ```text
//! NotStarted -> (eligibility, first run only) -> Active -> Ending(reason) -> Ended(reason)
//! ```
//!
//! `is_ending` is the latch. It flips false to true exactly once per process,
//! inside the same critical section that records the ending reason, before
//! the first suspension point of `end_study`. Every later caller observes the
//! latch and returns the recorded reason without side effects.
//!
//! The ending is also persisted under `study.endedReason`. A later process
//! that finds the marker starts directly in `Ended` and never re-enrolls.

use crate::enrollment::{EnrollmentRecord, StoredEnrollment};
use crate::persist::write_with_retry;
use crate::policy::PromptPolicy;
use crate::prompt_state::PromptState;
use crate::telemetry;
use crate::StudyEffects;
use cohort_core::effects::{AlarmId, TelemetryEventKind, EXPIRY_ALARM};
use cohort_core::{
    assign, bucketing_salt, keys, CohortError, EndingReason, Result, StudyConfig, Timestamp,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where this process is in the study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum LifecycleState {
    /// `setup` has not completed.
    NotStarted,
    /// Enrolled and running.
    Active {
        /// Resolved variation.
        variation: String,
    },
    /// Ending side effects in progress.
    Ending {
        /// Recorded reason.
        reason: EndingReason,
    },
    /// Terminal.
    Ended {
        /// Recorded reason.
        reason: EndingReason,
    },
}

impl LifecycleState {
    /// Enrolled and not ending.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Reason recorded by `end_study`, if it ran.
    pub fn ending_reason(&self) -> Option<&EndingReason> {
        match self {
            Self::Ending { reason } | Self::Ended { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Result of `end_study`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOutcome {
    /// Reason the study ended with; the first caller's reason.
    pub reason: EndingReason,
    /// Whether this call ran the ending side effects.
    pub performed: bool,
}

/// A successful activation.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    /// Enrollment in effect.
    pub enrollment: EnrollmentRecord,
    /// Prompt policy for the variation; `None` never prompts.
    pub policy: Option<PromptPolicy>,
    /// Enrolled during this setup.
    pub newly_enrolled: bool,
}

/// Result of `setup`.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupOutcome {
    /// Enrolled and active.
    Active(Activation),
    /// The study ended during setup, or had already ended.
    Ended(EndOutcome),
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    setup_started: bool,
    config: Option<Arc<StudyConfig>>,
    enrollment: Option<EnrollmentRecord>,
    known_variation: Option<String>,
    expiry_alarm: Option<AlarmId>,
}

/// Owns enrollment and ending for one study in one process.
pub struct StudyLifecycle<E> {
    effects: Arc<E>,
    inner: Mutex<Inner>,
    is_ending: AtomicBool,
}

impl<E: StudyEffects> StudyLifecycle<E> {
    /// Lifecycle in `NotStarted`.
    pub fn new(effects: Arc<E>) -> Self {
        Self {
            effects,
            inner: Mutex::new(Inner {
                state: LifecycleState::NotStarted,
                setup_started: false,
                config: None,
                enrollment: None,
                known_variation: None,
                expiry_alarm: None,
            }),
            is_ending: AtomicBool::new(false),
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state.clone()
    }

    /// Latch value.
    pub fn is_ending(&self) -> bool {
        self.is_ending.load(Ordering::SeqCst)
    }

    /// Config accepted by `setup`.
    pub fn config(&self) -> Option<Arc<StudyConfig>> {
        self.inner.lock().config.clone()
    }

    /// Enrollment in effect once active.
    pub fn enrollment(&self) -> Option<EnrollmentRecord> {
        self.inner.lock().enrollment.clone()
    }

    /// Resolved or persisted variation, if known.
    pub fn variation(&self) -> Option<String> {
        let inner = self.inner.lock();
        match &inner.state {
            LifecycleState::Active { variation } => Some(variation.clone()),
            _ => inner.known_variation.clone(),
        }
    }

    /// Shared effects handle.
    pub fn effects(&self) -> &Arc<E> {
        &self.effects
    }

    /// Validate `config`, check eligibility (first run only) and expiry,
    /// resolve the enrollment and activate.
    ///
    /// A config error is returned before anything is persisted or sent. The
    /// lifecycle enters `Active` at most once per process; a second call
    /// fails unless the study already ended, in which case the recorded
    /// ending is returned.
    pub async fn setup(&self, config: StudyConfig, is_first_run: bool) -> Result<SetupOutcome> {
        config.validate()?;
        let config = Arc::new(config);
        {
            let mut inner = self.inner.lock();
            if let Some(reason) = inner.state.ending_reason() {
                return Ok(SetupOutcome::Ended(EndOutcome {
                    reason: reason.clone(),
                    performed: false,
                }));
            }
            if inner.setup_started {
                return Err(CohortError::internal("setup already ran in this process"));
            }
            inner.setup_started = true;
            inner.config = Some(config.clone());
        }

        let result = self.activate(&config, is_first_run).await;
        if result.is_err() {
            let mut inner = self.inner.lock();
            if inner.state == LifecycleState::NotStarted {
                inner.setup_started = false;
            }
        }
        result
    }

    async fn activate(&self, config: &StudyConfig, is_first_run: bool) -> Result<SetupOutcome> {
        let storage = &*self.effects;
        let now = self.effects.now().await?;
        let stored = StoredEnrollment::load(storage).await.map_err(|e| {
            warn!(error = %e, "Enrollment unreadable, not activating this run");
            CohortError::from(e)
        })?;
        self.inner.lock().known_variation = stored.variation.clone();

        if let Some(reason) = stored.ended_reason.clone() {
            info!(reason = %reason, "Study already ended on this install");
            return Ok(SetupOutcome::Ended(self.restore_ended(reason)));
        }

        if is_first_run && !stored.is_enrolled() {
            let eligible = match self.effects.is_eligible().await {
                Ok(eligible) => eligible,
                Err(e) => {
                    warn!(error = %e, "Eligibility check failed, treating as ineligible");
                    false
                }
            };
            if !eligible {
                info!(study = %config.study_name, "Install is not eligible");
                return Ok(SetupOutcome::Ended(
                    self.end_study(EndingReason::Ineligible).await,
                ));
            }
        }

        let first_run_timestamp = stored
            .first_run_timestamp
            .or(config.testing.first_run_timestamp)
            .unwrap_or(now);
        let expire_at = stored
            .expire_at
            .unwrap_or_else(|| first_run_timestamp.plus_days(config.expire.days));
        if now > expire_at {
            info!(%now, %expire_at, "Study expired");
            return Ok(SetupOutcome::Ended(
                self.end_study(EndingReason::Expired).await,
            ));
        }

        let (variation, client_salt, newly_enrolled) =
            self.resolve_variation(config, &stored).await?;
        let enrollment = EnrollmentRecord {
            client_salt,
            variation: variation.clone(),
            first_run_timestamp,
            expire_at,
        };
        enrollment.persist_missing(storage, &stored).await;
        self.inner.lock().known_variation = Some(variation.clone());

        if newly_enrolled {
            info!(study = %config.study_name, variation = %variation, "Enrolled");
            telemetry::emit(
                storage,
                telemetry::payload(TelemetryEventKind::Enter, Some(config), Some(&variation)),
            )
            .await;
        }

        let policy = PromptPolicy::for_variation(&variation, config);
        if let Some(policy) = &policy {
            PromptState::activate(storage, policy.interval_days).await;
        }
        let alarm = self.schedule_expiry(expire_at).await;

        let activated = {
            let mut inner = self.inner.lock();
            if self.is_ending() {
                false
            } else {
                inner.state = LifecycleState::Active {
                    variation: variation.clone(),
                };
                inner.enrollment = Some(enrollment.clone());
                inner.expiry_alarm = alarm;
                true
            }
        };

        if !activated {
            // An ending started while activating; undo what it could not see.
            if let Some(id) = alarm {
                self.effects.cancel_alarm(id).await;
            }
            PromptState::disable(storage).await;
            let reason = self
                .state()
                .ending_reason()
                .cloned()
                .unwrap_or(EndingReason::UserDisable);
            return Ok(SetupOutcome::Ended(EndOutcome {
                reason,
                performed: false,
            }));
        }

        info!(
            variation = %variation,
            %expire_at,
            prompting = policy.is_some(),
            "Study active"
        );
        Ok(SetupOutcome::Active(Activation {
            enrollment,
            policy,
            newly_enrolled,
        }))
    }

    /// Adopt an ending recorded by an earlier process. No side effects run.
    fn restore_ended(&self, reason: EndingReason) -> EndOutcome {
        let mut inner = self.inner.lock();
        if !self.is_ending.swap(true, Ordering::SeqCst) {
            inner.state = LifecycleState::Ended {
                reason: reason.clone(),
            };
        }
        EndOutcome {
            reason: inner.state.ending_reason().cloned().unwrap_or(reason),
            performed: false,
        }
    }

    async fn resolve_variation(
        &self,
        config: &StudyConfig,
        stored: &StoredEnrollment,
    ) -> Result<(String, String, bool)> {
        let salt = match &stored.client_salt {
            Some(salt) => salt.clone(),
            None => bucketing_salt(&config.study_name, &self.effects.client_id().await?),
        };

        if let Some(variation) = &stored.variation {
            if let Some(forced) = config.forced_variation() {
                if forced != variation {
                    warn!(
                        persisted = %variation,
                        forced,
                        "Install already enrolled, forced variation ignored"
                    );
                }
            }
            if !config
                .weighted_variations
                .iter()
                .any(|v| &v.name == variation)
            {
                warn!(variation = %variation, "Persisted variation is not in the current config");
            }
            return Ok((variation.clone(), salt, false));
        }

        let variation = assign(&salt, &config.weighted_variations, config.forced_variation())?;
        debug!(salt = %salt, variation = %variation, "Assigned variation");
        Ok((variation, salt, true))
    }

    async fn schedule_expiry(&self, expire_at: Timestamp) -> Option<AlarmId> {
        match self.effects.schedule_alarm(EXPIRY_ALARM, expire_at).await {
            Ok(id) => {
                debug!(alarm_id = %id, %expire_at, "Expiry alarm scheduled");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "Expiry alarm not scheduled; expiry is still checked at setup");
                None
            }
        }
    }

    /// End the study. Only the first call in a process runs the side
    /// effects; later calls return the recorded reason.
    ///
    /// Cleanup runs regardless of telemetry or navigation failures.
    pub async fn end_study(&self, reason: EndingReason) -> EndOutcome {
        let (config, variation, alarm) = {
            let mut inner = self.inner.lock();
            if self.is_ending.swap(true, Ordering::SeqCst) {
                let recorded = inner
                    .state
                    .ending_reason()
                    .cloned()
                    .unwrap_or_else(|| reason.clone());
                debug!(requested = %reason, recorded = %recorded, "Study already ending");
                return EndOutcome {
                    reason: recorded,
                    performed: false,
                };
            }
            let variation = match &inner.state {
                LifecycleState::Active { variation } => Some(variation.clone()),
                _ => inner.known_variation.clone(),
            };
            inner.state = LifecycleState::Ending {
                reason: reason.clone(),
            };
            (inner.config.clone(), variation, inner.expiry_alarm.take())
        };
        info!(reason = %reason, "Study ending");
        write_with_retry(&*self.effects, keys::ENDED_REASON, &reason).await;

        if let Some(id) = alarm {
            if !self.effects.cancel_alarm(id).await {
                debug!(alarm_id = %id, "Expiry alarm already gone");
            }
        }

        telemetry::emit(
            &*self.effects,
            telemetry::payload(TelemetryEventKind::Exit, config.as_deref(), variation.as_deref())
                .with_field("reason", reason.as_str()),
        )
        .await;

        if let Some(url) = config
            .as_deref()
            .and_then(|c| c.ending_url(&reason, variation.as_deref()))
        {
            if let Err(e) = self.effects.open_url(&url).await {
                warn!(url = %url, error = %e, "Failed to open ending URL");
            }
        }

        if let Err(e) = self.effects.dismiss_prompt().await {
            warn!(error = %e, "Failed to dismiss prompt during ending");
        }
        PromptState::clear(&*self.effects).await;

        self.inner.lock().state = LifecycleState::Ended {
            reason: reason.clone(),
        };
        info!(reason = %reason, "Study ended");
        EndOutcome {
            reason,
            performed: true,
        }
    }
}

impl<E> std::fmt::Debug for StudyLifecycle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyLifecycle")
            .field("inner", &*self.inner.lock())
            .field("is_ending", &self.is_ending.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use cohort_core::effects::TelemetryEventKind;
    use cohort_testkit::{two_arm_config, MockEffects, CLIENT_SHORT, T0};

    fn lifecycle() -> (Arc<MockEffects>, StudyLifecycle<MockEffects>) {
        let effects = Arc::new(MockEffects::new().with_client_id(CLIENT_SHORT));
        effects.set_now(T0);
        let lifecycle = StudyLifecycle::new(effects.clone());
        (effects, lifecycle)
    }

    #[tokio::test]
    async fn first_setup_enrolls_and_activates() {
        let (effects, lifecycle) = lifecycle();
        let outcome = lifecycle.setup(two_arm_config(), true).await.unwrap();

        let activation = assert_matches!(outcome, SetupOutcome::Active(a) => a);
        assert!(activation.newly_enrolled);
        assert_eq!(activation.enrollment.variation, "short");
        assert_eq!(activation.enrollment.expire_at, T0.plus_days(14));
        assert_eq!(activation.policy.map(|p| p.interval_days), Some(1));
        assert_eq!(
            lifecycle.state(),
            LifecycleState::Active {
                variation: "short".to_string()
            }
        );
        assert_eq!(effects.telemetry_of(TelemetryEventKind::Enter).len(), 1);
        assert_eq!(effects.pending_alarms().len(), 1);
    }

    #[tokio::test]
    async fn second_setup_in_one_process_is_rejected() {
        let (_effects, lifecycle) = lifecycle();
        lifecycle.setup(two_arm_config(), true).await.unwrap();
        assert_matches!(
            lifecycle.setup(two_arm_config(), false).await,
            Err(CohortError::Internal { .. })
        );
    }

    #[tokio::test]
    async fn end_before_setup_still_latches() {
        let (effects, lifecycle) = lifecycle();
        let first = lifecycle.end_study(EndingReason::UserDisable).await;
        assert!(first.performed);

        let setup = lifecycle.setup(two_arm_config(), true).await.unwrap();
        assert_matches!(
            setup,
            SetupOutcome::Ended(EndOutcome { reason: EndingReason::UserDisable, performed: false })
        );
        assert_eq!(effects.eligibility_calls(), 0);
    }

    #[tokio::test]
    async fn missing_client_id_fails_setup_and_allows_retry() {
        let (effects, lifecycle) = lifecycle();
        effects.clear_client_id();
        assert_matches!(
            lifecycle.setup(two_arm_config(), true).await,
            Err(CohortError::Telemetry { .. })
        );
        assert_eq!(lifecycle.state(), LifecycleState::NotStarted);
        assert!(effects.storage_keys().is_empty());

        effects.set_client_id(CLIENT_SHORT);
        let outcome = lifecycle.setup(two_arm_config(), true).await.unwrap();
        assert_matches!(outcome, SetupOutcome::Active(_));
    }
}
