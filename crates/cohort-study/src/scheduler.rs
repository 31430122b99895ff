//! Prompt scheduler: per-trigger show/suppress decisions and outcome
//! persistence.

use crate::lifecycle::LifecycleState;
use crate::persist::write_with_retry;
use crate::policy::PromptPolicy;
use crate::prompt_state::PromptState;
use cohort_core::effects::StorageEffects;
use cohort_core::{keys, PromptMode, PromptOutcome, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why a trigger did not produce a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum SuppressReason {
    /// Lifecycle is not `Active`, or an ending is in progress.
    NotActive,
    /// The variation has no prompt policy.
    NotConfigured,
    /// `apiEnabled` is false.
    ApiDisabled,
    /// The user already opted in.
    OptedIn,
    /// Still inside the interval after the last dismissal.
    IntervalNotElapsed {
        /// Seconds until the gate opens.
        remaining_secs: u64,
    },
    /// The trigger offered no provider.
    NoCandidates,
}

/// Scheduler answer for one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "kebab-case")]
pub enum PromptDecision {
    /// Show the prompt in this mode.
    Show(PromptMode),
    /// Do not show.
    Suppress(SuppressReason),
}

impl PromptDecision {
    /// True for `Show`.
    pub fn is_show(&self) -> bool {
        matches!(self, Self::Show(_))
    }
}

/// Holds the active policy and applies the gating rules.
#[derive(Debug, Clone, Default)]
pub struct PromptScheduler {
    policy: Option<PromptPolicy>,
}

impl PromptScheduler {
    /// Unconfigured scheduler; suppresses everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the active policy.
    pub fn configure(&mut self, policy: PromptPolicy) {
        debug!(?policy, "Prompt scheduler configured");
        self.policy = Some(policy);
    }

    /// Active policy.
    pub fn policy(&self) -> Option<&PromptPolicy> {
        self.policy.as_ref()
    }

    /// Decide whether a trigger at `now` shows a prompt.
    pub fn decide(
        &self,
        now: Timestamp,
        state: &PromptState,
        lifecycle: &LifecycleState,
    ) -> PromptDecision {
        let decision = self.evaluate(now, state, lifecycle);
        debug!(%now, ?decision, "Prompt decision");
        decision
    }

    fn evaluate(
        &self,
        now: Timestamp,
        state: &PromptState,
        lifecycle: &LifecycleState,
    ) -> PromptDecision {
        if !lifecycle.is_active() {
            return PromptDecision::Suppress(SuppressReason::NotActive);
        }
        let Some(policy) = &self.policy else {
            return PromptDecision::Suppress(SuppressReason::NotConfigured);
        };
        if !state.api_enabled {
            return PromptDecision::Suppress(SuppressReason::ApiDisabled);
        }
        if state.opted_in_provider_key.is_some() {
            return PromptDecision::Suppress(SuppressReason::OptedIn);
        }
        if let Some(last) = state.last_prompt_timestamp {
            let interval = policy.interval_secs();
            let elapsed = now.secs_since(last);
            if elapsed < interval {
                return PromptDecision::Suppress(SuppressReason::IntervalNotElapsed {
                    remaining_secs: interval - elapsed,
                });
            }
        }
        PromptDecision::Show(policy.mode())
    }

    /// Persist the result of a shown prompt and return the updated state.
    ///
    /// A dismissal moves `lastPromptTimestamp` forward, never back. An
    /// acceptance records the provider and leaves the timestamp alone.
    pub async fn record_outcome<S: StorageEffects + ?Sized>(
        &self,
        storage: &S,
        now: Timestamp,
        outcome: &PromptOutcome,
        previous: &PromptState,
    ) -> PromptState {
        let mut next = previous.clone();
        match outcome {
            PromptOutcome::Dismissed { cause } => {
                let at = previous.last_prompt_timestamp.map_or(now, |last| last.max(now));
                debug!(cause = cause.as_str(), %at, "Recording dismissal");
                write_with_retry(storage, keys::LAST_PROMPT_TIMESTAMP, &at).await;
                next.last_prompt_timestamp = Some(at);
            }
            PromptOutcome::Accepted { provider_key } => {
                debug!(provider = %provider_key, "Recording opt-in");
                write_with_retry(storage, keys::OPTED_IN_PROVIDER_KEY, provider_key).await;
                next.opted_in_provider_key = Some(provider_key.clone());
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use cohort_core::{DismissCause, StudyConfig, VariationDefinition};
    use cohort_testkit::{MockEffects, HOUR, T0};
    use proptest::prelude::*;

    fn active() -> LifecycleState {
        LifecycleState::Active {
            variation: "short".to_string(),
        }
    }

    fn scheduler(variation: &str) -> PromptScheduler {
        let config = StudyConfig::new("s", vec![VariationDefinition::new("a", 1.0)], 14);
        let mut scheduler = PromptScheduler::new();
        scheduler.configure(PromptPolicy::for_variation(variation, &config).unwrap());
        scheduler
    }

    fn enabled() -> PromptState {
        PromptState {
            api_enabled: true,
            ..PromptState::default()
        }
    }

    #[test]
    fn never_prompted_shows() {
        let decision = scheduler("short").decide(T0, &enabled(), &active());
        assert_eq!(
            decision,
            PromptDecision::Show(PromptMode {
                persistent: true,
                transient_millis: None,
                close_button_visible: true,
            })
        );
    }

    #[test]
    fn interval_gate_at_12h_and_25h() {
        let scheduler = scheduler("short");
        let now = T0.plus_secs(100 * HOUR);

        let recent = PromptState {
            last_prompt_timestamp: Some(Timestamp::from_secs(now.as_secs() - 12 * HOUR)),
            ..enabled()
        };
        assert_eq!(
            scheduler.decide(now, &recent, &active()),
            PromptDecision::Suppress(SuppressReason::IntervalNotElapsed {
                remaining_secs: 12 * HOUR
            })
        );

        let older = PromptState {
            last_prompt_timestamp: Some(Timestamp::from_secs(now.as_secs() - 25 * HOUR)),
            ..enabled()
        };
        assert!(scheduler.decide(now, &older, &active()).is_show());
    }

    #[test]
    fn zero_interval_never_gates() {
        let scheduler = scheduler("prompt_persistent");
        let state = PromptState {
            last_prompt_timestamp: Some(T0),
            ..enabled()
        };
        assert!(scheduler.decide(T0, &state, &active()).is_show());
    }

    #[test]
    fn suppression_order() {
        let scheduler = scheduler("short");
        let opted = PromptState {
            opted_in_provider_key: Some("Dropbox".to_string()),
            ..PromptState::default()
        };
        assert_eq!(
            scheduler.decide(T0, &opted, &LifecycleState::NotStarted),
            PromptDecision::Suppress(SuppressReason::NotActive)
        );
        assert_eq!(
            PromptScheduler::new().decide(T0, &enabled(), &active()),
            PromptDecision::Suppress(SuppressReason::NotConfigured)
        );
        assert_eq!(
            scheduler.decide(T0, &opted, &active()),
            PromptDecision::Suppress(SuppressReason::ApiDisabled)
        );
        let opted_enabled = PromptState {
            api_enabled: true,
            ..opted
        };
        assert_eq!(
            scheduler.decide(T0.plus_days(365), &opted_enabled, &active()),
            PromptDecision::Suppress(SuppressReason::OptedIn)
        );
    }

    #[tokio::test]
    async fn acceptance_leaves_timestamp_alone() {
        let effects = MockEffects::new();
        let previous = PromptState {
            last_prompt_timestamp: Some(T0),
            ..enabled()
        };
        let next = scheduler("short")
            .record_outcome(
                &effects,
                T0.plus_secs(HOUR),
                &PromptOutcome::Accepted {
                    provider_key: "Dropbox".to_string(),
                },
                &previous,
            )
            .await;
        assert_eq!(next.last_prompt_timestamp, Some(T0));
        assert_eq!(next.opted_in_provider_key.as_deref(), Some("Dropbox"));
        assert_eq!(effects.stored("study.lastPromptTimestamp"), None);
        assert_eq!(
            effects.stored("study.optedInProviderKey"),
            Some(br#""Dropbox""#.to_vec())
        );
    }

    #[tokio::test]
    async fn dismissal_never_moves_timestamp_back() {
        let effects = MockEffects::new();
        let previous = PromptState {
            last_prompt_timestamp: Some(T0.plus_secs(HOUR)),
            ..enabled()
        };
        let next = scheduler("short")
            .record_outcome(
                &effects,
                T0,
                &PromptOutcome::Dismissed {
                    cause: DismissCause::Closed,
                },
                &previous,
            )
            .await;
        assert_matches!(next.last_prompt_timestamp, Some(t) if t == T0.plus_secs(HOUR));
    }

    proptest! {
        #[test]
        fn last_prompt_timestamp_is_monotonic(times in proptest::collection::vec(0u64..10_000_000, 1..20)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let effects = MockEffects::new();
            let scheduler = scheduler("short");
            let mut state = enabled();
            let mut high = 0u64;
            for t in times {
                state = runtime.block_on(scheduler.record_outcome(
                    &effects,
                    Timestamp::from_secs(t),
                    &PromptOutcome::Dismissed { cause: DismissCause::TimedOut },
                    &state,
                ));
                high = high.max(t);
                prop_assert_eq!(state.last_prompt_timestamp, Some(Timestamp::from_secs(high)));
            }
        }
    }
}
