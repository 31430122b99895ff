//! Setup paths: enrollment, reuse, eligibility, expiry and config errors.

use assert_matches::assert_matches;
use cohort_core::effects::TelemetryEventKind;
use cohort_core::{CohortError, EndingReason, StudyConfig};
use cohort_study::{
    EndOutcome, LifecycleState, PromptDecision, SetupOutcome, Study, StudyApi, SuppressReason,
};
use cohort_testkit::{
    fixed_config, one_candidate, two_arm_config, MockEffects, CLIENT_CONTROL, CLIENT_SHORT,
    STUDY_NAME, T0,
};
use std::sync::Arc;

fn study(effects: &Arc<MockEffects>) -> Study<MockEffects> {
    Study::new(effects.clone())
}

fn fresh(client: &str) -> Arc<MockEffects> {
    let effects = Arc::new(MockEffects::new().with_client_id(client));
    effects.set_now(T0);
    effects
}

#[tokio::test]
async fn first_run_persists_the_enrollment() {
    let effects = fresh(CLIENT_SHORT);
    let outcome = study(&effects).setup(two_arm_config(), true).await.unwrap();

    let activation = assert_matches!(outcome, SetupOutcome::Active(a) => a);
    assert!(activation.newly_enrolled);
    assert_eq!(effects.stored("study.variation"), Some(br#""short""#.to_vec()));
    assert_eq!(
        effects.stored("study.clientSalt"),
        Some(format!("\"{STUDY_NAME}{CLIENT_SHORT}\"").into_bytes())
    );
    assert_eq!(
        effects.stored("study.firstRunTimestamp"),
        Some(T0.as_secs().to_string().into_bytes())
    );
    assert_eq!(
        effects.stored("study.expireAt"),
        Some(T0.plus_days(14).as_secs().to_string().into_bytes())
    );
    assert_eq!(effects.stored("study.apiEnabled"), Some(b"true".to_vec()));
    assert_eq!(effects.stored("study.intervalPromptDays"), Some(b"1".to_vec()));
    assert_eq!(effects.eligibility_calls(), 1);

    let enter = effects.telemetry_of(TelemetryEventKind::Enter);
    assert_eq!(enter.len(), 1);
    assert_eq!(enter[0].field("variation"), Some("short"));
}

#[tokio::test]
async fn restart_reuses_the_persisted_variation() {
    let effects = fresh(CLIENT_SHORT);
    study(&effects).setup(two_arm_config(), true).await.unwrap();

    // Even a different client id cannot move an enrolled install.
    let restarted = Arc::new(effects.restarted());
    restarted.set_client_id(CLIENT_CONTROL);
    restarted.set_now(T0.plus_days(3));
    let outcome = study(&restarted)
        .setup(two_arm_config(), false)
        .await
        .unwrap();

    let activation = assert_matches!(outcome, SetupOutcome::Active(a) => a);
    assert!(!activation.newly_enrolled);
    assert_eq!(activation.enrollment.variation, "short");
    assert_eq!(activation.enrollment.first_run_timestamp, T0);
    assert_eq!(restarted.eligibility_calls(), 0);
    assert!(restarted.telemetry_of(TelemetryEventKind::Enter).is_empty());
}

#[tokio::test]
async fn forced_variation_does_not_override_an_enrollment() {
    let effects = fresh(CLIENT_SHORT);
    study(&effects).setup(two_arm_config(), true).await.unwrap();

    let restarted = Arc::new(effects.restarted());
    let config = two_arm_config().with_fixed_variation("control");
    let outcome = study(&restarted).setup(config, false).await.unwrap();
    let activation = assert_matches!(outcome, SetupOutcome::Active(a) => a);
    assert_eq!(activation.enrollment.variation, "short");
}

#[tokio::test]
async fn not_first_run_without_record_enrolls_without_eligibility() {
    let effects = fresh(CLIENT_SHORT);
    effects.set_eligible(false);
    let outcome = study(&effects).setup(two_arm_config(), false).await.unwrap();

    let activation = assert_matches!(outcome, SetupOutcome::Active(a) => a);
    assert!(activation.newly_enrolled);
    assert_eq!(effects.eligibility_calls(), 0);
}

#[tokio::test]
async fn ineligible_first_run_ends_without_enrolling() {
    let effects = fresh(CLIENT_SHORT);
    effects.set_eligible(false);
    let study = study(&effects);
    let outcome = study.setup(two_arm_config(), true).await.unwrap();

    assert_eq!(
        outcome,
        SetupOutcome::Ended(EndOutcome {
            reason: EndingReason::Ineligible,
            performed: true
        })
    );
    assert_eq!(effects.stored("study.variation"), None);
    assert_eq!(effects.stored("study.apiEnabled"), Some(b"false".to_vec()));
    assert!(effects.pending_alarms().is_empty());
    assert_eq!(effects.telemetry_of(TelemetryEventKind::Exit).len(), 1);
}

#[tokio::test]
async fn eligibility_error_counts_as_ineligible() {
    let effects = fresh(CLIENT_SHORT);
    effects.fail_eligibility("profile locked");
    let outcome = study(&effects).setup(two_arm_config(), true).await.unwrap();
    assert_matches!(
        outcome,
        SetupOutcome::Ended(EndOutcome {
            reason: EndingReason::Ineligible,
            ..
        })
    );
}

#[tokio::test]
async fn expired_enrollment_ends_on_setup() {
    let effects = fresh(CLIENT_SHORT);
    study(&effects).setup(two_arm_config(), true).await.unwrap();

    let restarted = Arc::new(effects.restarted());
    restarted.set_now(T0.plus_days(14).plus_secs(1));
    let study = study(&restarted);
    let outcome = study.setup(two_arm_config(), false).await.unwrap();

    assert_eq!(
        outcome,
        SetupOutcome::Ended(EndOutcome {
            reason: EndingReason::Expired,
            performed: true
        })
    );
    assert!(restarted.pending_alarms().is_empty());
    assert_eq!(restarted.stored("study.apiEnabled"), Some(b"false".to_vec()));
    let exit = &restarted.telemetry_of(TelemetryEventKind::Exit)[0];
    assert_eq!(exit.field("variation"), Some("short"));
    assert_eq!(exit.field("reason"), Some("expired"));
}

#[tokio::test]
async fn exactly_at_expiry_is_still_active() {
    let effects = fresh(CLIENT_SHORT);
    study(&effects).setup(two_arm_config(), true).await.unwrap();

    let restarted = Arc::new(effects.restarted());
    restarted.set_now(T0.plus_days(14));
    let outcome = study(&restarted)
        .setup(two_arm_config(), false)
        .await
        .unwrap();
    assert_matches!(outcome, SetupOutcome::Active(_));
}

#[tokio::test]
async fn backdated_first_run_expires_before_prompting() {
    let effects = fresh(CLIENT_SHORT);
    effects.set_now(T0.plus_days(30));
    let mut config = two_arm_config();
    config.testing.first_run_timestamp = Some(T0);

    let study = study(&effects);
    let outcome = study.setup(config, true).await.unwrap();

    assert_matches!(
        outcome,
        SetupOutcome::Ended(EndOutcome {
            reason: EndingReason::Expired,
            ..
        })
    );
    assert_eq!(effects.stored("study.variation"), None);
    assert_ne!(effects.stored("study.apiEnabled"), Some(b"true".to_vec()));
    assert_eq!(study.policy(), None);
}

#[tokio::test]
async fn config_error_touches_nothing() {
    let effects = fresh(CLIENT_SHORT);
    let study = study(&effects);
    let empty = StudyConfig::new(STUDY_NAME, Vec::new(), 14);

    assert_matches!(
        study.setup(empty, true).await,
        Err(CohortError::Config { .. })
    );
    assert_eq!(study.state(), LifecycleState::NotStarted);
    assert!(effects.storage_keys().is_empty());
    assert!(effects.telemetry().is_empty());
    assert!(effects.pending_alarms().is_empty());
    assert_eq!(effects.dismissals(), 0);
    assert_eq!(effects.eligibility_calls(), 0);
}

#[tokio::test]
async fn fixed_variation_bypasses_bucketing() {
    let effects = fresh(CLIENT_SHORT);
    let study = study(&effects);
    let outcome = study
        .setup(fixed_config("prompt_transient_with_interval"), true)
        .await
        .unwrap();

    let activation = assert_matches!(outcome, SetupOutcome::Active(a) => a);
    assert_eq!(activation.enrollment.variation, "prompt_transient_with_interval");
    let policy = study.policy().unwrap();
    assert_eq!(policy.transient_millis, Some(10_000));
    assert_eq!(policy.interval_days, 1);
}

#[tokio::test]
async fn testing_override_from_environment_forces_control() {
    let effects = fresh(CLIENT_SHORT);
    let mut config = two_arm_config();
    config
        .merge_with_vars([("COHORT_VARIATION".to_string(), "control".to_string())])
        .unwrap();

    let study = study(&effects);
    let outcome = study.setup(config, true).await.unwrap();
    let activation = assert_matches!(outcome, SetupOutcome::Active(a) => a);
    assert_eq!(activation.enrollment.variation, "control");
    assert_eq!(activation.policy, None);
    assert_eq!(effects.stored("study.apiEnabled"), None);
}

#[tokio::test]
async fn persisted_write_failure_does_not_abort_setup() {
    let effects = fresh(CLIENT_SHORT);
    effects.fail_writes(cohort_testkit::WriteFailure::Always);
    let study = study(&effects);
    let outcome = study.setup(two_arm_config(), true).await.unwrap();
    assert_matches!(outcome, SetupOutcome::Active(_));
    assert!(effects.storage_keys().is_empty());
}

#[tokio::test]
async fn ended_study_stays_ended_after_restart() {
    let effects = fresh(CLIENT_SHORT);
    let first = study(&effects);
    first.setup(two_arm_config(), true).await.unwrap();
    first.end_study(EndingReason::UserDisable).await;
    assert_eq!(
        effects.stored("study.endedReason"),
        Some(br#""user-disable""#.to_vec())
    );

    let restarted = Arc::new(effects.restarted());
    restarted.set_now(T0.plus_days(1));
    let study = study(&restarted);
    let outcome = study.setup(two_arm_config(), false).await.unwrap();

    assert_eq!(
        outcome,
        SetupOutcome::Ended(EndOutcome {
            reason: EndingReason::UserDisable,
            performed: false
        })
    );
    assert_eq!(
        study.state(),
        LifecycleState::Ended {
            reason: EndingReason::UserDisable
        }
    );
    assert_eq!(restarted.stored("study.apiEnabled"), Some(b"false".to_vec()));
    assert!(restarted.pending_alarms().is_empty());
    assert!(restarted.telemetry().is_empty());
    assert_eq!(study.policy(), None);
    assert_eq!(
        study.decide(one_candidate()).await.unwrap(),
        PromptDecision::Suppress(SuppressReason::NotActive)
    );

    // The restored ending latches like a live one
    let again = study.end_study(EndingReason::Expired).await;
    assert!(!again.performed);
    assert_eq!(again.reason, EndingReason::UserDisable);
    assert!(restarted.telemetry_of(TelemetryEventKind::Exit).is_empty());
}

#[tokio::test]
async fn ineligible_install_stays_ended_after_restart() {
    let effects = fresh(CLIENT_SHORT);
    effects.set_eligible(false);
    study(&effects).setup(two_arm_config(), true).await.unwrap();

    let restarted = Arc::new(effects.restarted());
    restarted.set_eligible(true);
    let outcome = study(&restarted)
        .setup(two_arm_config(), false)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        SetupOutcome::Ended(EndOutcome {
            reason: EndingReason::Ineligible,
            performed: false
        })
    );
    assert_eq!(restarted.stored("study.variation"), None);
    assert_eq!(restarted.stored("study.apiEnabled"), Some(b"false".to_vec()));
    assert!(restarted.telemetry_of(TelemetryEventKind::Enter).is_empty());
    assert_eq!(restarted.eligibility_calls(), 0);
}

#[tokio::test]
async fn unreadable_enrollment_is_never_overwritten() {
    let effects = fresh(CLIENT_SHORT);
    study(&effects).setup(fixed_config("short"), true).await.unwrap();

    let restarted = Arc::new(effects.restarted());
    restarted.fail_reads(true);
    let study = study(&restarted);
    assert_matches!(
        study.setup(fixed_config("prompt_persistent"), false).await,
        Err(CohortError::Persistence { .. })
    );

    assert_eq!(study.state(), LifecycleState::NotStarted);
    assert_eq!(restarted.stored("study.variation"), Some(br#""short""#.to_vec()));
    assert_eq!(
        restarted.stored("study.firstRunTimestamp"),
        Some(T0.as_secs().to_string().into_bytes())
    );
    assert!(restarted.telemetry().is_empty());
    assert_eq!(restarted.eligibility_calls(), 0);
    assert!(restarted.pending_alarms().is_empty());

    // Storage recovers; the same process can retry and keeps the enrollment
    restarted.fail_reads(false);
    let outcome = study
        .setup(fixed_config("prompt_persistent"), false)
        .await
        .unwrap();
    let activation = assert_matches!(outcome, SetupOutcome::Active(a) => a);
    assert_eq!(activation.enrollment.variation, "short");
    assert!(!activation.newly_enrolled);
}
