//! Study configs and constants with known bucketing outcomes.
//!
//! Client ids are paired with the arm they land in for the study name
//! [`STUDY_NAME`]; the fractions come from the SHA-256 of
//! `"cloud-storage-prompts" + client_id`.

use cohort_core::{ProviderCandidate, StudyConfig, Timestamp, VariationDefinition};

/// Study name every fixture uses.
pub const STUDY_NAME: &str = "cloud-storage-prompts";

/// Fixed enrollment time: 2023-11-14 22:13:20 UTC.
pub const T0: Timestamp = Timestamp::from_secs(1_700_000_000);

/// One hour in seconds.
pub const HOUR: u64 = 3_600;

/// Fraction 0.3949: `control` in [`two_arm_config`], `notification-interval-longer`
/// in [`three_arm_config`].
pub const CLIENT_CONTROL: &str = "client-0001";

/// Fraction 0.7728: `short` in [`two_arm_config`], `control` in
/// [`three_arm_config`].
pub const CLIENT_SHORT: &str = "client-0002";

/// Fraction 0.1506: `notification-interval-short` in [`three_arm_config`].
pub const CLIENT_INTERVAL_SHORT: &str = "client-0005";

/// `control:1, short:1`, 14 day expiry, telemetry logged not sent.
pub fn two_arm_config() -> StudyConfig {
    let mut config = StudyConfig::new(
        STUDY_NAME,
        vec![
            VariationDefinition::new("control", 1.0),
            VariationDefinition::new("short", 1.0),
        ],
        14,
    );
    config.telemetry.send = false;
    config
}

/// The three notification-interval arms with their shipped weights, plus
/// ending survey URLs.
pub fn three_arm_config() -> StudyConfig {
    let mut config = StudyConfig::new(
        STUDY_NAME,
        vec![
            VariationDefinition::new("notification-interval-short", 1.5),
            VariationDefinition::new("notification-interval-longer", 1.5),
            VariationDefinition::new("control", 1.0),
        ],
        14,
    )
    .with_ending(
        "user-disable",
        Some("https://survey.example/exit?reason={reason}&arm={variation}"),
    )
    .with_ending("expired", Some("https://survey.example/exit?reason={reason}"))
    .with_ending("ineligible", None);
    config.telemetry.send = false;
    config
}

/// A config pinned to one variation regardless of client id.
pub fn fixed_config(variation: &str) -> StudyConfig {
    let mut config = StudyConfig::new(
        STUDY_NAME,
        vec![
            VariationDefinition::new("control", 1.0),
            VariationDefinition::new("short", 1.0),
            VariationDefinition::new("prompt_persistent", 1.0),
            VariationDefinition::new("prompt_not_persistent", 1.0),
            VariationDefinition::new("prompt_transient_with_interval", 1.0),
        ],
        14,
    )
    .with_fixed_variation(variation);
    config.telemetry.send = false;
    config
}

/// A single detected provider.
pub fn one_candidate() -> Vec<ProviderCandidate> {
    vec![ProviderCandidate::new("Dropbox", "Dropbox")]
}

/// Two detected providers.
pub fn two_candidates() -> Vec<ProviderCandidate> {
    vec![
        ProviderCandidate::new("Dropbox", "Dropbox"),
        ProviderCandidate::new("GDrive", "Google Drive"),
    ]
}
