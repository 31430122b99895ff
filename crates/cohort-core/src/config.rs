//! Study configuration
//!
//! Loaded once at setup and immutable afterwards. The JSON shape is camelCase
//! to match the study setup documents the host ships:
//!
//! ```json
//! {
//!   "studyName": "cloud-storage-prompts",
//!   "weightedVariations": [{ "name": "control", "weight": 1 }],
//!   "endings": { "user-disable": { "baseUrl": "https://example.com/survey?r={reason}" } },
//!   "expire": { "days": 14 }
//! }
//! ```

use crate::ending::EndingReason;
use crate::errors::{CohortError, Result};
use crate::time::Timestamp;
use crate::variation::{validate_weights, VariationDefinition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Environment variable forcing the testing variation.
pub const ENV_VARIATION: &str = "COHORT_VARIATION";
/// Environment variable forcing the testing first-run timestamp.
pub const ENV_FIRST_RUN_TIMESTAMP: &str = "COHORT_FIRST_RUN_TIMESTAMP";

/// Complete study setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyConfig {
    /// Study identifier; also the bucketing salt prefix.
    pub study_name: String,
    /// Arms and sampling weights, in selection order.
    pub weighted_variations: Vec<VariationDefinition>,
    /// Ending reason name to optional survey URL.
    #[serde(default)]
    pub endings: BTreeMap<String, EndingConfig>,
    /// Maximum study duration from first run.
    pub expire: ExpireConfig,
    /// Force every install into this variation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_variation: Option<String>,
    /// Telemetry transport switches.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Day counts for the `notification-interval-*` arms.
    #[serde(default)]
    pub interval: IntervalConfig,
    /// Settings for the `prompt_*` arms.
    #[serde(default)]
    pub prompt: PromptConfig,
    /// Testing overrides.
    #[serde(default)]
    pub testing: TestingOverrides,
}

/// Optional survey page opened when the study ends for a reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndingConfig {
    /// URL template; `{reason}`, `{study}` and `{variation}` are substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Study expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpireConfig {
    /// Days from first run until the study expires.
    pub days: u32,
}

/// Telemetry switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryConfig {
    /// Actually transmit pings.
    #[serde(default = "default_true")]
    pub send: bool,
    /// Drop the `testing` marker from pings (release builds).
    #[serde(default)]
    pub remove_testing_flag: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            send: true,
            remove_testing_flag: false,
        }
    }
}

/// Interval lengths used by the notification-interval arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalConfig {
    /// Days between prompts for the short arm.
    #[serde(default = "default_short_duration")]
    pub short_duration: u32,
    /// Days between prompts for the longer arm.
    #[serde(default = "default_long_duration")]
    pub long_duration: u32,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            short_duration: default_short_duration(),
            long_duration: default_long_duration(),
        }
    }
}

/// Settings shared by the prompt_* arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptConfig {
    /// Days between prompts for the `*_with_interval` arms.
    #[serde(default = "default_prompt_interval_days")]
    pub interval_days: u32,
    /// Auto-dismiss delay for the transient arms.
    #[serde(default = "default_transient_millis")]
    pub transient_millis: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            interval_days: default_prompt_interval_days(),
            transient_millis: default_transient_millis(),
        }
    }
}

/// Overrides used in manual and automated testing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestingOverrides {
    /// Behaves like `fixedVariation`, and wins over it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    /// Enrollment timestamp used instead of "now" for a new enrollment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_run_timestamp: Option<Timestamp>,
}

fn default_true() -> bool {
    true
}

fn default_short_duration() -> u32 {
    1
}

fn default_long_duration() -> u32 {
    2
}

fn default_prompt_interval_days() -> u32 {
    1
}

fn default_transient_millis() -> u64 {
    10_000
}

impl StudyConfig {
    /// Minimal config with default ambient sections.
    pub fn new(
        study_name: impl Into<String>,
        weighted_variations: Vec<VariationDefinition>,
        expire_days: u32,
    ) -> Self {
        Self {
            study_name: study_name.into(),
            weighted_variations,
            endings: BTreeMap::new(),
            expire: ExpireConfig { days: expire_days },
            fixed_variation: None,
            telemetry: TelemetryConfig::default(),
            interval: IntervalConfig::default(),
            prompt: PromptConfig::default(),
            testing: TestingOverrides::default(),
        }
    }

    /// Builder: add an ending URL for `reason`.
    pub fn with_ending(mut self, reason: impl Into<String>, base_url: Option<&str>) -> Self {
        self.endings.insert(
            reason.into(),
            EndingConfig {
                base_url: base_url.map(str::to_string),
            },
        );
        self
    }

    /// Builder: force a fixed variation.
    pub fn with_fixed_variation(mut self, name: impl Into<String>) -> Self {
        self.fixed_variation = Some(name.into());
        self
    }

    /// Parse and validate a JSON study setup.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StudyConfig = serde_json::from_str(json)
            .map_err(|e| CohortError::config(format!("invalid study config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load, validate and return a JSON study setup from disk.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CohortError::config(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Apply `COHORT_*` environment overrides.
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from an explicit variable list.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                ENV_VARIATION if !value.is_empty() => {
                    self.testing.variation = Some(value);
                }
                ENV_FIRST_RUN_TIMESTAMP if !value.is_empty() => {
                    let secs: u64 = value.parse().map_err(|_| {
                        CohortError::config(format!(
                            "{ENV_FIRST_RUN_TIMESTAMP} must be epoch seconds, got '{value}'"
                        ))
                    })?;
                    self.testing.first_run_timestamp = Some(Timestamp::from_secs(secs));
                }
                _ => {}
            }
        }
        self.validate()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.study_name.trim().is_empty() {
            return Err(CohortError::config("studyName must not be empty"));
        }
        validate_weights(&self.weighted_variations)?;

        let mut seen = BTreeSet::new();
        for variation in &self.weighted_variations {
            if variation.name.is_empty() {
                return Err(CohortError::config("variation names must not be empty"));
            }
            if !seen.insert(variation.name.as_str()) {
                return Err(CohortError::config(format!(
                    "duplicate variation '{}'",
                    variation.name
                )));
            }
        }

        if self.expire.days == 0 {
            return Err(CohortError::config("expire.days must be positive"));
        }

        if let Some(fixed) = self.forced_variation() {
            if !seen.contains(fixed) {
                return Err(CohortError::config(format!(
                    "fixed variation '{fixed}' is not one of the weighted variations"
                )));
            }
        }
        Ok(())
    }

    /// Variation that bypasses bucketing, testing override first.
    pub fn forced_variation(&self) -> Option<&str> {
        self.testing
            .variation
            .as_deref()
            .or(self.fixed_variation.as_deref())
    }

    /// Resolve the ending URL for `reason`, if the study defines one.
    pub fn ending_url(&self, reason: &EndingReason, variation: Option<&str>) -> Option<String> {
        let template = self.endings.get(reason.as_str())?.base_url.as_deref()?;
        Some(
            template
                .replace("{reason}", reason.as_str())
                .replace("{study}", &self.study_name)
                .replace("{variation}", variation.unwrap_or("")),
        )
    }
}
