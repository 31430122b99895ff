//! Variation to prompt policy table.

use cohort_core::{PromptMode, StudyConfig, SECONDS_PER_DAY};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Display and gating parameters for one variation. Recomputed every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPolicy {
    /// Stays until explicitly closed.
    pub persistent: bool,
    /// Auto-dismiss delay.
    pub transient_millis: Option<u64>,
    /// Minimum days between dismissal and the next prompt; 0 disables gating.
    pub interval_days: u32,
    /// Close button shown.
    pub close_button_visible: bool,
}

impl PromptPolicy {
    fn new(persistent: bool, transient_millis: Option<u64>, interval_days: u32) -> Self {
        Self {
            persistent,
            transient_millis,
            interval_days,
            close_button_visible: persistent,
        }
    }

    /// Policy for `variation`, or `None` for the control arm, which never
    /// prompts.
    pub fn for_variation(variation: &str, config: &StudyConfig) -> Option<Self> {
        let transient = config.prompt.transient_millis;
        let (base, interval_days) = match variation.strip_suffix("_with_interval") {
            Some(base) => (base, config.prompt.interval_days),
            None => (variation, 0),
        };

        let policy = match base {
            "control" => return None,
            "notification-interval-short" | "short" if interval_days == 0 => {
                Self::new(true, None, config.interval.short_duration)
            }
            "notification-interval-longer" | "longer" if interval_days == 0 => {
                Self::new(true, None, config.interval.long_duration)
            }
            "prompt_persistent" => Self::new(true, None, interval_days),
            "prompt_not_persistent" => Self::new(false, None, interval_days),
            "prompt_transient" => Self::new(true, Some(transient), interval_days),
            _ => {
                warn!(variation, "Unknown variation, using non-persistent ungated prompt");
                Self::new(false, None, 0)
            }
        };
        Some(policy)
    }

    /// Display mode handed to the renderer.
    pub fn mode(&self) -> PromptMode {
        PromptMode {
            persistent: self.persistent,
            transient_millis: self.transient_millis,
            close_button_visible: self.close_button_visible,
        }
    }

    /// Gating interval in seconds.
    pub fn interval_secs(&self) -> u64 {
        u64::from(self.interval_days) * SECONDS_PER_DAY
    }
}
