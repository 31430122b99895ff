//! Prompt view model and user responses.

use serde::{Deserialize, Serialize};

/// Display label used when more than one provider is offered.
pub const MULTI_PROVIDER_LABEL: &str = "cloud storage";
/// Icon used when more than one provider is offered.
pub const DEFAULT_PROVIDER_ICON: &str = "default";

/// A provider the user can opt into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCandidate {
    /// Stable key persisted as `optedInProviderKey`.
    pub key: String,
    /// Human readable name.
    pub display_name: String,
}

impl ProviderCandidate {
    /// Helper constructor.
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
        }
    }

    /// Icon slug: lower-cased display name without spaces.
    pub fn icon_slug(&self) -> String {
        self.display_name
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    }
}

/// How the renderer should present the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptMode {
    /// Stays until explicitly closed, accepted or rejected.
    pub persistent: bool,
    /// Auto-dismiss after this many milliseconds.
    pub transient_millis: Option<u64>,
    /// Show an explicit close control.
    pub close_button_visible: bool,
}

/// Everything the renderer needs to draw one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptView {
    /// Presentation mode from the active policy.
    pub mode: PromptMode,
    /// Provider name shown in the title and save button.
    pub provider_label: String,
    /// Icon slug for the title.
    pub icon: String,
    /// Selectable providers; empty when a single provider is auto-targeted.
    pub options: Vec<ProviderCandidate>,
    /// Provider the save action currently targets.
    pub target: Option<String>,
    /// Whether the save action is enabled.
    pub save_enabled: bool,
}

/// Why a prompt went away without an opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DismissCause {
    /// Close button.
    Closed,
    /// "Not now".
    Cancelled,
    /// Transient auto-dismiss.
    TimedOut,
    /// Click outside a non-persistent prompt.
    ClickedOutside,
}

impl DismissCause {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed-out",
            Self::ClickedOutside => "clicked-outside",
        }
    }
}

/// Raw user interaction reported by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PromptResponse {
    /// A provider option was picked (multi-candidate prompts).
    Select {
        /// Picked provider key.
        provider_key: String,
    },
    /// Explicit save/confirm.
    Save,
    /// The prompt went away without saving.
    Dismiss {
        /// How it went away.
        cause: DismissCause,
    },
}

/// Resolved outcome fed to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum PromptOutcome {
    /// Dismissal starts a new interval.
    Dismissed {
        /// How it went away.
        cause: DismissCause,
    },
    /// Opt-in to a provider.
    Accepted {
        /// Chosen provider key.
        provider_key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_slug_strips_spaces_and_case() {
        let candidate = ProviderCandidate::new("Dropbox", "Google Drive");
        assert_eq!(candidate.icon_slug(), "googledrive");
    }

    #[test]
    fn responses_use_tagged_json() {
        let json = serde_json::to_string(&PromptResponse::Dismiss {
            cause: DismissCause::TimedOut,
        })
        .unwrap();
        assert_eq!(json, r#"{"action":"dismiss","cause":"timed-out"}"#);
    }
}
