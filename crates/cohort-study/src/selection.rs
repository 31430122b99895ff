//! Provider selection for a shown prompt.
//!
//! A single candidate is auto-targeted; several candidates are offered as
//! options and the save action stays disabled until one is picked. Either
//! way the opt-in is only recorded on an explicit save.

use cohort_core::prompt::{DEFAULT_PROVIDER_ICON, MULTI_PROVIDER_LABEL};
use cohort_core::{CohortError, PromptMode, PromptView, ProviderCandidate, Result};

/// Selection state of the prompt currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSelection {
    mode: PromptMode,
    candidates: Vec<ProviderCandidate>,
    selected: Option<String>,
}

impl PromptSelection {
    /// Start a selection over `candidates`, which must not be empty.
    pub fn new(mode: PromptMode, candidates: Vec<ProviderCandidate>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(CohortError::render("prompt needs at least one provider"));
        }
        Ok(Self {
            mode,
            candidates,
            selected: None,
        })
    }

    /// More than one provider on offer.
    pub fn is_multi(&self) -> bool {
        self.candidates.len() > 1
    }

    /// Provider a save would opt into.
    pub fn target(&self) -> Option<&str> {
        match self.candidates.as_slice() {
            [only] => Some(only.key.as_str()),
            _ => self.selected.as_deref(),
        }
    }

    /// Pick `key` among the offered providers.
    pub fn select(&mut self, key: &str) -> Result<()> {
        if !self.candidates.iter().any(|c| c.key == key) {
            return Err(CohortError::render(format!(
                "provider '{key}' was not offered"
            )));
        }
        self.selected = Some(key.to_string());
        Ok(())
    }

    /// Provider key to record for a save.
    pub fn confirm(&self) -> Result<String> {
        self.target()
            .map(str::to_string)
            .ok_or_else(|| CohortError::render("save without a selected provider"))
    }

    /// View model for the renderer.
    pub fn view(&self) -> PromptView {
        match self.candidates.as_slice() {
            [only] => PromptView {
                mode: self.mode,
                provider_label: only.display_name.clone(),
                icon: only.icon_slug(),
                options: Vec::new(),
                target: Some(only.key.clone()),
                save_enabled: true,
            },
            _ => PromptView {
                mode: self.mode,
                provider_label: MULTI_PROVIDER_LABEL.to_string(),
                icon: DEFAULT_PROVIDER_ICON.to_string(),
                options: self.candidates.clone(),
                target: self.selected.clone(),
                save_enabled: self.selected.is_some(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_testkit::{one_candidate, two_candidates};

    const MODE: PromptMode = PromptMode {
        persistent: true,
        transient_millis: None,
        close_button_visible: true,
    };

    #[test]
    fn single_candidate_is_auto_targeted() {
        let selection = PromptSelection::new(MODE, one_candidate()).unwrap();
        let view = selection.view();
        assert_eq!(view.provider_label, "Dropbox");
        assert_eq!(view.icon, "dropbox");
        assert!(view.options.is_empty());
        assert!(view.save_enabled);
        assert_eq!(selection.confirm().unwrap(), "Dropbox");
    }

    #[test]
    fn multiple_candidates_need_a_pick() {
        let mut selection = PromptSelection::new(MODE, two_candidates()).unwrap();
        let view = selection.view();
        assert_eq!(view.provider_label, MULTI_PROVIDER_LABEL);
        assert_eq!(view.icon, DEFAULT_PROVIDER_ICON);
        assert_eq!(view.options.len(), 2);
        assert!(!view.save_enabled);
        assert!(selection.confirm().is_err());

        selection.select("GDrive").unwrap();
        assert!(selection.view().save_enabled);
        assert_eq!(selection.confirm().unwrap(), "GDrive");
    }

    #[test]
    fn unknown_pick_and_empty_offer_are_rejected() {
        let mut selection = PromptSelection::new(MODE, two_candidates()).unwrap();
        assert!(selection.select("OneDrive").is_err());
        assert_eq!(selection.target(), None);
        assert!(PromptSelection::new(MODE, Vec::new()).is_err());
    }
}
