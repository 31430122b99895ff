//! Prompt renderer that logs instead of drawing.

use async_trait::async_trait;
use cohort_core::effects::PromptRendererEffects;
use cohort_core::{CohortError, PromptView};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Headless renderer: logs the view and remembers what is visible.
#[derive(Debug, Clone, Default)]
pub struct LogPromptRenderer {
    visible: Arc<Mutex<Option<PromptView>>>,
}

impl LogPromptRenderer {
    /// Create a new renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// The prompt currently shown, if any.
    pub fn visible(&self) -> Option<PromptView> {
        self.visible.lock().clone()
    }
}

#[async_trait]
impl PromptRendererEffects for LogPromptRenderer {
    async fn show_prompt(&self, view: &PromptView) -> Result<(), CohortError> {
        info!(
            provider = %view.provider_label,
            options = view.options.len(),
            persistent = view.mode.persistent,
            transient_ms = ?view.mode.transient_millis,
            "Showing prompt"
        );
        *self.visible.lock() = Some(view.clone());
        Ok(())
    }

    async fn dismiss_prompt(&self) -> Result<(), CohortError> {
        if self.visible.lock().take().is_some() {
            info!("Prompt dismissed");
        }
        Ok(())
    }
}
