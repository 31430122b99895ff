//! Prompt rendering effect.
//!
//! Rendering is out of scope for the core; the renderer receives a fully
//! resolved [`PromptView`] and later reports the user's response as a
//! [`crate::events::StudyEvent::PromptResponded`].

use crate::errors::CohortError;
use crate::prompt::PromptView;
use async_trait::async_trait;

/// Host UI that shows and hides the prompt.
#[async_trait]
pub trait PromptRendererEffects: Send + Sync {
    /// Present the prompt.
    async fn show_prompt(&self, view: &PromptView) -> Result<(), CohortError>;

    /// Remove any visible prompt.
    async fn dismiss_prompt(&self) -> Result<(), CohortError>;
}

#[async_trait]
impl<T: PromptRendererEffects + ?Sized> PromptRendererEffects for std::sync::Arc<T> {
    async fn show_prompt(&self, view: &PromptView) -> Result<(), CohortError> {
        (**self).show_prompt(view).await
    }

    async fn dismiss_prompt(&self) -> Result<(), CohortError> {
        (**self).dismiss_prompt().await
    }
}
