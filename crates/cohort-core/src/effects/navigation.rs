//! Opening ending/survey pages.

use crate::errors::CohortError;
use async_trait::async_trait;

/// Opens a URL in the host (a new browser tab, a system browser, ...).
#[async_trait]
pub trait NavigationEffects: Send + Sync {
    /// Request the host open `url`.
    async fn open_url(&self, url: &str) -> Result<(), CohortError>;
}

#[async_trait]
impl<T: NavigationEffects + ?Sized> NavigationEffects for std::sync::Arc<T> {
    async fn open_url(&self, url: &str) -> Result<(), CohortError> {
        (**self).open_url(url).await
    }
}
