//! Navigation handler that logs ending URLs.

use async_trait::async_trait;
use cohort_core::effects::NavigationEffects;
use cohort_core::CohortError;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Logs each URL and keeps the list for the host to open.
#[derive(Debug, Clone, Default)]
pub struct LogNavigationHandler {
    opened: Arc<Mutex<Vec<String>>>,
}

impl LogNavigationHandler {
    /// Create a new handler
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs requested so far, oldest first.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl NavigationEffects for LogNavigationHandler {
    async fn open_url(&self, url: &str) -> Result<(), CohortError> {
        if url.is_empty() {
            return Err(CohortError::navigation("empty URL"));
        }
        info!(url, "Opening ending page");
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}
