//! First-run eligibility check.

use crate::errors::CohortError;
use async_trait::async_trait;

/// Decides whether this install may enroll. Consulted on first run only.
///
/// `Ok(false)` and `Err(_)` both route to an `ineligible` ending.
#[async_trait]
pub trait EligibilityEffects: Send + Sync {
    /// Whether enrollment should proceed.
    async fn is_eligible(&self) -> Result<bool, CohortError>;
}

#[async_trait]
impl<T: EligibilityEffects + ?Sized> EligibilityEffects for std::sync::Arc<T> {
    async fn is_eligible(&self) -> Result<bool, CohortError> {
        (**self).is_eligible().await
    }
}
