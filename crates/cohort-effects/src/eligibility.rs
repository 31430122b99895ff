//! Eligibility handlers.

use async_trait::async_trait;
use cohort_core::effects::EligibilityEffects;
use cohort_core::CohortError;

/// Fixed eligibility answer, for hosts whose enrollment criteria are decided
/// before the study starts.
#[derive(Debug, Clone, Copy)]
pub struct StaticEligibilityHandler {
    eligible: bool,
}

impl StaticEligibilityHandler {
    /// Always answer `eligible`.
    pub fn new(eligible: bool) -> Self {
        Self { eligible }
    }

    /// Always eligible.
    pub fn allow_all() -> Self {
        Self::new(true)
    }
}

impl Default for StaticEligibilityHandler {
    fn default() -> Self {
        Self::allow_all()
    }
}

#[async_trait]
impl EligibilityEffects for StaticEligibilityHandler {
    async fn is_eligible(&self) -> Result<bool, CohortError> {
        Ok(self.eligible)
    }
}
