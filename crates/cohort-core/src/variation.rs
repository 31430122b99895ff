//! Deterministic weighted variation bucketing.
//!
//! The bucketing fraction is the first [`HASH_FRACTION_DIGITS`] hex digits of
//! the SHA-256 digest of the salt, read as an unsigned integer and divided by
//! `16^12` (`2^48`). Both values are fixed: changing either reassigns users
//! across reimplementations.
//!
//! The salt is the study name concatenated with the per-install client
//! identifier, with no separator.

use crate::errors::{CohortError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex digits of the digest used for the bucketing fraction.
pub const HASH_FRACTION_DIGITS: usize = 12;

/// `16^HASH_FRACTION_DIGITS`, the normalization divisor.
pub const HASH_FRACTION_DIVISOR: u64 = 1 << (4 * HASH_FRACTION_DIGITS);

/// One named arm of the experiment and its relative weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationDefinition {
    /// Variation name, unique within the study.
    pub name: String,
    /// Relative weight; must be finite and positive.
    pub weight: f64,
}

impl VariationDefinition {
    /// Helper constructor.
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// Build the bucketing salt for a study and install.
pub fn bucketing_salt(study_name: &str, client_id: &str) -> String {
    format!("{study_name}{client_id}")
}

/// Stable fraction in `[0, 1)` derived from `salt`.
pub fn hash_fraction(salt: &str) -> f64 {
    let digest = Sha256::digest(salt.as_bytes());
    let hex_digest = hex::encode(digest);
    // 12 hex digits = 48 bits, always representable in u64 and exactly in f64
    let prefix = &hex_digest[..HASH_FRACTION_DIGITS];
    let value = u64::from_str_radix(prefix, 16).unwrap_or(0);
    value as f64 / HASH_FRACTION_DIVISOR as f64
}

/// Check that a variation list can be bucketed into.
pub fn validate_weights(variations: &[VariationDefinition]) -> Result<f64> {
    if variations.is_empty() {
        return Err(CohortError::config("weighted variation list is empty"));
    }
    for variation in variations {
        if !variation.weight.is_finite() || variation.weight <= 0.0 {
            return Err(CohortError::config(format!(
                "variation '{}' has non-positive weight {}",
                variation.name, variation.weight
            )));
        }
    }
    let total: f64 = variations.iter().map(|v| v.weight).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(CohortError::config(format!(
            "variation weights sum to {total}"
        )));
    }
    Ok(total)
}

/// Weighted selection: first variation whose cumulative weight share exceeds
/// `fraction`, in list order.
pub fn choose_weighted(
    variations: &[VariationDefinition],
    fraction: f64,
) -> Result<&VariationDefinition> {
    let total = validate_weights(variations)?;
    let mut cumulative = 0.0;
    for variation in variations {
        cumulative += variation.weight;
        if cumulative / total > fraction {
            return Ok(variation);
        }
    }
    // Float accumulation can leave the last share a hair under 1.0
    variations
        .last()
        .ok_or_else(|| CohortError::config("weighted variation list is empty"))
}

/// Assign a variation name for `salt`.
///
/// A fixed variation bypasses hashing entirely; it is checked first and must
/// name a configured variation.
pub fn assign(
    salt: &str,
    variations: &[VariationDefinition],
    fixed: Option<&str>,
) -> Result<String> {
    validate_weights(variations)?;
    if let Some(fixed) = fixed {
        return variations
            .iter()
            .find(|v| v.name == fixed)
            .map(|v| v.name.clone())
            .ok_or_else(|| {
                CohortError::config(format!("fixed variation '{fixed}' is not configured"))
            });
    }
    let fraction = hash_fraction(salt);
    choose_weighted(variations, fraction).map(|v| v.name.clone())
}
