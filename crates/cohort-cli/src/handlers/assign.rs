//! Single-client bucketing check.

use super::load_config;
use anyhow::Result;
use cohort_core::{assign, bucketing_salt, hash_fraction, StudyConfig};
use std::path::Path;

/// Bucketing result for one client id.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub salt: String,
    pub fraction: f64,
    pub variation: String,
}

/// Compute the assignment a fresh install with `client_id` would receive.
pub fn compute(config: &StudyConfig, client_id: &str) -> Result<Assignment> {
    let salt = bucketing_salt(&config.study_name, client_id);
    let fraction = hash_fraction(&salt);
    let variation = assign(&salt, &config.weighted_variations, config.forced_variation())?;
    Ok(Assignment {
        salt,
        fraction,
        variation,
    })
}

pub fn handle_assign(config_path: &Path, client_id: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let assignment = compute(&config, client_id)?;
    if let Some(forced) = config.forced_variation() {
        tracing::info!(variation = forced, "Variation forced by config");
    }
    println!("study:     {}", config.study_name);
    println!("salt:      {}", assignment.salt);
    println!("fraction:  {:.6}", assignment.fraction);
    println!("variation: {}", assignment.variation);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_core::VariationDefinition;

    #[test]
    fn matches_known_assignments() {
        let config = StudyConfig::new(
            "cloud-storage-prompts",
            vec![
                VariationDefinition::new("control", 1.0),
                VariationDefinition::new("short", 1.0),
            ],
            14,
        );
        let a = compute(&config, "client-0001").unwrap();
        assert_eq!(a.salt, "cloud-storage-promptsclient-0001");
        assert_eq!(a.variation, "control");
        assert_eq!(compute(&config, "client-0002").unwrap().variation, "short");
    }
}
