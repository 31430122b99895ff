//! Command handlers.

pub mod assign;
pub mod distribution;
pub mod run;
pub mod status;

use anyhow::{Context, Result};
use cohort_core::StudyConfig;
use std::path::Path;

/// Load a study config and apply `COHORT_*` environment overrides.
pub fn load_config(path: &Path) -> Result<StudyConfig> {
    let mut config = StudyConfig::load_from_file(path)
        .with_context(|| format!("loading study config {}", path.display()))?;
    config.merge_with_env()?;
    Ok(config)
}
