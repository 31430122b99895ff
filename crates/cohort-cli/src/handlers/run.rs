//! Local study runs against a filesystem state directory.

use super::load_config;
use crate::commands::{EndArgs, InstallArgs, RunArgs};
use anyhow::{bail, Result};
use cohort_core::{EndingReason, ProviderCandidate, StudyConfig};
use cohort_effects::{FilesystemStorageHandler, HostEffects, StaticEligibilityHandler};
use cohort_study::{PromptDecision, SetupOutcome, Study, StudyApi};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

type LocalEffects = HostEffects<FilesystemStorageHandler>;

fn host_effects(config: &StudyConfig, install: &InstallArgs) -> Arc<LocalEffects> {
    let storage = FilesystemStorageHandler::new(&install.state_dir);
    let effects = HostEffects::new(storage, &install.client_id, config.telemetry)
        .with_eligibility(StaticEligibilityHandler::new(!install.ineligible));
    Arc::new(effects)
}

fn print_setup(outcome: &SetupOutcome) {
    match outcome {
        SetupOutcome::Active(activation) => {
            println!("state:     active");
            println!("variation: {}", activation.enrollment.variation);
            println!("enrolled:  {}", activation.enrollment.first_run_timestamp);
            println!("expires:   {}", activation.enrollment.expire_at);
            if activation.newly_enrolled {
                println!("new enrollment");
            }
        }
        SetupOutcome::Ended(ended) => {
            println!("state:     ended ({})", ended.reason);
        }
    }
}

pub async fn handle_run(config_path: &Path, args: &RunArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let effects = host_effects(&config, &args.install);
    let study = Study::new(effects.clone());

    let outcome = study.setup(config, args.first_run).await?;
    print_setup(&outcome);

    if args.triggers.is_empty() {
        return Ok(());
    }
    if !matches!(outcome, SetupOutcome::Active(_)) {
        info!("Study not active, skipping trigger");
        return Ok(());
    }

    let candidates = args
        .triggers
        .iter()
        .map(|key| ProviderCandidate::new(key.as_str(), key.as_str()))
        .collect();
    match study.decide(candidates).await? {
        PromptDecision::Show(mode) => {
            println!("decision:  show (persistent={})", mode.persistent);
            if let Some(view) = effects.prompts().visible() {
                println!("prompt:    {}", view.provider_label);
                for option in &view.options {
                    println!("  option:  {}", option.key);
                }
            }
        }
        PromptDecision::Suppress(reason) => {
            println!("decision:  suppress ({reason:?})");
        }
    }
    Ok(())
}

pub async fn handle_end(config_path: &Path, args: &EndArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let effects = host_effects(&config, &args.install);
    let study = Study::new(effects.clone());

    if let SetupOutcome::Ended(ended) = study.setup(config, false).await? {
        println!("already ended ({})", ended.reason);
        return Ok(());
    }

    let reason = EndingReason::from(args.reason.as_str());
    let outcome = study.end_study(reason).await;
    if !outcome.performed {
        bail!("study was already ending ({})", outcome.reason);
    }
    println!("ended:     {}", outcome.reason);
    for url in effects.navigation().opened() {
        println!("survey:    {url}");
    }
    Ok(())
}
