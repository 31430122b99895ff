//! Command-line tooling for Cohort studies
//!
//! Checks bucketing for a client id, samples the variation distribution of a
//! study config, and drives a study against an on-disk state directory.

use anyhow::Result;
use clap::Parser;

mod commands;
mod handlers;

use commands::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Assign { client_id } => {
            handlers::assign::handle_assign(&cli.config, &client_id)?;
        }
        Commands::Distribution { samples, seed } => {
            handlers::distribution::handle_distribution(&cli.config, samples, seed)?;
        }
        Commands::Run(args) => {
            handlers::run::handle_run(&cli.config, &args).await?;
        }
        Commands::End(args) => {
            handlers::run::handle_end(&cli.config, &args).await?;
        }
        Commands::Status { state_dir } => {
            handlers::status::handle_status(&state_dir).await?;
        }
    }

    Ok(())
}
