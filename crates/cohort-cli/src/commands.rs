//! Argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cohort")]
#[command(about = "Cohort - client-side study bucketing and prompt scheduling", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Study config (JSON)
    #[arg(short, long, global = true, default_value = "study.json")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the bucketing fraction and variation for a client id
    Assign {
        /// Per-install client identifier
        #[arg(long)]
        client_id: String,
    },

    /// Sample random client ids and compare observed shares to weights
    Distribution {
        /// Number of client ids to sample
        #[arg(short = 'n', long, default_value = "10000")]
        samples: usize,

        /// RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Set the study up against a state directory, optionally firing one trigger
    Run(RunArgs),

    /// End the study recorded in a state directory
    End(EndArgs),

    /// Print every persisted study key
    Status {
        /// Directory holding persisted study keys
        #[arg(long, default_value = ".cohort")]
        state_dir: PathBuf,
    },
}

/// Options shared by commands that touch a persisted install.
#[derive(Debug, Clone, Args)]
pub struct InstallArgs {
    /// Directory holding persisted study keys
    #[arg(long, default_value = ".cohort")]
    pub state_dir: PathBuf,

    /// Per-install client identifier
    #[arg(long)]
    pub client_id: String,

    /// Answer the eligibility check with "not eligible"
    #[arg(long)]
    pub ineligible: bool,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub install: InstallArgs,

    /// Treat this as the first run of the install
    #[arg(long)]
    pub first_run: bool,

    /// Provider keys offered by a trigger after setup
    #[arg(long = "trigger", value_name = "PROVIDER")]
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EndArgs {
    #[command(flatten)]
    pub install: InstallArgs,

    /// Ending reason (`user-disable`, `expired`, `ineligible` or a custom name)
    #[arg(long, default_value = "user-disable")]
    pub reason: String,
}
