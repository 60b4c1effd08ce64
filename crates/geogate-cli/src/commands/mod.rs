//! Command implementations

mod config;
mod distribution;
mod integrity;
mod leakage;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Result of a command that ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Outcome::Passed
        } else {
            Outcome::Failed
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
        }
    }
}

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<Outcome> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Leakage(args) => leakage::execute(args, config_path, &output).await,
        Commands::Distribution(args) => distribution::execute(args, config_path, &output).await,
        Commands::Integrity(args) => integrity::execute(args, &output).await,
        Commands::Config => config::execute(config_path, &output),
    }
}
