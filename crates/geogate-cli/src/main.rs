//! GeoGate CLI - Command-line interface
//!
//! Runs the data-quality gates against dataset files and maps the outcome
//! onto the process exit code: 0 passed, 1 failed, 2 error.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod loader;
mod output;
mod output_types;

use clap::Parser;
use cli::Cli;
use commands::Outcome;
use output::OutputWriter;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();
    let json = cli.json;

    // Initialize tracing; the geographic-CRS warning is rendered from the report
    let default_filter = if cli.verbose {
        "debug"
    } else {
        "warn,geogate_geo=error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| runtime.block_on(commands::execute(cli)));

    match result {
        Ok(Outcome::Passed) => ExitCode::SUCCESS,
        Ok(Outcome::Failed) => ExitCode::from(1),
        Err(error) => {
            if json {
                OutputWriter::new(true).error(format!("{:#}", error));
            } else {
                errors::from_anyhow(error).display();
            }
            ExitCode::from(2)
        }
    }
}
