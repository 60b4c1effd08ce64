//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use geogate_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::Path;

/// Resolve configuration: defaults, then the config file, then `GEOGATE_*`
/// variables, then command-line overrides.
///
/// An explicit `config_path` must exist; otherwise `geogate.toml` in the
/// working directory is used when present.
pub fn load_config(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let config = match config_path {
        Some(path) => LayeredConfig::with_defaults()
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir()?;
            LayeredConfig::with_defaults()
                .load_from_dir_if_present(&cwd)
                .context("Failed to load geogate.toml")?
        }
    };

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}
