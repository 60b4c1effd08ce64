//! Config command implementation

use crate::commands::Outcome;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};
use anyhow::Result;
use geogate_core::config::{CliConfigOverrides, ConfigSource};
use std::path::Path;
use tabled::Tabled;

pub fn execute(config_path: Option<&Path>, output: &OutputWriter) -> Result<Outcome> {
    let config = load_config(config_path, CliConfigOverrides::default())?;
    let values = config.to_inspection_map();

    if output.is_json() {
        let values = values
            .into_iter()
            .map(|(key, (value, source))| (key, ConfigEntry { value, source }))
            .collect();
        output.result("success", ConfigOutput { values })?;
        return Ok(Outcome::Passed);
    }

    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    output.section("Resolved Configuration");
    output.table(
        values
            .into_iter()
            .map(|(key, (value, source))| ConfigRow {
                key,
                value,
                source: source_label(source),
            })
            .collect::<Vec<_>>(),
    );

    Ok(Outcome::Passed)
}

fn source_label(source: ConfigSource) -> String {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "environment",
        ConfigSource::Cli => "cli",
    }
    .to_string()
}
