use crate::error::{GeogateError, Result};
use crate::models::{Crs, GeographicMetric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Default config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "geogate.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for geogate checks
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub threshold: ConfigValue<f64>,
    pub leaf_size: ConfigValue<usize>,
    pub geographic_metric: ConfigValue<GeographicMetric>,
    pub parallel: ConfigValue<bool>,
    pub skew_tolerance: ConfigValue<f64>,
    pub assume_crs: ConfigValue<Option<Crs>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            threshold: ConfigValue::new(0.0, ConfigSource::Default),
            leaf_size: ConfigValue::new(15, ConfigSource::Default),
            geographic_metric: ConfigValue::new(GeographicMetric::Degrees, ConfigSource::Default),
            parallel: ConfigValue::new(true, ConfigSource::Default),
            skew_tolerance: ConfigValue::new(5.0, ConfigSource::Default),
            assume_crs: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeogateError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeogateError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        let source = ConfigSource::File;

        if let Some(threshold) = file_config.threshold {
            let threshold = validate_threshold(threshold)?;
            self.threshold.update(threshold, source);
        }

        if let Some(leaf_size) = file_config.leaf_size {
            let leaf_size = validate_leaf_size(leaf_size)?;
            self.leaf_size.update(leaf_size, source);
        }

        if let Some(metric) = file_config.geographic_metric {
            self.geographic_metric.update(metric, source);
        }

        if let Some(parallel) = file_config.parallel {
            self.parallel.update(parallel, source);
        }

        if let Some(tolerance) = file_config.skew_tolerance {
            let tolerance = validate_tolerance(tolerance)?;
            self.skew_tolerance.update(tolerance, source);
        }

        if let Some(crs) = file_config.assume_crs {
            self.assume_crs.update(Some(crs.parse()?), source);
        }

        Ok(self)
    }

    /// Load `geogate.toml` from `dir` when present
    pub fn load_from_dir_if_present<P: AsRef<Path>>(self, dir: P) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "Loading config file");
            self.load_from_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        let source = ConfigSource::Environment;

        // GEOGATE_THRESHOLD
        if let Ok(raw) = env::var("GEOGATE_THRESHOLD") {
            match parse_validated(&raw, validate_threshold) {
                Some(threshold) => self.threshold.update(threshold, source),
                None => tracing::warn!(
                    "Invalid GEOGATE_THRESHOLD value '{}': expected a non-negative number",
                    raw
                ),
            }
        }

        // GEOGATE_LEAF_SIZE
        if let Ok(raw) = env::var("GEOGATE_LEAF_SIZE") {
            match parse_validated(&raw, validate_leaf_size) {
                Some(leaf_size) => self.leaf_size.update(leaf_size, source),
                None => tracing::warn!(
                    "Invalid GEOGATE_LEAF_SIZE value '{}': expected a positive integer",
                    raw
                ),
            }
        }

        // GEOGATE_GEOGRAPHIC_METRIC
        if let Ok(raw) = env::var("GEOGATE_GEOGRAPHIC_METRIC") {
            match parse_geographic_metric(&raw) {
                Ok(metric) => self.geographic_metric.update(metric, source),
                Err(_) => tracing::warn!(
                    "Invalid GEOGATE_GEOGRAPHIC_METRIC value '{}': expected degrees or haversine",
                    raw
                ),
            }
        }

        // GEOGATE_PARALLEL
        if let Ok(raw) = env::var("GEOGATE_PARALLEL") {
            match parse_bool(&raw) {
                Ok(parallel) => self.parallel.update(parallel, source),
                Err(_) => tracing::warn!(
                    "Invalid GEOGATE_PARALLEL value '{}': expected true or false",
                    raw
                ),
            }
        }

        // GEOGATE_SKEW_TOLERANCE
        if let Ok(raw) = env::var("GEOGATE_SKEW_TOLERANCE") {
            match parse_validated(&raw, validate_tolerance) {
                Some(tolerance) => self.skew_tolerance.update(tolerance, source),
                None => tracing::warn!(
                    "Invalid GEOGATE_SKEW_TOLERANCE value '{}': expected a non-negative percentage",
                    raw
                ),
            }
        }

        // GEOGATE_ASSUME_CRS
        if let Ok(raw) = env::var("GEOGATE_ASSUME_CRS") {
            match raw.parse::<Crs>() {
                Ok(crs) => self.assume_crs.update(Some(crs), source),
                Err(e) => tracing::warn!("Invalid GEOGATE_ASSUME_CRS value '{}': {}", raw, e),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(threshold) = overrides.threshold {
            self.threshold.update(threshold, ConfigSource::Cli);
        }

        if let Some(leaf_size) = overrides.leaf_size {
            self.leaf_size.update(leaf_size, ConfigSource::Cli);
        }

        if let Some(metric) = overrides.geographic_metric {
            self.geographic_metric.update(metric, ConfigSource::Cli);
        }

        if let Some(parallel) = overrides.parallel {
            self.parallel.update(parallel, ConfigSource::Cli);
        }

        if let Some(tolerance) = overrides.skew_tolerance {
            self.skew_tolerance.update(tolerance, ConfigSource::Cli);
        }

        if let Some(crs) = overrides.assume_crs {
            self.assume_crs.update(Some(crs), ConfigSource::Cli);
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert(
            "threshold".to_string(),
            (self.threshold.value.to_string(), self.threshold.source),
        );
        map.insert(
            "leaf_size".to_string(),
            (self.leaf_size.value.to_string(), self.leaf_size.source),
        );
        map.insert(
            "geographic_metric".to_string(),
            (
                self.geographic_metric.value.to_string(),
                self.geographic_metric.source,
            ),
        );
        map.insert(
            "parallel".to_string(),
            (self.parallel.value.to_string(), self.parallel.source),
        );
        map.insert(
            "skew_tolerance".to_string(),
            (
                format!("{}%", self.skew_tolerance.value),
                self.skew_tolerance.source,
            ),
        );
        map.insert(
            "assume_crs".to_string(),
            (
                self.assume_crs
                    .value
                    .as_ref()
                    .map(|crs| crs.identifier())
                    .unwrap_or_else(|| "none".to_string()),
                self.assume_crs.source,
            ),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    threshold: Option<f64>,
    leaf_size: Option<usize>,
    geographic_metric: Option<GeographicMetric>,
    parallel: Option<bool>,
    skew_tolerance: Option<f64>,
    assume_crs: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub threshold: Option<f64>,
    pub leaf_size: Option<usize>,
    pub geographic_metric: Option<GeographicMetric>,
    pub parallel: Option<bool>,
    pub skew_tolerance: Option<f64>,
    pub assume_crs: Option<Crs>,
}

/// Parse geographic metric from string
pub fn parse_geographic_metric(s: &str) -> Result<GeographicMetric> {
    match s.to_lowercase().as_str() {
        "degrees" | "deg" | "angular" => Ok(GeographicMetric::Degrees),
        "haversine" | "great-circle" | "great_circle" => Ok(GeographicMetric::Haversine),
        _ => Err(GeogateError::ConfigInvalid {
            key: "geographic_metric".to_string(),
            reason: format!("Invalid metric: {}. Use degrees or haversine", s),
        }),
    }
}

/// Parse an environment value and run it through its validator
fn parse_validated<T: FromStr>(raw: &str, validate: fn(T) -> Result<T>) -> Option<T> {
    raw.parse::<T>().ok().and_then(|v| validate(v).ok())
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(GeogateError::ConfigInvalid {
            key: "parallel".to_string(),
            reason: format!("Invalid boolean: {}", s),
        }),
    }
}

fn validate_threshold(value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GeogateError::InvalidThreshold { value })
    }
}

fn validate_leaf_size(value: usize) -> Result<usize> {
    if value == 0 {
        return Err(GeogateError::ConfigInvalid {
            key: "leaf_size".to_string(),
            reason: "leaf size must be at least 1".to_string(),
        });
    }
    Ok(value)
}

fn validate_tolerance(value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GeogateError::ConfigInvalid {
            key: "skew_tolerance".to_string(),
            reason: format!(
                "tolerance must be a non-negative percentage, got {}",
                value
            ),
        })
    }
}
