use chrono::{DateTime, Utc};
use geogate_core::checks::{ConsistencyReport, DistributionReport};
use geogate_core::config::ConfigSource;
use geogate_geo::{DistanceMetric, DistanceReport};
use serde::Serialize;
use std::collections::BTreeMap;

/// One input dataset as loaded
#[derive(Debug, Serialize)]
pub struct DatasetSummary {
    pub path: String,
    pub name: String,
    pub features: usize,
    pub crs: Option<String>,
}

/// Output for the leakage command
#[derive(Debug, Serialize)]
pub struct LeakageOutput {
    pub checked_at: DateTime<Utc>,
    pub train: DatasetSummary,
    pub test: DatasetSummary,
    pub metric: DistanceMetric,
    pub leaf_size: usize,
    pub report: DistanceReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violating_samples: Option<Vec<ViolationDetail>>,
}

/// A test sample within the buffer of its nearest training sample
#[derive(Debug, Serialize)]
pub struct ViolationDetail {
    pub test_feature: String,
    pub train_feature: String,
    pub distance: f64,
}

/// Output for the distribution command
#[derive(Debug, Serialize)]
pub struct DistributionOutput {
    pub checked_at: DateTime<Utc>,
    pub column: String,
    pub report: DistributionReport,
}

/// Output for the integrity command
#[derive(Debug, Serialize)]
pub struct IntegrityOutput {
    pub checked_at: DateTime<Utc>,
    pub datasets: Vec<DatasetSummary>,
    /// Files passed in or found in directories that no reader handles
    pub skipped: Vec<String>,
    pub report: ConsistencyReport,
    pub passed: bool,
}

/// Output for the config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub values: BTreeMap<String, ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: ConfigSource,
}
