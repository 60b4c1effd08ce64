use serde::{Deserialize, Serialize};
use std::fmt;

/// How distances are measured when the shared CRS is geographic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeographicMetric {
    /// Raw Euclidean separation of longitude/latitude pairs, in degrees
    #[default]
    Degrees,
    /// Great-circle distance in metres
    Haversine,
}

impl fmt::Display for GeographicMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeographicMetric::Degrees => write!(f, "degrees"),
            GeographicMetric::Haversine => write!(f, "haversine"),
        }
    }
}

/// Units reported distances are expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    /// Linear units of the projected CRS (usually metres)
    CrsUnits,
    /// Angular degrees
    Degrees,
    /// Great-circle metres
    Metres,
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceUnit::CrsUnits => write!(f, "CRS units"),
            DistanceUnit::Degrees => write!(f, "degrees"),
            DistanceUnit::Metres => write!(f, "metres"),
        }
    }
}
