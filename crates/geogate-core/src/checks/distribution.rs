//! Class stratification across dataset splits.
//!
//! Compares per-class sample shares between a reference split (conventionally
//! train) and every other split, flagging classes that are skewed beyond a
//! tolerance or absent from any split.

use crate::error::{GeogateError, Result};
use crate::models::Layer;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Label used for features whose label value is null
pub const NULL_LABEL: &str = "null";

/// Labels of one split, in feature order
#[derive(Debug, Clone)]
pub struct LabelledSplit {
    pub name: String,
    pub labels: Vec<String>,
}

impl LabelledSplit {
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    /// Extract the `column` label of every feature in a layer.
    ///
    /// A layer in which no feature carries the column is rejected; features
    /// that lack it individually are counted under [`NULL_LABEL`].
    pub fn from_layer(name: impl Into<String>, layer: &Layer, column: &str) -> Result<Self> {
        let name = name.into();
        if !layer.is_empty() && !layer.has_property(column) {
            return Err(GeogateError::LabelColumnMissing {
                column: column.to_string(),
                split: name,
            });
        }

        let labels = layer
            .features
            .iter()
            .map(|f| {
                f.properties
                    .get(column)
                    .map(label_string)
                    .unwrap_or_else(|| NULL_LABEL.to_string())
            })
            .collect();

        Ok(Self { name, labels })
    }
}

fn label_string(value: &Value) -> String {
    match value {
        Value::Null => NULL_LABEL.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Status of one class across splits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    Ok,
    Skewed,
    Missing,
}

/// Count and share of one class within one split
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassShare {
    pub split: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassRow {
    pub class: String,
    pub shares: Vec<ClassShare>,
    /// Largest absolute percentage-point gap between the reference split and any other
    pub max_diff: f64,
    pub status: ClassStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitTotal {
    pub split: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionReport {
    pub totals: Vec<SplitTotal>,
    pub classes: Vec<ClassRow>,
    pub tolerance: f64,
    pub passed: bool,
}

impl DistributionReport {
    pub fn total_samples(&self) -> usize {
        self.totals.iter().map(|t| t.count).sum()
    }

    pub fn flagged(&self) -> impl Iterator<Item = &ClassRow> {
        self.classes
            .iter()
            .filter(|row| row.status != ClassStatus::Ok)
    }
}

/// Order labels numerically when both parse as numbers, lexically otherwise
fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x
            .partial_cmp(&y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Check that every class has a consistent share across splits.
///
/// The first split is the reference. `tolerance` is in percentage points.
pub fn check_distribution(splits: &[LabelledSplit], tolerance: f64) -> Result<DistributionReport> {
    if splits.len() < 2 {
        return Err(GeogateError::ConfigInvalid {
            key: "splits".to_string(),
            reason: format!("need at least two splits to compare, got {}", splits.len()),
        });
    }
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(GeogateError::ConfigInvalid {
            key: "skew_tolerance".to_string(),
            reason: format!(
                "tolerance must be a non-negative percentage, got {}",
                tolerance
            ),
        });
    }

    let counts: Vec<BTreeMap<&str, usize>> = splits
        .iter()
        .map(|split| {
            let mut map = BTreeMap::new();
            for label in &split.labels {
                *map.entry(label.as_str()).or_insert(0) += 1;
            }
            map
        })
        .collect();

    let mut classes: Vec<&str> = counts
        .iter()
        .flat_map(|m| m.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    classes.sort_by(|a, b| compare_labels(a, b));

    let rows: Vec<ClassRow> = classes
        .into_iter()
        .map(|class| {
            let shares: Vec<ClassShare> = splits
                .iter()
                .zip(&counts)
                .map(|(split, map)| {
                    let count = map.get(class).copied().unwrap_or(0);
                    let total = split.labels.len();
                    let percent = if total > 0 {
                        count as f64 / total as f64 * 100.0
                    } else {
                        0.0
                    };
                    ClassShare {
                        split: split.name.clone(),
                        count,
                        percent,
                    }
                })
                .collect();

            let reference = shares[0].percent;
            let max_diff = shares[1..]
                .iter()
                .map(|s| (reference - s.percent).abs())
                .fold(0.0, f64::max);

            let status = if shares.iter().any(|s| s.count == 0) {
                ClassStatus::Missing
            } else if max_diff > tolerance {
                ClassStatus::Skewed
            } else {
                ClassStatus::Ok
            };

            ClassRow {
                class: class.to_string(),
                shares,
                max_diff,
                status,
            }
        })
        .collect();

    let passed = rows.iter().all(|row| row.status == ClassStatus::Ok);
    let totals = splits
        .iter()
        .map(|s| SplitTotal {
            split: s.name.clone(),
            count: s.labels.len(),
        })
        .collect();

    tracing::info!(
        classes = rows.len(),
        flagged = rows.iter().filter(|r| r.status != ClassStatus::Ok).count(),
        passed,
        "Distribution check complete"
    );

    Ok(DistributionReport {
        totals,
        classes: rows,
        tolerance,
        passed,
    })
}
