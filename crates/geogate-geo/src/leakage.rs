//! Spatial leakage classification.
//!
//! A test sample leaks when its nearest training sample lies within the
//! buffer distance. The classifier turns nearest-neighbour distances into a
//! [`DistanceReport`]; [`check_leakage`] runs the whole pipeline.

use geogate_core::models::{Crs, DistanceUnit};
use geogate_core::{GeogateError, Result};
use serde::Serialize;
use std::fmt;

use crate::index::{DistanceMetric, IndexOptions, NearestNeighborIndex, Neighbor, SpatialIndex};
use crate::points::PointCollection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Passed,
    Failed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "PASSED"),
            Verdict::Failed => write!(f, "FAILED"),
        }
    }
}

/// Summary of one leakage check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceReport {
    /// Number of query points
    pub total: usize,
    /// `None` when there are no query points
    pub min_distance: Option<f64>,
    /// Average of the middle pair for even counts; `None` when empty
    pub median_distance: Option<f64>,
    pub violation_count: usize,
    /// Fraction of query points in violation, 0.0 for an empty query
    pub violation_rate: f64,
    pub threshold: f64,
    pub units: DistanceUnit,
    /// Positions of the violating query points
    pub violations: Vec<usize>,
    /// Set when the shared CRS is geographic
    pub angular_crs_warning: bool,
    pub warning: Option<String>,
    pub verdict: Verdict,
}

impl DistanceReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    /// Attach the units and the geographic-CRS warning for the shared CRS
    pub fn with_crs_annotation(mut self, crs: &Crs, metric: DistanceMetric) -> Self {
        self.units = metric.unit();
        if crs.is_geographic() {
            let message = match metric {
                DistanceMetric::Haversine => format!(
                    "CRS {} is geographic; distances are great-circle metres on a spherical earth",
                    crs.identifier()
                ),
                _ => format!(
                    "CRS {} is geographic; distances and the buffer are in degrees, not metres. \
                     Reproject both splits to a projected CRS for metric buffers",
                    crs.identifier()
                ),
            };
            tracing::warn!("{}", message);
            self.angular_crs_warning = true;
            self.warning = Some(message);
        }
        self
    }
}

/// Classify nearest-neighbour distances against a buffer threshold.
///
/// A distance equal to the threshold is a violation.
pub fn classify(distances: &[f64], threshold: f64) -> Result<DistanceReport> {
    validate_threshold(threshold)?;

    let violations: Vec<usize> = distances
        .iter()
        .enumerate()
        .filter(|(_, d)| **d <= threshold)
        .map(|(i, _)| i)
        .collect();

    let total = distances.len();
    let violation_count = violations.len();
    let violation_rate = if total == 0 {
        0.0
    } else {
        violation_count as f64 / total as f64
    };

    Ok(DistanceReport {
        total,
        min_distance: distances.iter().copied().min_by(f64::total_cmp),
        median_distance: median(distances),
        violation_count,
        violation_rate,
        threshold,
        units: DistanceUnit::CrsUnits,
        violations,
        angular_crs_warning: false,
        warning: None,
        verdict: if violation_count == 0 {
            Verdict::Passed
        } else {
            Verdict::Failed
        },
    })
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(())
    } else {
        Err(GeogateError::InvalidThreshold { value: threshold })
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Report plus the nearest training point of every test point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeakageCheck {
    pub report: DistanceReport,
    pub neighbors: Vec<Neighbor>,
}

/// Run the leakage check with the k-d tree index
pub fn check_leakage(
    reference: &PointCollection,
    query: &PointCollection,
    threshold: f64,
    options: &IndexOptions,
) -> Result<LeakageCheck> {
    check_leakage_with::<SpatialIndex>(reference, query, threshold, options)
}

/// Run the leakage check with any nearest-neighbour index.
///
/// The CRS comparison and threshold validation happen before the index is
/// built, so neither failure costs a build.
pub fn check_leakage_with<I: NearestNeighborIndex>(
    reference: &PointCollection,
    query: &PointCollection,
    threshold: f64,
    options: &IndexOptions,
) -> Result<LeakageCheck> {
    if !reference.crs().same_as(query.crs()) {
        return Err(GeogateError::CrsMismatch {
            reference_crs: reference.crs().identifier(),
            query_crs: query.crs().identifier(),
        });
    }
    validate_threshold(threshold)?;

    let index = I::build(reference, options)?;
    let neighbors = index.query_neighbors(query)?;
    let distances: Vec<f64> = neighbors.iter().map(|n| n.distance).collect();
    let report = classify(&distances, threshold)?.with_crs_annotation(index.crs(), index.metric());

    tracing::info!(
        train = reference.len(),
        test = query.len(),
        threshold,
        violations = report.violation_count,
        verdict = %report.verdict,
        "Leakage check complete"
    );

    Ok(LeakageCheck { report, neighbors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geogate_core::models::GeographicMetric;

    fn utm(xy: &[(f64, f64)]) -> PointCollection {
        PointCollection::from_xy(Crs::from_epsg(32649), xy).unwrap()
    }

    #[test]
    fn test_scenario_overlapping_points_fail() {
        let check = check_leakage(
            &utm(&[(0.0, 0.0), (10.0, 10.0)]),
            &utm(&[(0.0, 0.0), (1.0, 1.0)]),
            2.0,
            &IndexOptions::default(),
        )
        .unwrap();

        let report = &check.report;
        assert_eq!(check.neighbors.len(), 2);
        assert_eq!(check.neighbors[0].distance, 0.0);
        assert!((check.neighbors[1].distance - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(report.violation_count, 2);
        assert_eq!(report.violation_rate, 1.0);
        assert_eq!(report.violations, vec![0, 1]);
        assert_eq!(report.verdict, Verdict::Failed);
        assert_eq!(report.units, DistanceUnit::CrsUnits);
        assert!(!report.angular_crs_warning);
    }

    #[test]
    fn test_scenario_distant_points_pass() {
        let train = utm(&[(0.0, 0.0)]);
        let test = utm(&[(100.0, 100.0)]);
        let check = check_leakage(&train, &test, 5.0, &IndexOptions::default()).unwrap();

        let min = check.report.min_distance.unwrap();
        assert!((min - 141.421356).abs() < 1e-5);
        assert_eq!(check.report.violation_count, 0);
        assert!(check.report.passed());
    }

    #[test]
    fn test_scenario_geographic_crs_warns() {
        let train = PointCollection::from_xy(Crs::wgs84(), &[(110.0, -7.0)]).unwrap();
        let test = PointCollection::from_xy(Crs::wgs84(), &[(111.0, -7.0)]).unwrap();

        let check = check_leakage(&train, &test, 0.5, &IndexOptions::default()).unwrap();

        assert!(check.report.angular_crs_warning);
        assert_eq!(check.report.units, DistanceUnit::Degrees);
        assert!(check.report.warning.as_deref().unwrap().contains("degrees"));
        assert!(check.report.passed());

        let options = IndexOptions {
            geographic_metric: GeographicMetric::Haversine,
            ..Default::default()
        };
        let check = check_leakage(&train, &test, 0.5, &options).unwrap();
        assert!(check.report.angular_crs_warning);
        assert_eq!(check.report.units, DistanceUnit::Metres);
    }

    #[test]
    fn test_scenario_empty_reference() {
        let empty = utm(&[]);
        let result = check_leakage(&empty, &utm(&[(1.0, 1.0)]), 1.0, &IndexOptions::default());
        assert!(matches!(result, Err(GeogateError::EmptyReferenceSet)));
    }

    #[test]
    fn test_crs_mismatch() {
        let test = PointCollection::from_xy(Crs::wgs84(), &[(1.0, 1.0)]).unwrap();
        let result = check_leakage(&utm(&[(1.0, 1.0)]), &test, 1.0, &IndexOptions::default());
        assert!(matches!(result, Err(GeogateError::CrsMismatch { .. })));
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let at = classify(&[3.0], 3.0).unwrap();
        assert_eq!(at.violation_count, 1);

        let above = classify(&[3.0], 3.0 - 1e-9).unwrap();
        assert_eq!(above.violation_count, 0);
        assert_eq!(above.verdict, Verdict::Passed);
    }

    #[test]
    fn test_invalid_threshold() {
        let result = classify(&[1.0], -0.1);
        assert!(matches!(result, Err(GeogateError::InvalidThreshold { .. })));
        assert!(classify(&[1.0], f64::NAN).is_err());
        assert!(classify(&[1.0], f64::INFINITY).is_err());
    }

    #[test]
    fn test_empty_distances() {
        let report = classify(&[], 10.0).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.violation_rate, 0.0);
        assert_eq!(report.min_distance, None);
        assert_eq!(report.median_distance, None);
        assert!(report.passed());
    }

    #[test]
    fn test_median_even_and_odd() {
        let even = classify(&[4.0, 1.0, 3.0, 2.0], 0.0).unwrap();
        assert_eq!(even.median_distance, Some(2.5));

        let odd = classify(&[5.0, 1.0, 3.0], 0.0).unwrap();
        assert_eq!(odd.median_distance, Some(3.0));
        assert_eq!(odd.min_distance, Some(1.0));
    }

    #[test]
    fn test_zero_threshold_flags_exact_duplicates_only() {
        let report = classify(&[0.0, 0.5, 0.0], 0.0).unwrap();
        assert_eq!(report.violations, vec![0, 2]);
        assert!((report.violation_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_verdict_serializes_uppercase() {
        let json = serde_json::to_string(&Verdict::Failed).unwrap();
        assert_eq!(json, "\"FAILED\"");
    }
}
