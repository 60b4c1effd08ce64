//! CRS consistency across a set of datasets.

use crate::models::Crs;
use serde::Serialize;

/// CRS declared by one dataset
#[derive(Debug, Clone)]
pub struct DatasetCrs {
    pub name: String,
    pub crs: Option<Crs>,
}

impl DatasetCrs {
    pub fn new(name: impl Into<String>, crs: Option<Crs>) -> Self {
        Self {
            name: name.into(),
            crs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyIssue {
    /// Dataset declares no CRS
    MissingCrs { dataset: String },
    /// Dataset CRS differs from the reference
    Mismatch {
        dataset: String,
        found: String,
        expected: String,
    },
}

impl std::fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsistencyIssue::MissingCrs { dataset } => {
                write!(f, "{}: CRS is NOT defined in metadata", dataset)
            }
            ConsistencyIssue::Mismatch {
                dataset,
                found,
                expected,
            } => write!(
                f,
                "{}: CRS mismatch (found {}, expected {})",
                dataset, found, expected
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    /// CRS every dataset is compared against
    pub reference: Option<Crs>,
    pub datasets: usize,
    pub issues: Vec<ConsistencyIssue>,
}

impl ConsistencyReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check that every dataset declares the same CRS.
///
/// The reference is `expected` when given, otherwise the first dataset that
/// declares a CRS. Every dataset is compared against the reference.
pub fn check_crs_consistency(datasets: &[DatasetCrs], expected: Option<&Crs>) -> ConsistencyReport {
    let reference = expected
        .cloned()
        .or_else(|| datasets.iter().find_map(|d| d.crs.clone()));

    let issues: Vec<ConsistencyIssue> = datasets
        .iter()
        .filter_map(|dataset| match (&dataset.crs, &reference) {
            (None, _) => Some(ConsistencyIssue::MissingCrs {
                dataset: dataset.name.clone(),
            }),
            (Some(found), Some(reference)) if !found.same_as(reference) => {
                Some(ConsistencyIssue::Mismatch {
                    dataset: dataset.name.clone(),
                    found: found.identifier(),
                    expected: reference.identifier(),
                })
            }
            _ => None,
        })
        .collect();

    for issue in &issues {
        tracing::debug!(%issue, "CRS consistency issue");
    }

    ConsistencyReport {
        reference,
        datasets: datasets.len(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_consistent() {
        let datasets = vec![
            DatasetCrs::new("a.geojson", Some(Crs::from_epsg(32649))),
            DatasetCrs::new("b.shp", Some(Crs::from_epsg(32649))),
        ];
        let report = check_crs_consistency(&datasets, None);
        assert!(report.passed());
        assert_eq!(report.reference, Some(Crs::from_epsg(32649)));
    }

    #[test]
    fn test_mismatch_and_missing() {
        let datasets = vec![
            DatasetCrs::new("a.geojson", Some(Crs::from_epsg(32649))),
            DatasetCrs::new("b.geojson", Some(Crs::from_epsg(32650))),
            DatasetCrs::new("c.geojson", None),
        ];
        let report = check_crs_consistency(&datasets, None);

        assert_eq!(report.issues.len(), 2);
        assert_eq!(
            report.issues[0],
            ConsistencyIssue::Mismatch {
                dataset: "b.geojson".to_string(),
                found: "EPSG:32650".to_string(),
                expected: "EPSG:32649".to_string(),
            }
        );
        assert!(report.issues[1].to_string().contains("NOT defined"));
    }

    #[test]
    fn test_expected_crs_overrides_first_dataset() {
        let datasets = vec![DatasetCrs::new("a.geojson", Some(Crs::wgs84()))];
        let report = check_crs_consistency(&datasets, Some(&Crs::from_epsg(32649)));
        assert!(!report.passed());
        assert_eq!(report.reference, Some(Crs::from_epsg(32649)));
    }

    #[test]
    fn test_expected_crs_checks_every_dataset() {
        let datasets = vec![
            DatasetCrs::new("a.geojson", Some(Crs::wgs84())),
            DatasetCrs::new("b.geojson", Some(Crs::wgs84())),
            DatasetCrs::new("c.shp", Some(Crs::from_epsg(32649))),
        ];
        let report = check_crs_consistency(&datasets, Some(&Crs::from_epsg(32649)));

        let flagged: Vec<_> = report
            .issues
            .iter()
            .map(|issue| match issue {
                ConsistencyIssue::Mismatch { dataset, .. } => dataset.as_str(),
                ConsistencyIssue::MissingCrs { dataset } => dataset.as_str(),
            })
            .collect();
        assert_eq!(flagged, vec!["a.geojson", "b.geojson"]);
    }

    #[test]
    fn test_reference_skips_datasets_without_crs() {
        let datasets = vec![
            DatasetCrs::new("a.geojson", None),
            DatasetCrs::new("b.geojson", Some(Crs::wgs84())),
        ];
        let report = check_crs_consistency(&datasets, None);
        assert_eq!(report.reference, Some(Crs::wgs84()));
        assert_eq!(report.issues.len(), 1);
    }
}
