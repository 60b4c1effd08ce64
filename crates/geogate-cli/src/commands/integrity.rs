//! Integrity command implementation

use crate::cli::IntegrityArgs;
use crate::commands::Outcome;
use crate::loader::{collect_dataset_paths, load_layers, summarize};
use crate::output::OutputWriter;
use crate::output_types::IntegrityOutput;
use anyhow::{bail, Result};
use chrono::Utc;
use console::style;
use geogate_core::checks::{check_crs_consistency, ConsistencyIssue, DatasetCrs};
use tabled::Tabled;

pub async fn execute(args: IntegrityArgs, output: &OutputWriter) -> Result<Outcome> {
    let (paths, skipped) = collect_dataset_paths(&args.paths)?;
    if paths.is_empty() {
        bail!("No GeoJSON or Shapefile datasets found in the given paths");
    }

    // Declared CRSs are checked as-is; no fallback
    let layers = load_layers(&paths, None).await?;

    let datasets: Vec<DatasetCrs> = paths
        .iter()
        .zip(&layers)
        .map(|(path, layer)| DatasetCrs::new(path.display().to_string(), layer.crs.clone()))
        .collect();
    let report = check_crs_consistency(&datasets, args.crs.as_ref());
    let passed = report.passed();
    let outcome = Outcome::from_passed(passed);

    if output.is_json() {
        output.result(
            outcome.status(),
            IntegrityOutput {
                checked_at: Utc::now(),
                datasets: paths
                    .iter()
                    .zip(&layers)
                    .map(|(p, l)| summarize(p, l))
                    .collect(),
                skipped: skipped.iter().map(|p| p.display().to_string()).collect(),
                report,
                passed,
            },
        )?;
        return Ok(outcome);
    }

    output.section("CRS Consistency");
    match &report.reference {
        Some(reference) => output.kv("Reference CRS", reference),
        None => output.kv("Reference CRS", "none"),
    }
    println!();

    #[derive(Tabled)]
    struct DatasetRow {
        #[tabled(rename = "Dataset")]
        dataset: String,
        #[tabled(rename = "Features")]
        features: usize,
        #[tabled(rename = "CRS")]
        crs: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<DatasetRow> = datasets
        .iter()
        .zip(&layers)
        .map(|(dataset, layer)| {
            let issue = report
                .issues
                .iter()
                .find(|issue| issue_dataset(issue) == dataset.name);
            let crs = dataset
                .crs
                .as_ref()
                .map(|c| c.identifier())
                .unwrap_or_else(|| "-".into());
            DatasetRow {
                dataset: dataset.name.clone(),
                features: layer.len(),
                crs,
                status: match issue {
                    None => style("OK").green().to_string(),
                    Some(ConsistencyIssue::MissingCrs { .. }) => style("MISSING").red().to_string(),
                    Some(ConsistencyIssue::Mismatch { .. }) => style("MISMATCH").red().to_string(),
                },
            }
        })
        .collect();
    output.table(rows);

    for path in &skipped {
        output.info(format!("Skipped unsupported file {}", path.display()));
    }

    println!();
    if passed {
        output.success(format!("PASSED: {} datasets share one CRS", report.datasets));
    } else {
        for issue in &report.issues {
            output.error(issue);
        }
        output.failure(format!("FAILED: {} CRS issues found", report.issues.len()));
    }

    Ok(outcome)
}

fn issue_dataset(issue: &ConsistencyIssue) -> &str {
    match issue {
        ConsistencyIssue::MissingCrs { dataset } => dataset,
        ConsistencyIssue::Mismatch { dataset, .. } => dataset,
    }
}
