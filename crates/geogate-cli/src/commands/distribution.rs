//! Distribution command implementation

use crate::cli::DistributionArgs;
use crate::commands::Outcome;
use crate::config_loader::load_config;
use crate::loader::load_layers;
use crate::output::OutputWriter;
use crate::output_types::DistributionOutput;
use anyhow::Result;
use chrono::Utc;
use console::style;
use geogate_core::checks::{check_distribution, ClassRow, ClassStatus, LabelledSplit};
use geogate_core::config::CliConfigOverrides;
use std::path::Path;
use tabled::Tabled;

const SPLIT_NAMES: [&str; 3] = ["train", "val", "test"];

pub async fn execute(
    args: DistributionArgs,
    config_path: Option<&Path>,
    output: &OutputWriter,
) -> Result<Outcome> {
    let overrides = CliConfigOverrides {
        skew_tolerance: args.tolerance,
        ..Default::default()
    };
    let config = load_config(config_path, overrides)?;

    let paths = [args.train.clone(), args.val.clone(), args.test.clone()];
    let layers = load_layers(&paths, None).await?;

    let splits = SPLIT_NAMES
        .iter()
        .zip(&layers)
        .map(|(name, layer)| LabelledSplit::from_layer(*name, layer, &args.col))
        .collect::<geogate_core::Result<Vec<_>>>()?;

    let report = check_distribution(&splits, config.skew_tolerance.value)?;
    let outcome = Outcome::from_passed(report.passed);

    if output.is_json() {
        output.result(
            outcome.status(),
            DistributionOutput {
                checked_at: Utc::now(),
                column: args.col,
                report,
            },
        )?;
        return Ok(outcome);
    }

    output.section(format!("Class Distribution: '{}'", args.col));
    for total in &report.totals {
        output.kv(&total.split, format!("{} samples", total.count));
    }
    output.kv("Tolerance", format!("{}%", report.tolerance));
    println!();

    #[derive(Tabled)]
    struct ClassTableRow {
        #[tabled(rename = "Class")]
        class: String,
        #[tabled(rename = "Train")]
        train: String,
        #[tabled(rename = "Val")]
        val: String,
        #[tabled(rename = "Test")]
        test: String,
        #[tabled(rename = "Max diff")]
        max_diff: String,
        #[tabled(rename = "Status")]
        status: String,
    }

    let rows: Vec<ClassTableRow> = report
        .classes
        .iter()
        .map(|row| ClassTableRow {
            class: row.class.clone(),
            train: share_cell(row, 0),
            val: share_cell(row, 1),
            test: share_cell(row, 2),
            max_diff: format!("{:.2}", row.max_diff),
            status: status_cell(row.status),
        })
        .collect();
    output.table(rows);

    println!();
    if report.passed {
        output.success("PASSED: class shares are consistent across splits");
    } else {
        output.failure(format!(
            "FAILED: {} of {} classes are skewed or missing",
            report.flagged().count(),
            report.classes.len()
        ));
    }

    Ok(outcome)
}

fn share_cell(row: &ClassRow, split: usize) -> String {
    row.shares
        .get(split)
        .map(|share| format!("{} ({:.2}%)", share.count, share.percent))
        .unwrap_or_default()
}

fn status_cell(status: ClassStatus) -> String {
    match status {
        ClassStatus::Ok => style("OK").green().to_string(),
        ClassStatus::Skewed => style("SKEWED").yellow().to_string(),
        ClassStatus::Missing => style("MISSING").red().to_string(),
    }
}
