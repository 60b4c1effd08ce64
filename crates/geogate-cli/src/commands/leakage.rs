//! Leakage command implementation

use crate::cli::LeakageArgs;
use crate::commands::Outcome;
use crate::config_loader::load_config;
use crate::loader::{load_layers, summarize};
use crate::output::{format_distance, format_percent, OutputWriter};
use crate::output_types::{LeakageOutput, ViolationDetail};
use anyhow::{Context, Result};
use chrono::Utc;
use geogate_core::config::CliConfigOverrides;
use geogate_core::models::Layer;
use geogate_geo::{check_leakage, extract_points, DistanceMetric, IndexOptions, LeakageCheck};
use std::path::Path;
use tabled::Tabled;

pub async fn execute(
    args: LeakageArgs,
    config_path: Option<&Path>,
    output: &OutputWriter,
) -> Result<Outcome> {
    let config = load_config(
        config_path,
        CliConfigOverrides {
            threshold: args.buffer,
            leaf_size: args.leaf_size,
            geographic_metric: args.metric.map(Into::into),
            parallel: args.no_parallel.then_some(false),
            assume_crs: args.assume_crs.clone(),
            ..Default::default()
        },
    )?;

    let paths = [args.train.clone(), args.test.clone()];
    let mut layers = load_layers(&paths, config.assume_crs.value.as_ref())
        .await?
        .into_iter();
    let (Some(train), Some(test)) = (layers.next(), layers.next()) else {
        anyhow::bail!("Expected a training and a test layer");
    };

    let train_points = extract_points(&train).context("Failed to extract training points")?;
    let test_points = extract_points(&test).context("Failed to extract test points")?;

    let options = IndexOptions {
        leaf_size: config.leaf_size.value,
        geographic_metric: config.geographic_metric.value,
        parallel: config.parallel.value,
    };
    let threshold = config.threshold.value;
    let check = check_leakage(&train_points, &test_points, threshold, &options)?;
    let outcome = Outcome::from_passed(check.report.passed());

    let violating_samples = args
        .show_violations
        .then(|| violation_details(&check, &train, &test));

    if output.is_json() {
        output.result(
            outcome.status(),
            LeakageOutput {
                checked_at: Utc::now(),
                train: summarize(&args.train, &train),
                test: summarize(&args.test, &test),
                metric: DistanceMetric::for_crs(train_points.crs(), options.geographic_metric),
                leaf_size: options.leaf_size,
                report: check.report,
                violating_samples,
            },
        )?;
        return Ok(outcome);
    }

    render_human(&args, &train, &test, &check, violating_samples, output);
    Ok(outcome)
}

fn violation_details(check: &LeakageCheck, train: &Layer, test: &Layer) -> Vec<ViolationDetail> {
    check
        .report
        .violations
        .iter()
        .map(|&i| {
            let neighbor = check.neighbors[i];
            ViolationDetail {
                test_feature: test.features[i].id.clone(),
                train_feature: train.features[neighbor.index].id.clone(),
                distance: neighbor.distance,
            }
        })
        .collect()
}

fn render_human(
    args: &LeakageArgs,
    train: &Layer,
    test: &Layer,
    check: &LeakageCheck,
    violating_samples: Option<Vec<ViolationDetail>>,
    output: &OutputWriter,
) {
    let report = &check.report;

    output.section("Spatial Leakage Check");
    let train_label = format!("{} ({} samples)", args.train.display(), train.len());
    let test_label = format!("{} ({} samples)", args.test.display(), test.len());
    output.kv("Train", train_label);
    output.kv("Test", test_label);
    if let Some(crs) = &train.crs {
        output.kv("CRS", crs);
    }
    output.kv("Buffer", format!("{} {}", report.threshold, report.units));
    println!();

    if let Some(warning) = &report.warning {
        output.warning(warning);
    }

    output.kv("Min distance", format_distance(report.min_distance));
    output.kv("Median distance", format_distance(report.median_distance));
    output.kv(
        "Violations",
        format!(
            "{} / {} ({})",
            report.violation_count,
            report.total,
            format_percent(report.violation_rate)
        ),
    );

    if let Some(samples) = violating_samples {
        #[derive(Tabled)]
        struct ViolationRow {
            #[tabled(rename = "Test sample")]
            test: String,
            #[tabled(rename = "Nearest train sample")]
            train: String,
            #[tabled(rename = "Distance")]
            distance: String,
        }

        output.section("Violating samples");
        output.table(
            samples
                .into_iter()
                .map(|s| ViolationRow {
                    test: s.test_feature,
                    train: s.train_feature,
                    distance: format_distance(Some(s.distance)),
                })
                .collect::<Vec<_>>(),
        );
    }

    println!();
    if report.passed() {
        output.success(format!(
            "PASSED: every test sample is farther than {} {} from the training set",
            report.threshold, report.units
        ));
    } else {
        output.failure(format!(
            "FAILED: {} test samples are within {} {} of a training sample",
            report.violation_count, report.threshold, report.units
        ));
    }
}
