//! Leakage pipeline ordering, checked with an instrumented index

use geogate_core::models::{Crs, Feature, Layer};
use geogate_core::GeogateError;
use geogate_geo::{
    check_leakage, check_leakage_with, extract_points, DistanceMetric, IndexOptions,
    NearestNeighborIndex, Neighbor, PointCollection, SpatialIndex, Verdict,
};
use std::sync::atomic::{AtomicUsize, Ordering};

static BUILDS: AtomicUsize = AtomicUsize::new(0);

/// Counts builds and delegates to the k-d tree index
struct CountingIndex(SpatialIndex);

impl NearestNeighborIndex for CountingIndex {
    fn build(reference: &PointCollection, options: &IndexOptions) -> geogate_core::Result<Self> {
        BUILDS.fetch_add(1, Ordering::SeqCst);
        SpatialIndex::build(reference, options).map(CountingIndex)
    }

    fn crs(&self) -> &Crs {
        self.0.crs()
    }

    fn metric(&self) -> DistanceMetric {
        self.0.metric()
    }

    fn query_neighbors(&self, query: &PointCollection) -> geogate_core::Result<Vec<Neighbor>> {
        self.0.query_neighbors(query)
    }
}

fn points(crs: Crs, xy: &[(f64, f64)]) -> PointCollection {
    PointCollection::from_xy(crs, xy).unwrap()
}

// Single test so the shared build counter is not raced by parallel tests
#[test]
fn test_failures_before_build_skip_the_index() {
    let utm = Crs::from_epsg(32649);
    let options = IndexOptions::default();

    let result = check_leakage_with::<CountingIndex>(
        &points(utm.clone(), &[(0.0, 0.0)]),
        &points(Crs::from_epsg(32650), &[(0.0, 0.0)]),
        1.0,
        &options,
    );
    assert!(matches!(result, Err(GeogateError::CrsMismatch { .. })));
    assert_eq!(BUILDS.load(Ordering::SeqCst), 0);

    let result = check_leakage_with::<CountingIndex>(
        &points(utm.clone(), &[(0.0, 0.0)]),
        &points(utm.clone(), &[(0.0, 0.0)]),
        -1.0,
        &options,
    );
    assert!(matches!(result, Err(GeogateError::InvalidThreshold { .. })));
    assert_eq!(BUILDS.load(Ordering::SeqCst), 0);

    let check = check_leakage_with::<CountingIndex>(
        &points(utm.clone(), &[(0.0, 0.0), (50.0, 50.0)]),
        &points(utm, &[(3.0, 4.0)]),
        5.0,
        &options,
    )
    .unwrap();
    assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
    assert_eq!(check.neighbors.len(), 1);
    assert_eq!(check.neighbors[0].index, 0);
    assert_eq!(check.neighbors[0].distance, 5.0);
    assert_eq!(check.report.verdict, Verdict::Failed);
}

#[test]
fn test_layers_end_to_end() {
    let utm = Crs::from_epsg(32649);
    let square = geo::Rect::new((0.0, 0.0), (20.0, 20.0)).to_polygon();

    let train = Layer::new(
        "train",
        Some(utm.clone()),
        vec![
            Feature::new("0", geo::Geometry::Polygon(square)),
            Feature::new("1", geo::Geometry::Point(geo::Point::new(500.0, 500.0))),
        ],
    );
    let test = Layer::new(
        "test",
        Some(utm),
        vec![
            Feature::new("0", geo::Geometry::Point(geo::Point::new(10.0, 40.0))),
            Feature::new("1", geo::Geometry::Point(geo::Point::new(900.0, 900.0))),
        ],
    );

    let train_points = extract_points(&train).unwrap();
    let test_points = extract_points(&test).unwrap();
    let check = check_leakage(&train_points, &test_points, 35.0, &IndexOptions::default()).unwrap();

    assert_eq!(check.report.total, 2);
    assert_eq!(check.report.violations, vec![0]);
    assert_eq!(check.neighbors[0].index, 0);
    assert!((check.report.min_distance.unwrap() - 30.0).abs() < 1e-9);
    assert_eq!(check.report.violation_rate, 0.5);
}

#[test]
fn test_missing_crs_layer_is_rejected_by_extractor() {
    let point = geo::Geometry::Point(geo::Point::new(1.0, 1.0));
    let layer = Layer::new("test", None, vec![Feature::new("0", point)]);
    let result = extract_points(&layer);
    assert!(matches!(result, Err(GeogateError::MissingCrs { .. })));

    let fallback = layer.with_fallback_crs(Some(&Crs::from_epsg(32649)));
    assert!(extract_points(&fallback).is_ok());
}
