//! Property tests: the k-d tree query engine against brute force

use geo::{Coord, Distance, Haversine, Point};
use geogate_core::models::{Crs, GeographicMetric};
use geogate_geo::{classify, IndexOptions, NearestNeighborIndex, PointCollection, SpatialIndex};
use proptest::prelude::*;

fn planar_points(max: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-1000.0f64..1000.0, -1000.0f64..1000.0), 1..max)
}

fn lon_lat_points(max: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-180.0f64..180.0, -85.0f64..85.0), 1..max)
}

fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

proptest! {
    /// Property: one non-negative distance per query point, never more than
    /// the distance to any single reference point, and attained by some point.
    #[test]
    fn prop_nearest_matches_brute_force(
        reference in planar_points(200),
        query in planar_points(60),
        leaf_size in 1usize..32,
    ) {
        let crs = Crs::from_epsg(32649);
        let options = IndexOptions {
            leaf_size,
            ..Default::default()
        };
        let points = PointCollection::from_xy(crs.clone(), &reference).unwrap();
        let index = SpatialIndex::build(&points, &options).unwrap();

        let queries = PointCollection::from_xy(crs, &query).unwrap();
        let distances = index.query_nearest(&queries).unwrap();

        prop_assert_eq!(distances.len(), query.len());
        for (q, d) in query.iter().zip(&distances) {
            prop_assert!(*d >= 0.0);
            let brute = reference
                .iter()
                .map(|r| euclidean(*r, *q))
                .fold(f64::INFINITY, f64::min);
            prop_assert!(*d <= brute + 1e-9);
            prop_assert!((*d - brute).abs() < 1e-9);
        }
    }

    /// Property: leaf size tunes speed only; results never change.
    #[test]
    fn prop_leaf_size_does_not_change_results(
        reference in planar_points(150),
        query in planar_points(40),
        leaf_size in 1usize..20,
    ) {
        let crs = Crs::from_epsg(3857);
        let reference = PointCollection::from_xy(crs.clone(), &reference).unwrap();
        let query = PointCollection::from_xy(crs, &query).unwrap();

        let scan = IndexOptions {
            leaf_size: reference.len(),
            parallel: false,
            ..Default::default()
        };
        let tree = IndexOptions {
            leaf_size,
            ..Default::default()
        };

        let scan_index = SpatialIndex::build(&reference, &scan).unwrap();
        let tree_index = SpatialIndex::build(&reference, &tree).unwrap();
        let expected = scan_index.query_neighbors(&query).unwrap();
        let actual = tree_index.query_neighbors(&query).unwrap();
        prop_assert_eq!(expected, actual);
    }

    /// Property: a query point that is also a reference point reports distance 0.
    #[test]
    fn prop_shared_point_has_zero_distance(
        reference in planar_points(100),
        pick in any::<prop::sample::Index>(),
    ) {
        let crs = Crs::from_epsg(32749);
        let shared = reference[pick.index(reference.len())];
        let points = PointCollection::from_xy(crs.clone(), &reference).unwrap();
        let index = SpatialIndex::build(&points, &IndexOptions::default()).unwrap();

        let queries = PointCollection::from_xy(crs, &[shared]).unwrap();
        let distances = index.query_nearest(&queries).unwrap();
        prop_assert_eq!(distances, vec![0.0]);
    }

    /// Property: great-circle mode finds the true great-circle nearest point.
    #[test]
    fn prop_haversine_matches_brute_force(
        reference in lon_lat_points(120),
        query in lon_lat_points(30),
    ) {
        let options = IndexOptions {
            geographic_metric: GeographicMetric::Haversine,
            leaf_size: 4,
            ..Default::default()
        };
        let points = PointCollection::from_xy(Crs::wgs84(), &reference).unwrap();
        let index = SpatialIndex::build(&points, &options).unwrap();

        let queries = PointCollection::from_xy(Crs::wgs84(), &query).unwrap();
        let distances = index.query_nearest(&queries).unwrap();

        for (q, d) in query.iter().zip(&distances) {
            let qp = Point::from(Coord { x: q.0, y: q.1 });
            let brute = reference
                .iter()
                .map(|r| Haversine.distance(Point::new(r.0, r.1), qp))
                .fold(f64::INFINITY, f64::min);
            // Chord and arc orderings agree up to rounding
            prop_assert!((*d - brute).abs() < 1e-3);
        }
    }

    /// Property: violation rate stays in [0, 1] and matches the count.
    #[test]
    fn prop_violation_rate_bounds(
        distances in prop::collection::vec(0.0f64..100.0, 0..80),
        threshold in 0.0f64..100.0,
    ) {
        let report = classify(&distances, threshold).unwrap();
        prop_assert!((0.0..=1.0).contains(&report.violation_rate));
        let expected = distances.iter().filter(|d| **d <= threshold).count();
        prop_assert_eq!(report.violation_count, expected);
        prop_assert_eq!(report.total, distances.len());
    }
}
