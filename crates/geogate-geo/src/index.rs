//! Spatial index over a reference point collection and the nearest-neighbour
//! query engine.

use geo::{Coord, Distance, Haversine, Point};
use geogate_core::models::{Crs, DistanceUnit, GeographicMetric};
use geogate_core::{GeogateError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::kdtree::KdTree;
use crate::points::PointCollection;

/// Default k-d tree leaf capacity
pub const DEFAULT_LEAF_SIZE: usize = 15;

/// Tuning knobs for index construction and querying
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Maximum points per leaf; affects speed only, never results
    pub leaf_size: usize,
    pub geographic_metric: GeographicMetric,
    /// Run batch queries on the rayon thread pool
    pub parallel: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            leaf_size: DEFAULT_LEAF_SIZE,
            geographic_metric: GeographicMetric::default(),
            parallel: true,
        }
    }
}

impl IndexOptions {
    pub fn validate(&self) -> Result<()> {
        if self.leaf_size == 0 {
            return Err(GeogateError::ConfigInvalid {
                key: "leaf_size".to_string(),
                reason: "leaf size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Distance actually computed between two points of a CRS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Planar distance in projected CRS units
    Euclidean,
    /// Planar distance over longitude/latitude, in degrees
    Angular,
    /// Great-circle distance in metres
    Haversine,
}

impl DistanceMetric {
    /// Metric used for a CRS: projected systems are always Euclidean
    pub fn for_crs(crs: &Crs, geographic: GeographicMetric) -> Self {
        match (crs.is_geographic(), geographic) {
            (false, _) => DistanceMetric::Euclidean,
            (true, GeographicMetric::Degrees) => DistanceMetric::Angular,
            (true, GeographicMetric::Haversine) => DistanceMetric::Haversine,
        }
    }

    pub fn unit(&self) -> DistanceUnit {
        match self {
            DistanceMetric::Euclidean => DistanceUnit::CrsUnits,
            DistanceMetric::Angular => DistanceUnit::Degrees,
            DistanceMetric::Haversine => DistanceUnit::Metres,
        }
    }

    /// Distance between two coordinates under this metric
    pub fn distance(&self, a: Coord<f64>, b: Coord<f64>) -> f64 {
        match self {
            DistanceMetric::Euclidean | DistanceMetric::Angular => {
                ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
            }
            DistanceMetric::Haversine => Haversine.distance(Point::from(a), Point::from(b)),
        }
    }
}

/// Nearest reference point of one query point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Position of the reference point in the reference collection
    pub index: usize,
    pub distance: f64,
}

/// Build-once, query-many nearest-neighbour index
pub trait NearestNeighborIndex: Sized {
    /// Build from a non-empty reference collection
    fn build(reference: &PointCollection, options: &IndexOptions) -> Result<Self>;

    /// CRS of the reference collection
    fn crs(&self) -> &Crs;

    fn metric(&self) -> DistanceMetric;

    /// Nearest reference point for every query point, aligned by position
    fn query_neighbors(&self, query: &PointCollection) -> Result<Vec<Neighbor>>;

    /// Nearest-neighbour distance for every query point, aligned by position
    fn query_nearest(&self, query: &PointCollection) -> Result<Vec<f64>> {
        Ok(self
            .query_neighbors(query)?
            .into_iter()
            .map(|n| n.distance)
            .collect())
    }
}

#[derive(Debug, Clone)]
enum Tree {
    Planar(KdTree<2>),
    /// Unit vectors on the sphere; chord length orders points like arc length
    Spherical(KdTree<3>),
}

/// k-d tree index owning a copy of the reference coordinates
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    crs: Crs,
    metric: DistanceMetric,
    reference: Vec<Coord<f64>>,
    tree: Tree,
    parallel: bool,
}

impl SpatialIndex {
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    fn nearest(&self, coord: Coord<f64>) -> Result<Neighbor> {
        let hit = match &self.tree {
            Tree::Planar(tree) => tree.nearest(&[coord.x, coord.y]),
            Tree::Spherical(tree) => tree.nearest(&unit_vector(coord)),
        };
        let (index, _) = hit.ok_or(GeogateError::EmptyReferenceSet)?;

        // Recompute from the original coordinates so reported values carry the metric's units
        let distance = self.metric.distance(self.reference[index], coord);
        Ok(Neighbor { index, distance })
    }
}

impl NearestNeighborIndex for SpatialIndex {
    fn build(reference: &PointCollection, options: &IndexOptions) -> Result<Self> {
        options.validate()?;
        if reference.is_empty() {
            return Err(GeogateError::EmptyReferenceSet);
        }

        let started = Instant::now();
        let metric = DistanceMetric::for_crs(reference.crs(), options.geographic_metric);
        let coords = reference.coords();
        let tree = match metric {
            DistanceMetric::Haversine => Tree::Spherical(KdTree::build(
                coords.iter().map(|&c| unit_vector(c)).collect(),
                options.leaf_size,
            )),
            DistanceMetric::Euclidean | DistanceMetric::Angular => Tree::Planar(KdTree::build(
                coords.iter().map(|c| [c.x, c.y]).collect(),
                options.leaf_size,
            )),
        };

        tracing::debug!(
            points = coords.len(),
            leaf_size = options.leaf_size,
            ?metric,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built spatial index"
        );

        Ok(Self {
            crs: reference.crs().clone(),
            metric,
            reference: coords.to_vec(),
            tree,
            parallel: options.parallel,
        })
    }

    fn crs(&self) -> &Crs {
        &self.crs
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn query_neighbors(&self, query: &PointCollection) -> Result<Vec<Neighbor>> {
        if !query.crs().same_as(&self.crs) {
            return Err(GeogateError::CrsMismatch {
                reference_crs: self.crs.identifier(),
                query_crs: query.crs().identifier(),
            });
        }

        let started = Instant::now();
        let neighbors = if self.parallel {
            query
                .coords()
                .par_iter()
                .map(|&c| self.nearest(c))
                .collect::<Result<Vec<_>>>()?
        } else {
            query
                .coords()
                .iter()
                .map(|&c| self.nearest(c))
                .collect::<Result<Vec<_>>>()?
        };

        tracing::debug!(
            queries = neighbors.len(),
            parallel = self.parallel,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Nearest-neighbour query complete"
        );

        Ok(neighbors)
    }
}

/// Longitude/latitude in degrees to a point on the unit sphere
fn unit_vector(coord: Coord<f64>) -> [f64; 3] {
    let (lon, lat) = (coord.x.to_radians(), coord.y.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}
