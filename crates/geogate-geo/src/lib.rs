//! geogate geo - point extraction, spatial indexing and leakage detection
//!
//! The leakage pipeline runs in four steps: [`extract_points`] reduces each
//! geometry to one coordinate, [`SpatialIndex`] is built once from the
//! training points, a single batch query finds every test point's nearest
//! training point, and [`classify`] turns those distances into a
//! [`DistanceReport`].

pub mod extract;
pub mod index;
mod kdtree;
pub mod leakage;
pub mod points;

pub use extract::{extract_points, representative_coord};
pub use index::{
    DistanceMetric, IndexOptions, NearestNeighborIndex, Neighbor, SpatialIndex, DEFAULT_LEAF_SIZE,
};
pub use leakage::{
    check_leakage, check_leakage_with, classify, DistanceReport, LeakageCheck, Verdict,
};
pub use points::PointCollection;
