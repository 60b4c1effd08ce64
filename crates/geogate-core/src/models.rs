pub mod crs;
pub mod distance;
pub mod layer;

pub use crs::{Crs, CrsKind};
pub use distance::{DistanceUnit, GeographicMetric};
pub use layer::{Feature, Layer};
