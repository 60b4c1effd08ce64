//! Point collections: one representative coordinate per geometry.

use geo::Coord;
use geogate_core::models::Crs;
use geogate_core::{GeogateError, Result};

/// Ordered coordinates sharing a single CRS.
///
/// Immutable once built; every coordinate is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCollection {
    crs: Crs,
    coords: Vec<Coord<f64>>,
}

impl PointCollection {
    /// Build a collection, rejecting non-finite coordinates
    pub fn new(crs: Crs, coords: Vec<Coord<f64>>) -> Result<Self> {
        let finite = |c: &Coord<f64>| c.x.is_finite() && c.y.is_finite();
        if let Some(pos) = coords.iter().position(|c| !finite(c)) {
            let bad = coords[pos];
            return Err(GeogateError::InvalidGeometry {
                feature_id: pos.to_string(),
                reason: format!("non-finite coordinate ({}, {})", bad.x, bad.y),
            });
        }
        Ok(Self { crs, coords })
    }

    /// Build a collection from `(x, y)` pairs
    pub fn from_xy(crs: Crs, xy: &[(f64, f64)]) -> Result<Self> {
        Self::new(crs, xy.iter().map(|&(x, y)| Coord { x, y }).collect())
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<Coord<f64>> {
        self.coords.get(idx).copied()
    }
}
