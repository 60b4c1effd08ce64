//! Representative points for vector layers.
//!
//! Points keep their coordinate; every other geometry is reduced to its
//! centroid. Output order follows feature order.

use geo::{Centroid, Coord, Geometry};
use geogate_core::models::{Crs, Feature, Layer};
use geogate_core::{GeogateError, Result};

use crate::points::PointCollection;

/// Representative coordinate of one geometry
pub fn representative_coord(geometry: &Geometry<f64>, feature_id: &str) -> Result<Coord<f64>> {
    let coord = match geometry {
        Geometry::Point(p) => p.0,
        other => other
            .centroid()
            .map(|p| p.0)
            .ok_or_else(|| GeogateError::InvalidGeometry {
                feature_id: feature_id.to_string(),
                reason: "empty geometry has no centroid".to_string(),
            })?,
    };

    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(GeogateError::InvalidGeometry {
            feature_id: feature_id.to_string(),
            reason: format!("non-finite coordinate ({}, {})", coord.x, coord.y),
        });
    }

    Ok(coord)
}

/// Extract one point per feature of a layer.
///
/// Each feature uses its own CRS when it declares one and the layer CRS
/// otherwise. All features must resolve to the same CRS.
pub fn extract_points(layer: &Layer) -> Result<PointCollection> {
    let mut shared: Option<&Crs> = layer.crs.as_ref();
    let mut coords = Vec::with_capacity(layer.len());

    for feature in &layer.features {
        let crs = feature_crs(layer, feature)?;
        match shared {
            Some(existing) if !existing.same_as(crs) => {
                return Err(GeogateError::CrsMismatch {
                    reference_crs: existing.identifier(),
                    query_crs: format!("{} (feature {})", crs.identifier(), feature.id),
                });
            }
            Some(_) => {}
            None => shared = Some(crs),
        }

        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| GeogateError::InvalidGeometry {
                feature_id: feature.id.clone(),
                reason: "feature has no geometry".to_string(),
            })?;
        coords.push(representative_coord(geometry, &feature.id)?);
    }

    let crs = shared.cloned().ok_or_else(|| GeogateError::MissingCrs {
        subject: format!("layer '{}'", layer.name),
    })?;

    tracing::debug!(layer = %layer.name, points = coords.len(), crs = %crs, "Extracted points");
    PointCollection::new(crs, coords)
}

fn feature_crs<'a>(layer: &'a Layer, feature: &'a Feature) -> Result<&'a Crs> {
    feature
        .crs
        .as_ref()
        .or(layer.crs.as_ref())
        .ok_or_else(|| GeogateError::MissingCrs {
            subject: format!("feature {} in layer '{}'", feature.id, layer.name),
        })
}
