//! GeoJSON format reader implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{GeogateError, Result};
use crate::formats::{layer_name, FormatReader};
use crate::models::{Crs, Feature, Layer};

/// GeoJSON format reader
pub struct GeoJsonReader;

#[async_trait]
impl FormatReader for GeoJsonReader {
    async fn read(&self, path: &Path) -> Result<Layer> {
        let content = std::fs::read_to_string(path)?;
        parse_layer(&content, layer_name(path))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["geojson", "json"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

/// Parse GeoJSON text into a layer
pub fn parse_layer(content: &str, name: impl Into<String>) -> Result<Layer> {
    let geojson: geojson::GeoJson = content.parse().map_err(|e| GeogateError::FormatError {
        format: "GeoJSON".to_string(),
        message: format!("Failed to parse GeoJSON: {}", e),
    })?;

    match geojson {
        geojson::GeoJson::FeatureCollection(fc) => {
            // Legacy (2008) "crs" member
            let declared = fc
                .foreign_members
                .as_ref()
                .and_then(|fm| fm.get("crs"))
                .map(parse_crs_member)
                .transpose()?;

            let features = fc
                .features
                .into_iter()
                .enumerate()
                .map(|(idx, feature)| convert_feature(feature, idx))
                .collect::<Result<Vec<_>>>()?;

            let crs = declared.or_else(|| rfc7946_crs(&features));
            Ok(Layer::new(name, crs, features))
        }
        geojson::GeoJson::Feature(feature) => {
            let feature = convert_feature(feature, 0)?;
            let features = vec![feature];
            let crs = rfc7946_crs(&features);
            Ok(Layer::new(name, crs, features))
        }
        geojson::GeoJson::Geometry(geometry) => {
            let geometry = convert_geometry(geometry, "0")?;
            let feature = Feature {
                id: "0".to_string(),
                geometry,
                crs: None,
                properties: HashMap::new(),
            };
            Ok(Layer::new(name, Some(Crs::wgs84()), vec![feature]))
        }
    }
}

/// Convert a GeoJSON feature
fn convert_feature(feature: geojson::Feature, idx: usize) -> Result<Feature> {
    let id = feature
        .id
        .as_ref()
        .map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
        .unwrap_or_else(|| idx.to_string());

    let crs = feature
        .foreign_members
        .as_ref()
        .and_then(|fm| fm.get("crs"))
        .map(parse_crs_member)
        .transpose()?;

    let geometry = match feature.geometry {
        Some(geometry) => convert_geometry(geometry, &id)?,
        None => None,
    };

    let properties = feature
        .properties
        .map(|props| props.into_iter().collect())
        .unwrap_or_default();

    Ok(Feature {
        id,
        geometry,
        crs,
        properties,
    })
}

fn convert_geometry(
    geometry: geojson::Geometry,
    feature_id: &str,
) -> Result<Option<geo::Geometry<f64>>> {
    geo::Geometry::<f64>::try_from(geometry)
        .map(Some)
        .map_err(|e| GeogateError::InvalidGeometry {
            feature_id: feature_id.to_string(),
            reason: e.to_string(),
        })
}

/// CRS of a file without a top-level `crs` member.
///
/// RFC 7946 fixes such files to CRS84 (WGS 84 longitude/latitude). Files
/// that declare `crs` on their features instead keep the per-feature values.
fn rfc7946_crs(features: &[Feature]) -> Option<Crs> {
    if features.iter().any(|f| f.crs.is_some()) {
        None
    } else {
        Some(Crs::wgs84())
    }
}

/// Parse a legacy `crs` member: `{"type": "name", "properties": {"name": "EPSG:32649"}}`
fn parse_crs_member(crs: &serde_json::Value) -> Result<Crs> {
    let name = crs
        .get("properties")
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str())
        .ok_or_else(|| GeogateError::InvalidCrs {
            value: crs.to_string(),
            reason: "expected a named CRS with properties.name".to_string(),
        })?;

    name.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_collection_with_crs() {
        let content = r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32649"}},
            "features": [
                {
                    "type": "Feature",
                    "id": "plot-1",
                    "geometry": {"type": "Point", "coordinates": [500000.0, 100000.0]},
                    "properties": {"landcover_id": 2}
                },
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
                    },
                    "properties": {"landcover_id": 5}
                }
            ]
        }"#;

        let layer = parse_layer(content, "train").unwrap();

        assert_eq!(layer.name, "train");
        assert_eq!(layer.crs, Some(Crs::from_epsg(32649)));
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.features[0].id, "plot-1");
        assert_eq!(layer.features[1].id, "1");
        assert!(matches!(
            layer.features[1].geometry,
            Some(geo::Geometry::Polygon(_))
        ));
        assert_eq!(
            layer.features[0].properties["landcover_id"],
            serde_json::json!(2)
        );
    }

    #[test]
    fn test_feature_collection_without_crs_is_wgs84() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [110.0, -7.0]},
                    "properties": {}
                }
            ]
        }"#;
        let layer = parse_layer(content, "train").unwrap();

        let crs = layer.crs.unwrap();
        assert_eq!(crs, Crs::wgs84());
        assert!(crs.is_geographic());
    }

    #[test]
    fn test_empty_feature_collection_is_wgs84() {
        let content = r#"{"type": "FeatureCollection", "features": []}"#;
        let layer = parse_layer(content, "empty").unwrap();
        assert_eq!(layer.crs, Some(Crs::wgs84()));
        assert!(layer.is_empty());
    }

    #[test]
    fn test_bare_feature_and_geometry_are_wgs84() {
        let feature = r#"{
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
            "properties": {}
        }"#;
        assert_eq!(parse_layer(feature, "one").unwrap().crs, Some(Crs::wgs84()));

        let geometry = r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#;
        assert_eq!(
            parse_layer(geometry, "one").unwrap().crs,
            Some(Crs::wgs84())
        );
    }

    #[test]
    fn test_feature_level_crs_is_not_overridden() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [500000.0, 100000.0]},
                    "properties": {},
                    "crs": {"type": "name", "properties": {"name": "EPSG:32649"}}
                }
            ]
        }"#;
        let layer = parse_layer(content, "train").unwrap();
        assert!(layer.crs.is_none());
        assert_eq!(layer.features[0].crs, Some(Crs::from_epsg(32649)));
    }

    #[test]
    fn test_null_geometry_is_kept() {
        let content = r#"{
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "geometry": null, "properties": {}}]
        }"#;
        let layer = parse_layer(content, "nulls").unwrap();
        assert_eq!(layer.len(), 1);
        assert!(layer.features[0].geometry.is_none());
    }

    #[test]
    fn test_invalid_crs_member_is_an_error() {
        let content = r#"{
            "type": "FeatureCollection",
            "crs": {"type": "name", "properties": {"name": "EPSG:not-a-code"}},
            "features": []
        }"#;
        assert!(matches!(
            parse_layer(content, "bad"),
            Err(GeogateError::InvalidCrs { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let result = parse_layer("{not json", "bad");
        assert!(matches!(result, Err(GeogateError::FormatError { .. })));
    }
}
