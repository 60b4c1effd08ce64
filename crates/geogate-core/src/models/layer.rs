//! Vector layers as handed over by the format readers.

use crate::models::crs::Crs;
use serde_json::Value;
use std::collections::HashMap;

/// A single feature: optional geometry plus attribute table row
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature identifier (source id or ordinal)
    pub id: String,

    /// Geometry, `None` for null shapes / features without geometry
    pub geometry: Option<geo::Geometry<f64>>,

    /// Per-feature CRS override; features inherit the layer CRS when `None`
    pub crs: Option<Crs>,

    /// Attribute values
    pub properties: HashMap<String, Value>,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: geo::Geometry<f64>) -> Self {
        Self {
            id: id.into(),
            geometry: Some(geometry),
            crs: None,
            properties: HashMap::new(),
        }
    }

    /// Set an attribute value
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Override the CRS inherited from the layer
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }
}

/// An ordered collection of features read from one file
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Layer name (file stem by default)
    pub name: String,

    /// Layer-level CRS, `None` when the source declares none
    pub crs: Option<Crs>,

    pub features: Vec<Feature>,
}

impl Layer {
    pub fn new(name: impl Into<String>, crs: Option<Crs>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            crs,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Fill in a CRS for layers whose source declared none
    pub fn with_fallback_crs(mut self, fallback: Option<&Crs>) -> Self {
        if self.crs.is_none() {
            if let Some(crs) = fallback {
                tracing::debug!(
                    layer = %self.name,
                    crs = %crs,
                    "Assuming CRS for layer without one"
                );
                self.crs = Some(crs.clone());
            }
        }
        self
    }

    /// Whether any feature carries the given attribute
    pub fn has_property(&self, key: &str) -> bool {
        self.features.iter().any(|f| f.properties.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_crs_only_fills_missing() {
        let layer = Layer::new("train", None, vec![])
            .with_fallback_crs(Some(&Crs::from_epsg(32649)));
        assert_eq!(layer.crs, Some(Crs::from_epsg(32649)));

        let layer = Layer::new("train", Some(Crs::wgs84()), vec![])
            .with_fallback_crs(Some(&Crs::from_epsg(32649)));
        assert_eq!(layer.crs, Some(Crs::wgs84()));
    }

    #[test]
    fn test_has_property() {
        let feature = Feature::new("0", geo::Geometry::Point(geo::Point::new(1.0, 2.0)))
            .with_property("landcover_id", 3);
        let layer = Layer::new("train", None, vec![feature]);
        assert!(layer.has_property("landcover_id"));
        assert!(!layer.has_property("class"));
    }
}
