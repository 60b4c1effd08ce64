//! Format abstraction layer for vector dataset readers
//!
//! Each format implements the `FormatReader` trait, and the `FormatRegistry`
//! dispatches a path to the reader registered for its extension.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{GeogateError, Result};
use crate::models::Layer;

pub mod geojson;
pub mod shapefile;

/// Format reader trait that all format implementations must implement
#[async_trait]
pub trait FormatReader: Send + Sync {
    /// Read a layer from the given path.
    ///
    /// The returned layer's CRS is `None` when the file carries no CRS
    /// information at all.
    async fn read(&self, path: &Path) -> Result<Layer>;

    /// Get supported file extensions (e.g., ["geojson", "json"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "Shapefile", "GeoJSON")
    fn format_name(&self) -> &str;
}

/// Central registry for format readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn FormatReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Registry with every built-in vector reader
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(geojson::GeoJsonReader));
        registry.register(Box::new(shapefile::ShapefileFormatReader));
        registry
    }

    /// Register a format reader
    pub fn register(&mut self, reader: Box<dyn FormatReader>) {
        self.readers.push(reader);
    }

    /// Find the reader responsible for a path, by extension
    pub fn reader_for(&self, path: &Path) -> Option<&dyn FormatReader> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        self.readers
            .iter()
            .find(|r| r.supported_extensions().contains(&ext.as_str()))
            .map(|reader| reader.as_ref())
    }

    /// Whether any registered reader handles this path
    pub fn supports(&self, path: &Path) -> bool {
        self.reader_for(path).is_some()
    }

    /// Read a layer with the matching reader
    pub async fn read(&self, path: &Path) -> Result<Layer> {
        let reader = self
            .reader_for(path)
            .ok_or_else(|| GeogateError::UnsupportedFormat {
                path: path.display().to_string(),
            })?;

        tracing::debug!(
            path = %path.display(),
            format = reader.format_name(),
            "Reading layer"
        );
        let layer = reader.read(path).await?;
        tracing::debug!(
            layer = %layer.name,
            features = layer.len(),
            crs = ?layer.crs.as_ref().map(|c| c.identifier()),
            "Layer loaded"
        );
        Ok(layer)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Layer name derived from a file path
pub(crate) fn layer_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}
