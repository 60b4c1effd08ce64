//! Concurrent dataset loading

use anyhow::{Context, Result};
use futures::future::try_join_all;
use geogate_core::formats::FormatRegistry;
use geogate_core::models::{Crs, Layer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::output_types::DatasetSummary;

/// Read every path on its own task, preserving input order.
///
/// Layers without a CRS get `fallback` when one is configured.
pub async fn load_layers(paths: &[PathBuf], fallback: Option<&Crs>) -> Result<Vec<Layer>> {
    let registry = Arc::new(FormatRegistry::with_defaults());

    let tasks = paths.iter().cloned().map(|path| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry
                .read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))
        })
    });

    let layers = try_join_all(tasks)
        .await
        .context("Dataset loading task failed")?
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    Ok(layers
        .into_iter()
        .map(|layer| layer.with_fallback_crs(fallback))
        .collect())
}

/// Expand directories into the supported files they contain.
///
/// Returns `(supported, skipped)`; both are sorted within each directory.
pub fn collect_dataset_paths(paths: &[PathBuf]) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let registry = FormatRegistry::with_defaults();
    let mut supported = Vec::new();
    let mut skipped = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries = std::fs::read_dir(path)
                .with_context(|| format!("Failed to list {}", path.display()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<_>>>()?;
            entries.sort();

            for entry in entries.into_iter().filter(|p| p.is_file()) {
                if registry.supports(&entry) {
                    supported.push(entry);
                } else if !is_shapefile_component(&entry) {
                    skipped.push(entry);
                }
            }
        } else if registry.supports(path) {
            supported.push(path.clone());
        } else {
            skipped.push(path.clone());
        }
    }

    Ok((supported, skipped))
}

/// Sidecar files read together with their `.shp`
fn is_shapefile_component(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    matches!(ext.as_deref(), Some("shx" | "dbf" | "prj" | "cpg"))
}

pub fn summarize(path: &Path, layer: &Layer) -> DatasetSummary {
    DatasetSummary {
        path: path.display().to_string(),
        name: layer.name.clone(),
        features: layer.len(),
        crs: layer.crs.as_ref().map(|c| c.identifier()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_dataset_paths() {
        let dir = TempDir::new().unwrap();
        for name in ["b.geojson", "a.shp", "a.shx", "a.dbf", "a.prj", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let (supported, skipped) = collect_dataset_paths(&[dir.path().to_path_buf()]).unwrap();

        let names: Vec<_> = supported
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.shp", "b.geojson"]);
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].ends_with("notes.txt"));
    }

    #[tokio::test]
    async fn test_load_layers_keeps_order_and_declared_crs() {
        let dir = TempDir::new().unwrap();
        let train = dir.path().join("train.geojson");
        let test = dir.path().join("test.geojson");
        std::fs::write(&train, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        std::fs::write(
            &test,
            r#"{"type": "FeatureCollection",
                "crs": {"type": "name", "properties": {"name": "EPSG:32650"}},
                "features": []}"#,
        )
        .unwrap();

        let fallback = Crs::from_epsg(32649);
        let layers = load_layers(&[train, test], Some(&fallback)).await.unwrap();

        assert_eq!(layers[0].name, "train");
        assert_eq!(layers[0].crs, Some(Crs::wgs84()));
        assert_eq!(layers[1].name, "test");
        assert_eq!(layers[1].crs, Some(Crs::from_epsg(32650)));
    }
}
