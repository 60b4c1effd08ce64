//! Shapefile format reader implementation
//!
//! Shapefiles consist of multiple component files (.shp, .shx, .dbf, .prj).
//! The first three are required; the CRS comes from the optional `.prj`.

use async_trait::async_trait;
use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use shapefile::dbase::FieldValue as DbaseFieldValue;
use shapefile::{PolygonRing, Reader as ShapefileReader, Shape};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GeogateError, Result};
use crate::formats::{layer_name, FormatReader};
use crate::models::{Crs, Feature, Layer};

/// Shapefile format reader
pub struct ShapefileFormatReader;

#[async_trait]
impl FormatReader for ShapefileFormatReader {
    async fn read(&self, path: &Path) -> Result<Layer> {
        let base = shapefile_base(path)?;
        verify_components(&base)?;

        let mut reader = ShapefileReader::from_path(path)
            .map_err(|e| format_error(format!("Failed to open Shapefile: {}", e)))?;

        let crs = read_prj(&base)?;

        let mut features = Vec::new();
        for result in reader.iter_shapes_and_records() {
            let (shape, record) =
                result.map_err(|e| format_error(format!("Failed to read feature: {}", e)))?;

            let id = features.len().to_string();
            let geometry = shape_to_geometry(shape, &id)?;
            let properties = record
                .into_iter()
                .map(|(name, value)| (name, dbase_value_to_json(&value)))
                .collect::<HashMap<_, _>>();

            features.push(Feature {
                id,
                geometry,
                crs: None,
                properties,
            });
        }

        Ok(Layer::new(layer_name(path), crs, features))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }
}

fn format_error(message: String) -> GeogateError {
    GeogateError::FormatError {
        format: "Shapefile".to_string(),
        message,
    }
}

/// Path of the Shapefile without extension
fn shapefile_base(path: &Path) -> Result<PathBuf> {
    let is_shp = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("shp"))
        .unwrap_or(false);

    if !is_shp {
        return Err(GeogateError::UnsupportedFormat {
            path: path.display().to_string(),
        });
    }

    Ok(path.with_extension(""))
}

/// Verify that all required Shapefile component files exist
fn verify_components(base: &Path) -> Result<()> {
    let missing: Vec<String> = ["shp", "shx", "dbf"]
        .iter()
        .filter(|ext| !base.with_extension(ext).exists())
        .map(|ext| format!(".{}", ext))
        .collect();

    if !missing.is_empty() {
        return Err(format_error(format!(
            "Missing required component files: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Read the CRS from the `.prj` sidecar, `None` when there is no sidecar
fn read_prj(base: &Path) -> Result<Option<Crs>> {
    let prj_path = base.with_extension("prj");
    if !prj_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&prj_path)
        .map_err(|e| format_error(format!("Failed to read .prj file: {}", e)))?;

    Crs::from_wkt(&content)
        .map(Some)
        .ok_or_else(|| GeogateError::InvalidCrs {
            value: prj_path.display().to_string(),
            reason: "unrecognised WKT in .prj file".to_string(),
        })
}

fn coord(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

fn line(points: impl IntoIterator<Item = Coord<f64>>) -> LineString<f64> {
    LineString::from_iter(points)
}

/// Group shapefile rings into polygons: every outer ring opens a new polygon,
/// inner rings attach to the most recent outer ring.
fn rings_to_polygons<P>(
    rings: &[PolygonRing<P>],
    xy: impl Fn(&P) -> Coord<f64>,
) -> Vec<Polygon<f64>> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        let ls = line(ring.points().iter().map(&xy));
        match ring {
            PolygonRing::Outer(_) => polygons.push((ls, Vec::new())),
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some((_, interiors)) => interiors.push(ls),
                // Inner ring without a preceding outer ring; keep it as a shell
                None => polygons.push((ls, Vec::new())),
            },
        }
    }

    polygons
        .into_iter()
        .map(|(exterior, interiors)| Polygon::new(exterior, interiors))
        .collect()
}

fn polygons_to_geometry(mut polygons: Vec<Polygon<f64>>) -> geo::Geometry<f64> {
    if polygons.len() == 1 {
        geo::Geometry::Polygon(polygons.remove(0))
    } else {
        geo::Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}

fn parts_to_geometry<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> Coord<f64>) -> geo::Geometry<f64> {
    let mut lines: Vec<LineString<f64>> = parts
        .iter()
        .map(|part| line(part.iter().map(&xy)))
        .collect();
    if lines.len() == 1 {
        geo::Geometry::LineString(lines.remove(0))
    } else {
        geo::Geometry::MultiLineString(MultiLineString::new(lines))
    }
}

/// Convert a shapefile shape to a 2-D geometry; Z and M ordinates are dropped
fn shape_to_geometry(shape: Shape, feature_id: &str) -> Result<Option<geo::Geometry<f64>>> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => geo::Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointM(p) => geo::Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointZ(p) => geo::Geometry::Point(Point::new(p.x, p.y)),
        Shape::Polyline(pl) => parts_to_geometry(pl.parts(), |p| coord(p.x, p.y)),
        Shape::PolylineM(pl) => parts_to_geometry(pl.parts(), |p| coord(p.x, p.y)),
        Shape::PolylineZ(pl) => parts_to_geometry(pl.parts(), |p| coord(p.x, p.y)),
        Shape::Polygon(pg) => {
            polygons_to_geometry(rings_to_polygons(pg.rings(), |p| coord(p.x, p.y)))
        }
        Shape::PolygonM(pg) => {
            polygons_to_geometry(rings_to_polygons(pg.rings(), |p| coord(p.x, p.y)))
        }
        Shape::PolygonZ(pg) => {
            polygons_to_geometry(rings_to_polygons(pg.rings(), |p| coord(p.x, p.y)))
        }
        Shape::Multipoint(mp) => geo::Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| Point::new(p.x, p.y)).collect(),
        )),
        Shape::MultipointM(mp) => geo::Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| Point::new(p.x, p.y)).collect(),
        )),
        Shape::MultipointZ(mp) => geo::Geometry::MultiPoint(MultiPoint::new(
            mp.points().iter().map(|p| Point::new(p.x, p.y)).collect(),
        )),
        Shape::Multipatch(_) => {
            return Err(GeogateError::InvalidGeometry {
                feature_id: feature_id.to_string(),
                reason: "Multipatch geometry type is not supported".to_string(),
            })
        }
    };

    Ok(Some(geometry))
}

/// Convert dBase field value to JSON value
fn dbase_value_to_json(value: &DbaseFieldValue) -> serde_json::Value {
    use serde_json::Value;

    let number = |n: f64| {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    };

    match value {
        DbaseFieldValue::Character(Some(s)) => Value::String(s.trim().to_string()),
        DbaseFieldValue::Numeric(Some(n)) => number(*n),
        DbaseFieldValue::Logical(Some(b)) => Value::Bool(*b),
        DbaseFieldValue::Date(Some(date)) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        DbaseFieldValue::Float(Some(f)) => number(*f as f64),
        DbaseFieldValue::Integer(i) => Value::Number((*i).into()),
        DbaseFieldValue::Currency(c) => number(*c),
        DbaseFieldValue::Double(d) => number(*d),
        DbaseFieldValue::Memo(s) => Value::String(s.clone()),
        DbaseFieldValue::DateTime(dt) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        DbaseFieldValue::Character(None)
        | DbaseFieldValue::Numeric(None)
        | DbaseFieldValue::Logical(None)
        | DbaseFieldValue::Date(None)
        | DbaseFieldValue::Float(None) => Value::Null,
    }
}
