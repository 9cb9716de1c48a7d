//! ESRI Shapefile reader
//!
//! Shapes come from the `.shp`, attributes from the `.dbf` and the CRS from
//! the optional `.prj` sidecar.

use super::{Feature, Table};
use crate::error::IoError;
use geojson::{Geometry, JsonObject, Value};
use serde_json::{Number, Value as JsonValue};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{Point, PointM, PointZ, PolygonRing, Shape};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest integer an f64 represents exactly (2^53)
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

pub(super) fn read_shapefile(path: &Path) -> Result<Table, IoError> {
    let shapefile_error = |source| IoError::Shapefile {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = shapefile::Reader::from_path(path).map_err(shapefile_error)?;

    let mut features = Vec::new();
    for item in reader.iter_shapes_and_records() {
        let (shape, record) = item.map_err(shapefile_error)?;
        let geometry = shape_to_geometry(path, shape)?;
        features.push(Feature::new(geometry, record_to_properties(record)));
    }

    let crs = read_prj(path)?;
    debug!(
        "Read {} shapes from {} (crs: {:?})",
        features.len(),
        path.display(),
        crs
    );

    Ok(Table::new(features, crs))
}

/// Read the `.prj` next to the shapefile, if any
fn read_prj(path: &Path) -> Result<Option<String>, IoError> {
    let Some(prj) = sidecar(path, "prj") else {
        return Ok(None);
    };

    let wkt = fs::read_to_string(&prj).map_err(|source| IoError::Access {
        path: prj.clone(),
        source,
    })?;
    let wkt = wkt.trim();
    if wkt.is_empty() {
        return Ok(None);
    }
    Ok(Some(crs_from_wkt(wkt)))
}

fn sidecar(path: &Path, extension: &str) -> Option<PathBuf> {
    [extension.to_ascii_lowercase(), extension.to_ascii_uppercase()]
        .into_iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.is_file())
}

/// Turn `.prj` WKT into an authority code where one can be recognized
///
/// Recognized, in order:
/// - a root `AUTHORITY["EPSG","<code>"]` (the last node before the closing bracket)
/// - ESRI/OGC geographic WGS 84, NAD83 and NAD27 definitions
///
/// Anything else is returned as the trimmed WKT itself.
pub fn crs_from_wkt(wkt: &str) -> String {
    let wkt = wkt.trim();

    if let Some(code) = root_epsg_authority(wkt) {
        return format!("EPSG:{}", code);
    }

    let upper = wkt.to_ascii_uppercase();
    if upper.starts_with("GEOGCS[") {
        let name = upper
            .split('"')
            .nth(1)
            .unwrap_or_default()
            .replace(' ', "_");
        let code = match name.as_str() {
            "GCS_WGS_1984" | "WGS_84" | "WGS_1984" => Some(4326),
            "GCS_NORTH_AMERICAN_1983" | "NAD83" => Some(4269),
            "GCS_NORTH_AMERICAN_1927" | "NAD27" => Some(4267),
            _ => None,
        };
        if let Some(code) = code {
            return format!("EPSG:{}", code);
        }
    }

    wkt.to_string()
}

fn root_epsg_authority(wkt: &str) -> Option<u32> {
    const MARKER: &str = "AUTHORITY[\"EPSG\",";

    let start = wkt.rfind(MARKER)? + MARKER.len();
    let rest = &wkt[start..];
    let close = rest.find(']')?;
    // Only the root node's authority is followed by nothing but its closing bracket
    if rest[close + 1..].trim() != "]" {
        return None;
    }
    rest[..close].trim().trim_matches('"').parse().ok()
}

trait ToPosition {
    fn position(&self) -> Vec<f64>;
}

impl ToPosition for Point {
    fn position(&self) -> Vec<f64> {
        vec![self.x, self.y]
    }
}

impl ToPosition for PointM {
    fn position(&self) -> Vec<f64> {
        vec![self.x, self.y]
    }
}

impl ToPosition for PointZ {
    fn position(&self) -> Vec<f64> {
        vec![self.x, self.y, self.z]
    }
}

fn positions<P: ToPosition>(points: &[P]) -> Vec<Vec<f64>> {
    points.iter().map(ToPosition::position).collect()
}

fn line_value<P: ToPosition>(parts: &[Vec<P>]) -> Value {
    let mut lines: Vec<Vec<Vec<f64>>> = parts.iter().map(|part| positions(part)).collect();
    if lines.len() == 1 {
        Value::LineString(lines.remove(0))
    } else {
        Value::MultiLineString(lines)
    }
}

/// Outer rings start a new polygon, inner rings attach to the latest one
fn polygon_value<P: ToPosition>(rings: &[PolygonRing<P>]) -> Value {
    let mut polygons: Vec<Vec<Vec<Vec<f64>>>> = Vec::new();
    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => polygons.push(vec![positions(points)]),
            PolygonRing::Inner(points) => match polygons.last_mut() {
                Some(polygon) => polygon.push(positions(points)),
                None => polygons.push(vec![positions(points)]),
            },
        }
    }

    if polygons.len() == 1 {
        Value::Polygon(polygons.remove(0))
    } else {
        Value::MultiPolygon(polygons)
    }
}

fn shape_to_geometry(path: &Path, shape: Shape) -> Result<Option<Geometry>, IoError> {
    let value = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(point) => Value::Point(point.position()),
        Shape::PointM(point) => Value::Point(point.position()),
        Shape::PointZ(point) => Value::Point(point.position()),
        Shape::Multipoint(multipoint) => Value::MultiPoint(positions(multipoint.points())),
        Shape::MultipointM(multipoint) => Value::MultiPoint(positions(multipoint.points())),
        Shape::MultipointZ(multipoint) => Value::MultiPoint(positions(multipoint.points())),
        Shape::Polyline(line) => line_value(line.parts()),
        Shape::PolylineM(line) => line_value(line.parts()),
        Shape::PolylineZ(line) => line_value(line.parts()),
        Shape::Polygon(polygon) => polygon_value(polygon.rings()),
        Shape::PolygonM(polygon) => polygon_value(polygon.rings()),
        Shape::PolygonZ(polygon) => polygon_value(polygon.rings()),
        other => {
            return Err(IoError::UnsupportedShape {
                path: path.to_path_buf(),
                shape_type: format!("{:?}", other.shapetype()),
            })
        }
    };
    Ok(Some(Geometry::new(value)))
}

fn record_to_properties(record: Record) -> JsonObject {
    record
        .into_iter()
        .map(|(name, value)| (name, field_to_json(value)))
        .collect()
}

fn field_to_json(value: FieldValue) -> JsonValue {
    match value {
        // dBase pads character fields with trailing blanks
        FieldValue::Character(text) => text
            .map(|text| JsonValue::String(text.trim_end_matches(' ').to_string()))
            .unwrap_or(JsonValue::Null),
        FieldValue::Memo(text) => JsonValue::String(text),
        FieldValue::Numeric(number) => number.map(number_to_json).unwrap_or(JsonValue::Null),
        FieldValue::Float(number) => number
            .map(|number| number_to_json(f64::from(number)))
            .unwrap_or(JsonValue::Null),
        FieldValue::Double(number) | FieldValue::Currency(number) => number_to_json(number),
        FieldValue::Integer(number) => JsonValue::from(number),
        FieldValue::Logical(flag) => flag.map(JsonValue::Bool).unwrap_or(JsonValue::Null),
        FieldValue::Date(date) => date
            .map(|date| {
                JsonValue::String(format!(
                    "{:04}-{:02}-{:02}",
                    date.year(),
                    date.month(),
                    date.day()
                ))
            })
            .unwrap_or(JsonValue::Null),
        other => JsonValue::String(format!("{:?}", other)),
    }
}

/// Whole numbers become JSON integers so integer columns stay integers
fn number_to_json(number: f64) -> JsonValue {
    if number.is_finite() && number.fract() == 0.0 && number.abs() <= MAX_EXACT_INT {
        return JsonValue::from(number as i64);
    }
    Number::from_f64(number)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}
