//! Fixture writers for tests and benchmarks
//!
//! Shapefiles are written with the `shapefile` crate directly (the table I/O
//! layer only writes GeoJSON). GeoJSON fixtures go through `write_vector_file`.

use crate::io::{write_vector_file, Feature, Table, VectorFormat};
use anyhow::{anyhow, Context, Result};
use geojson::{Geometry, JsonObject, Value};
use serde_json::json;
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::record::EsriShape;
use shapefile::{Point, Polygon, PolygonRing, Polyline};
use std::fs;
use std::path::Path;

/// ESRI WKT for WGS 84 geographic coordinates, as written to `.prj` files
pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// (name, value, x, y) rows used by most conversion tests
pub fn sample_points() -> Vec<(&'static str, i64, f64, f64)> {
    vec![
        ("Location A", 100, -122.4194, 37.7749), // San Francisco
        ("Location B", 200, -118.2437, 34.0522), // Los Angeles
        ("Location C", 300, -73.9352, 40.7306),  // New York
    ]
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|e| anyhow!("invalid dBase field name {}: {:?}", name, e))
}

fn labelled_record(label_field: &str, label: &str, value_field: &str, value: i64) -> Record {
    let mut record = Record::default();
    record.insert(
        label_field.to_string(),
        FieldValue::Character(Some(label.to_string())),
    );
    record.insert(value_field.to_string(), FieldValue::Numeric(Some(value as f64)));
    record
}

fn write_labelled_shapes<S: EsriShape>(
    path: &Path,
    label_field: &str,
    value_field: &str,
    rows: Vec<(String, i64, S)>,
) -> Result<()> {
    let table_builder = TableWriterBuilder::new()
        .add_character_field(field_name(label_field)?, 50)
        .add_numeric_field(field_name(value_field)?, 10, 0);

    let mut writer = shapefile::Writer::from_path(path, table_builder)
        .with_context(|| format!("Failed to create shapefile {}", path.display()))?;
    for (label, value, shape) in rows {
        let record = labelled_record(label_field, &label, value_field, value);
        writer
            .write_shape_and_record(&shape, &record)
            .with_context(|| format!("Failed to write shape to {}", path.display()))?;
    }
    drop(writer);

    write_prj(path)
}

/// Write the WGS 84 `.prj` next to `path`
pub fn write_prj(path: &Path) -> Result<()> {
    let prj = path.with_extension("prj");
    fs::write(&prj, WGS84_PRJ).with_context(|| format!("Failed to write {}", prj.display()))
}

/// Point shapefile with `name` (character) and `value` (numeric) columns in WGS 84
pub fn write_point_shapefile(path: &Path, rows: &[(&str, i64, f64, f64)]) -> Result<()> {
    let shapes = rows
        .iter()
        .map(|(name, value, x, y)| (name.to_string(), *value, Point::new(*x, *y)))
        .collect();
    write_labelled_shapes(path, "name", "value", shapes)
}

/// Polygon shapefile with `region` and `area` columns; each ring is closed by the writer
pub fn write_polygon_shapefile(path: &Path, rows: &[(&str, i64, Vec<(f64, f64)>)]) -> Result<()> {
    let shapes = rows
        .iter()
        .map(|(region, area, ring)| {
            let points = ring.iter().map(|(x, y)| Point::new(*x, *y)).collect();
            (region.to_string(), *area, Polygon::new(PolygonRing::Outer(points)))
        })
        .collect();
    write_labelled_shapes(path, "region", "area", shapes)
}

/// Line shapefile with `road` and `length` columns
pub fn write_line_shapefile(path: &Path, rows: &[(&str, i64, Vec<(f64, f64)>)]) -> Result<()> {
    let shapes = rows
        .iter()
        .map(|(road, length, line)| {
            let points = line.iter().map(|(x, y)| Point::new(*x, *y)).collect();
            (road.to_string(), *length, Polyline::new(points))
        })
        .collect();
    write_labelled_shapes(path, "road", "length", shapes)
}

/// Point feature with the given properties
pub fn point_feature(x: f64, y: f64, properties: JsonObject) -> Feature {
    Feature::new(Some(Geometry::new(Value::Point(vec![x, y]))), properties)
}

/// Table of `count` points along the diagonal with an `id` column
pub fn diagonal_points(count: usize) -> Table {
    let features = (0..count)
        .map(|i| {
            let mut properties = JsonObject::new();
            properties.insert("id".to_string(), json!(i));
            point_feature(i as f64 * 0.01, i as f64 * 0.01, properties)
        })
        .collect();
    Table::new(features, Some("EPSG:4326".to_string()))
}

/// Table with one point per label in a `name` column
pub fn named_points(names: &[&str]) -> Table {
    let features = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), json!(name));
            point_feature(i as f64, i as f64, properties)
        })
        .collect();
    Table::new(features, Some("EPSG:4326".to_string()))
}

/// Write `table` as a GeoJSON input fixture
pub fn write_geojson_fixture(path: &Path, table: &Table) -> Result<()> {
    write_vector_file(table, path, VectorFormat::GeoJson)
        .with_context(|| format!("Failed to write fixture {}", path.display()))
}
