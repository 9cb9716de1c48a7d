//! End-to-end conversion tests
//!
//! Writes real shapefile/GeoJSON fixtures into a temp dir, converts them and
//! checks the GeoJSON that comes out.

use anyhow::Result;
use approx::assert_abs_diff_eq;
use geofile_core::prelude::*;
use geofile_core::read_vector_file;
use geofile_core::testing::{
    diagonal_points, named_points, sample_points, write_geojson_fixture, write_line_shapefile,
    write_point_shapefile, write_polygon_shapefile, RecordingCollector,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Test: three points become a FeatureCollection with the same attributes
#[test]
fn test_three_point_shapefile() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("cities.shp");
    write_point_shapefile(&input, &sample_points())?;

    let metadata = convert(&ConversionRequest::new(&input), &mut NullCollector)?;

    let output = dir.path().join("cities.geojson");
    assert_eq!(metadata.output_file, output.display().to_string());
    assert_eq!(metadata.feature_count, 3);
    assert_eq!(metadata.crs, "EPSG:4326");

    let document = read_json(&output)?;
    assert_eq!(document["type"], "FeatureCollection");

    let features = document["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    for feature in features {
        assert_eq!(feature["geometry"]["type"], "Point");
        assert_eq!(feature["geometry"]["coordinates"].as_array().unwrap().len(), 2);
        assert!(feature["properties"].get("name").is_some());
        assert!(feature["properties"].get("value").is_some());
    }

    assert_eq!(features[0]["properties"]["name"], "Location A");
    assert_eq!(features[0]["properties"]["value"], json!(100));
    Ok(())
}

/// Test: reading the output back preserves rows, columns, geometry and CRS
#[test]
fn test_round_trip_preserves_table() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("cities.shp");
    let output = dir.path().join("out").join("cities.json");
    fs::create_dir(dir.path().join("out"))?;
    write_point_shapefile(&input, &sample_points())?;

    convert(
        &ConversionRequest::new(&input).with_output(&output),
        &mut NullCollector,
    )?;

    let original = read_vector_file(&input)?;
    let converted = read_vector_file(&output)?;

    assert_eq!(converted.len(), original.len());
    assert_eq!(converted.columns(), original.columns());
    assert_eq!(converted.crs(), original.crs());

    for (before, after) in original.features().iter().zip(converted.features()) {
        let (Some(before_geom), Some(after_geom)) = (&before.geometry, &after.geometry) else {
            panic!("missing geometry");
        };
        match (&before_geom.value, &after_geom.value) {
            (geojson::Value::Point(a), geojson::Value::Point(b)) => {
                assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-6);
                assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-6);
            }
            other => panic!("unexpected geometries {:?}", other),
        }
        assert_eq!(before.properties, after.properties);
    }
    Ok(())
}

/// Test: polygons convert to closed Polygon rings
#[test]
fn test_polygon_shapefile() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("regions.shp");
    let square = vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)];
    let offset = vec![(2.0, 2.0), (2.0, 3.0), (3.0, 3.0), (3.0, 2.0), (2.0, 2.0)];
    write_polygon_shapefile(&input, &[("north", 1, square), ("south", 1, offset)])?;

    let metadata = convert(&ConversionRequest::new(&input), &mut NullCollector)?;
    assert_eq!(metadata.feature_count, 2);

    let document = read_json(&dir.path().join("regions.geojson"))?;
    for feature in document["features"].as_array().unwrap() {
        assert_eq!(feature["geometry"]["type"], "Polygon");
        let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert!(ring.len() >= 4);
        assert_eq!(ring.first(), ring.last());
    }
    assert_eq!(document["features"][1]["properties"]["region"], "south");
    Ok(())
}

/// Test: polylines convert to LineString
#[test]
fn test_line_shapefile() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("roads.shp");
    write_line_shapefile(
        &input,
        &[
            ("main", 12, vec![(0.0, 0.0), (1.0, 1.0), (2.0, 1.5)]),
            ("side", 3, vec![(5.0, 5.0), (5.5, 6.0)]),
        ],
    )?;

    convert(&ConversionRequest::new(&input), &mut NullCollector)?;

    let document = read_json(&dir.path().join("roads.geojson"))?;
    let features = document["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["geometry"]["type"], "LineString");
    assert_eq!(features[0]["geometry"]["coordinates"].as_array().unwrap().len(), 3);
    assert_eq!(features[1]["properties"]["length"], json!(3));
    Ok(())
}

/// Test: an empty table converts to an empty FeatureCollection
#[test]
fn test_empty_table() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("empty.json");
    write_geojson_fixture(&input, &diagonal_points(0))?;

    let mut collector = RecordingCollector::new();
    let metadata = convert(&ConversionRequest::new(&input), &mut collector)?;

    assert_eq!(metadata.feature_count, 0);
    assert_eq!(collector.feature_count(), Some(0));

    let document = read_json(&dir.path().join("empty.geojson"))?;
    assert_eq!(document["type"], "FeatureCollection");
    assert_eq!(document["features"].as_array().unwrap().len(), 0);
    Ok(())
}

/// Test: 1000 rows all survive
#[test]
fn test_thousand_rows() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("grid.json");
    write_geojson_fixture(&input, &diagonal_points(1000))?;

    let mut collector = RecordingCollector::new();
    let metadata = convert(&ConversionRequest::new(&input), &mut collector)?;

    assert_eq!(metadata.feature_count, 1000);
    assert_eq!(collector.feature_count(), Some(1000));
    assert_eq!(read_vector_file(&dir.path().join("grid.geojson"))?.len(), 1000);
    Ok(())
}

/// Test: non-ASCII and embedded newlines are preserved exactly
#[test]
fn test_unicode_and_newline_attributes() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("names.json");
    let names = ["Zürich", "東京", "São Paulo\nBrasil", "line one\r\nline two"];
    write_geojson_fixture(&input, &named_points(&names))?;

    convert(&ConversionRequest::new(&input), &mut NullCollector)?;

    let document = read_json(&dir.path().join("names.geojson"))?;
    let written: Vec<&str> = document["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|feature| feature["properties"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(written, names);
    Ok(())
}

/// Test: shapefile text keeps non-ASCII and newlines through dBase decoding
///
/// dBase pads character fields with blanks, so surrounding spaces do not survive.
#[test]
fn test_unicode_and_newline_shapefile_attributes() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("names.shp");
    let rows = [
        ("Zürich", 1, 8.54, 47.37),
        ("São Paulo\nBrasil", 2, -46.63, -23.55),
        ("  padded  ", 3, 0.0, 0.0),
        ("trail\n", 4, 1.0, 1.0),
    ];
    write_point_shapefile(&input, &rows)?;

    convert(&ConversionRequest::new(&input), &mut NullCollector)?;

    let document = read_json(&dir.path().join("names.geojson"))?;
    let written: Vec<&str> = document["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|feature| feature["properties"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(written, ["Zürich", "São Paulo\nBrasil", "padded", "trail\n"]);
    Ok(())
}

/// Test: the output carries the legacy crs member for EPSG codes
#[test]
fn test_output_crs_member() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("cities.shp");
    write_point_shapefile(&input, &sample_points())?;

    convert(&ConversionRequest::new(&input), &mut NullCollector)?;

    let document = read_json(&dir.path().join("cities.geojson"))?;
    assert_eq!(document["crs"]["type"], "name");
    assert_eq!(
        document["crs"]["properties"]["name"],
        "urn:ogc:def:crs:EPSG::4326"
    );
    Ok(())
}

/// Test: no staging file is left next to the output
#[test]
fn test_no_partial_file_left_behind() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("grid.json");
    write_geojson_fixture(&input, &diagonal_points(10))?;

    convert(&ConversionRequest::new(&input), &mut NullCollector)?;

    let mut names: Vec<String> = fs::read_dir(dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    names.sort();
    assert_eq!(names, vec!["grid.geojson", "grid.json"]);
    Ok(())
}
