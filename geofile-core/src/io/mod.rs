//! Vector table I/O
//!
//! The conversion pipeline treats this module as an opaque collaborator: it
//! calls `read_vector_file` / `write_vector_file`, asks the `Table` for its
//! length and CRS, and never looks at individual rows.
//!
//! Supported drivers:
//! - ESRI Shapefile (`.shp` + `.dbf`, optional `.prj`), read only
//! - GeoJSON (`.geojson`, `.json`), read and write

mod json;
mod shp;

pub use json::{crs_member, crs_from_member};
pub use shp::crs_from_wkt;

use crate::error::IoError;
use geojson::{Geometry, JsonObject, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// CRS assumed for GeoJSON documents that do not declare one
pub const DEFAULT_GEOJSON_CRS: &str = "EPSG:4326";

/// One row: geometry plus named attribute values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    pub properties: JsonObject,
}

impl Feature {
    pub fn new(geometry: Option<Geometry>, properties: JsonObject) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    /// GeoJSON type name of the geometry, `"None"` for a null geometry
    pub fn geometry_type(&self) -> &'static str {
        self.geometry
            .as_ref()
            .map(|geometry| geometry_type_name(&geometry.value))
            .unwrap_or("None")
    }
}

/// In-memory vector table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    features: Vec<Feature>,
    crs: Option<String>,
}

impl Table {
    pub fn new(features: Vec<Feature>, crs: Option<String>) -> Self {
        Self { features, crs }
    }

    /// Number of rows (features)
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// CRS identifier such as `"EPSG:4326"`, or raw WKT when no code was recognized
    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    /// Union of attribute names across all rows
    pub fn columns(&self) -> BTreeSet<String> {
        self.features
            .iter()
            .flat_map(|feature| feature.properties.keys().cloned())
            .collect()
    }

    /// Row count per geometry type
    pub fn geometry_type_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for feature in &self.features {
            *counts.entry(feature.geometry_type()).or_insert(0) += 1;
        }
        counts
    }
}

/// Driver used to read or write a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    Shapefile,
    GeoJson,
}

impl VectorFormat {
    /// Pick a driver from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "shp" => Some(VectorFormat::Shapefile),
            "geojson" | "json" => Some(VectorFormat::GeoJson),
            _ => None,
        }
    }

    /// Driver name as shown in progress output
    pub fn driver_name(&self) -> &'static str {
        match self {
            VectorFormat::Shapefile => "ESRI Shapefile",
            VectorFormat::GeoJson => "GeoJSON",
        }
    }
}

impl fmt::Display for VectorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_name())
    }
}

/// Read a whole vector file into memory
pub fn read_vector_file(path: &Path) -> Result<Table, IoError> {
    match VectorFormat::from_path(path) {
        Some(VectorFormat::Shapefile) => shp::read_shapefile(path),
        Some(VectorFormat::GeoJson) => json::read_geojson(path),
        None => Err(IoError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Write a table to `path` using the given driver
///
/// The output appears at `path` only once it has been written completely.
pub fn write_vector_file(table: &Table, path: &Path, format: VectorFormat) -> Result<(), IoError> {
    match format {
        VectorFormat::GeoJson => json::write_geojson(table, path),
        VectorFormat::Shapefile => Err(IoError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// GeoJSON type name for a geometry value
pub fn geometry_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
