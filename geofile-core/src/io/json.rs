//! GeoJSON reader and writer

use super::{Feature, Table, DEFAULT_GEOJSON_CRS};
use crate::error::IoError;
use geojson::{FeatureCollection, GeoJson, JsonObject};
use serde_json::{json, Value as JsonValue};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const EPSG_URN_PREFIX: &str = "urn:ogc:def:crs:EPSG::";
const CRS84_URN: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

pub(super) fn read_geojson(path: &Path) -> Result<Table, IoError> {
    let text = fs::read_to_string(path).map_err(|source| IoError::Access {
        path: path.to_path_buf(),
        source,
    })?;
    let document: GeoJson = text.parse().map_err(|source| IoError::GeoJson {
        path: path.to_path_buf(),
        source,
    })?;

    let table = match document {
        GeoJson::FeatureCollection(collection) => {
            let crs = collection
                .foreign_members
                .as_ref()
                .and_then(|members| members.get("crs"))
                .and_then(crs_from_member)
                .unwrap_or_else(|| DEFAULT_GEOJSON_CRS.to_string());
            let features = collection.features.into_iter().map(into_feature).collect();
            Table::new(features, Some(crs))
        }
        GeoJson::Feature(feature) => Table::new(
            vec![into_feature(feature)],
            Some(DEFAULT_GEOJSON_CRS.to_string()),
        ),
        GeoJson::Geometry(geometry) => Table::new(
            vec![Feature::new(Some(geometry), JsonObject::new())],
            Some(DEFAULT_GEOJSON_CRS.to_string()),
        ),
    };

    debug!("Read {} features from {}", table.len(), path.display());
    Ok(table)
}

fn into_feature(feature: geojson::Feature) -> Feature {
    Feature::new(feature.geometry, feature.properties.unwrap_or_default())
}

/// Write `table` as a single FeatureCollection
///
/// Data goes to a hidden sibling file first and is renamed over `path` once
/// complete, so a failed write never leaves a truncated output behind.
pub(super) fn write_geojson(table: &Table, path: &Path) -> Result<(), IoError> {
    let collection = FeatureCollection {
        bbox: None,
        features: table.features().iter().map(to_geojson_feature).collect(),
        foreign_members: table.crs().and_then(crs_member).map(|member| {
            let mut members = JsonObject::new();
            members.insert("crs".to_string(), member);
            members
        }),
    };

    let staging = staging_path(path);
    let result = write_collection(&collection, path, &staging).and_then(|()| {
        fs::rename(&staging, path).map_err(|source| IoError::Write {
            path: path.to_path_buf(),
            source,
        })
    });

    if result.is_err() && staging.exists() {
        if let Err(cleanup) = fs::remove_file(&staging) {
            warn!("Failed to remove {}: {}", staging.display(), cleanup);
        }
    }
    result
}

fn write_collection(collection: &FeatureCollection, path: &Path, staging: &Path) -> Result<(), IoError> {
    let write_error = |source| IoError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(staging).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, collection).map_err(|source| IoError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(write_error)?;
    writer.flush().map_err(write_error)?;
    writer.get_ref().sync_all().map_err(write_error)
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.partial", name))
}

fn to_geojson_feature(feature: &Feature) -> geojson::Feature {
    geojson::Feature {
        bbox: None,
        geometry: feature.geometry.clone(),
        id: None,
        properties: Some(feature.properties.clone()),
        foreign_members: None,
    }
}

/// Legacy named `crs` member for a CRS string
///
/// `EPSG:<code>` becomes the OGC URN form; any other non-empty string is
/// written as the name verbatim.
pub fn crs_member(crs: &str) -> Option<JsonValue> {
    let crs = crs.trim();
    if crs.is_empty() {
        return None;
    }
    let name = match crs.strip_prefix("EPSG:") {
        Some(code) => format!("{}{}", EPSG_URN_PREFIX, code),
        None => crs.to_string(),
    };
    Some(json!({
        "type": "name",
        "properties": { "name": name },
    }))
}

/// Inverse of [`crs_member`]
pub fn crs_from_member(member: &JsonValue) -> Option<String> {
    let name = member.get("properties")?.get("name")?.as_str()?;
    if name == CRS84_URN {
        return Some(DEFAULT_GEOJSON_CRS.to_string());
    }
    if let Some(code) = name.strip_prefix(EPSG_URN_PREFIX) {
        return Some(format!("EPSG:{}", code));
    }
    Some(name.to_string())
}
