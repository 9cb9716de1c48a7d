//! Conversion orchestration
//!
//! `convert` reads a vector file, writes it back out as GeoJSON and reports
//! every stage to a `MetricsCollector` in a fixed order:
//!
//! ```text
//! start -> read_time -> feature_count -> write_time -> file_sizes -> success
//! ```
//!
//! Any failure after `start` produces exactly one `failure` event and the
//! error is returned to the caller unchanged.

use crate::error::{ConversionError, IoError};
use crate::io::{read_vector_file, write_vector_file, VectorFormat};
use crate::metrics::{ConversionMetadata, MetricsCollector};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info};

const OUTPUT_EXTENSION: &str = "geojson";
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Reported when the table carries no CRS
pub const UNKNOWN_CRS: &str = "unknown";

/// One conversion: the input file and an optional explicit output path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    input: PathBuf,
    output: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Where the GeoJSON will be written
    pub fn resolve_output_path(&self) -> Result<PathBuf, ConversionError> {
        resolve_output_path(&self.input, self.output())
    }
}

/// Derive the output path for `input`
///
/// An explicit `output` wins; otherwise the input's extension is replaced by
/// `.geojson` (or appended when it has none). When the input exists the
/// result must not be the same file.
pub fn resolve_output_path(input: &Path, output: Option<&Path>) -> Result<PathBuf, ConversionError> {
    let path_error = |reason: &str| ConversionError::OutputPath {
        input: input.to_path_buf(),
        reason: reason.to_string(),
    };

    if input.file_name().is_none() {
        return Err(path_error("input path has no file name"));
    }

    let resolved = match output {
        Some(output) if output.as_os_str().is_empty() => {
            return Err(path_error("output path is empty"));
        }
        Some(output) => output.to_path_buf(),
        None => input.with_extension(OUTPUT_EXTENSION),
    };

    if same_file(input, &resolved) {
        return Err(path_error("output path is the input file"));
    }

    Ok(resolved)
}

/// A missing input is left for the stat step to report
fn same_file(a: &Path, b: &Path) -> bool {
    if !a.exists() {
        return false;
    }
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Bytes to megabytes (1 MB = 1024 * 1024 bytes)
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

fn file_size_mb(path: &Path) -> Result<f64, IoError> {
    fs::metadata(path)
        .map(|meta| bytes_to_mb(meta.len()))
        .map_err(|source| IoError::Access {
            path: path.to_path_buf(),
            source,
        })
}

/// Convert `request.input()` to GeoJSON, reporting to `collector`
pub fn convert<C: MetricsCollector + ?Sized>(
    request: &ConversionRequest,
    collector: &mut C,
) -> Result<ConversionMetadata, ConversionError> {
    collector.record_conversion_start();
    let started = Instant::now();

    match run_stages(request, collector, started) {
        Ok(metadata) => Ok(metadata),
        Err(err) => {
            let message = err.to_string();
            error!("Conversion of {} failed: {}", request.input().display(), message);
            collector.record_conversion_failure(&message);
            Err(err)
        }
    }
}

fn run_stages<C: MetricsCollector + ?Sized>(
    request: &ConversionRequest,
    collector: &mut C,
    started: Instant,
) -> Result<ConversionMetadata, ConversionError> {
    let input = request.input();
    let output = request.resolve_output_path()?;

    let input_size_mb = file_size_mb(input).map_err(ConversionError::Input)?;

    info!("Reading {}", input.display());
    let read_started = Instant::now();
    let table = read_vector_file(input).map_err(ConversionError::Input)?;
    let read_time = read_started.elapsed();
    collector.record_read_time(read_time);

    let feature_count = table.len() as u64;
    collector.record_feature_count(feature_count);

    info!("Read {} features in {:.2}s", feature_count, read_time.as_secs_f64());
    info!("CRS: {}", table.crs().unwrap_or(UNKNOWN_CRS));
    info!("Geometry types: {:?}", table.geometry_type_counts());

    info!("Writing {}", output.display());
    let write_started = Instant::now();
    write_vector_file(&table, &output, VectorFormat::GeoJson).map_err(ConversionError::Output)?;
    let write_time = write_started.elapsed();
    collector.record_write_time(write_time);

    let output_size_mb = file_size_mb(&output).map_err(ConversionError::Output)?;
    collector.record_file_sizes(input_size_mb, output_size_mb);

    info!("Wrote GeoJSON in {:.2}s", write_time.as_secs_f64());
    info!("Output size: {:.2} MB", output_size_mb);

    let duration: Duration = started.elapsed();
    let metadata = ConversionMetadata {
        input_file: input.display().to_string(),
        output_file: output.display().to_string(),
        feature_count,
        input_size_mb,
        output_size_mb,
        crs: table.crs().unwrap_or(UNKNOWN_CRS).to_string(),
    };
    collector.record_conversion_success(duration, &metadata);

    Ok(metadata)
}

/// A collector bound to a sequence of conversions
///
/// The pipeline owns its collector; each `convert` call borrows it mutably
/// for the duration of that conversion.
pub struct ConversionPipeline<C: MetricsCollector> {
    collector: C,
}

impl<C: MetricsCollector> ConversionPipeline<C> {
    pub fn new(collector: C) -> Self {
        Self { collector }
    }

    pub fn convert(&mut self, request: &ConversionRequest) -> Result<ConversionMetadata, ConversionError> {
        convert(request, &mut self.collector)
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut C {
        &mut self.collector
    }

    pub fn into_collector(self) -> C {
        self.collector
    }
}
