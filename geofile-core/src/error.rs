//! Error types for conversion and collector construction
//!
//! Three layers:
//! - `IoError`: failures of the vector table I/O layer
//! - `ConversionError`: what `convert` returns, classified as input or output side
//! - `ConfigError`: a metrics backend or the settings could not be built

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing vector tables
#[derive(Debug, Error)]
pub enum IoError {
    /// File missing, unreadable, or its metadata cannot be read
    #[error("cannot access {}: {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extension does not map to a supported driver
    #[error("{} is not a recognized vector format (expected .shp, .geojson or .json)", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Shapefile (or its .dbf table) could not be parsed
    #[error("failed to read shapefile {}: {source}", path.display())]
    Shapefile {
        path: PathBuf,
        #[source]
        source: shapefile::Error,
    },

    /// Shape type without a GeoJSON equivalent
    #[error("unsupported shape type {shape_type} in {}", path.display())]
    UnsupportedShape { path: PathBuf, shape_type: String },

    /// Document is not valid GeoJSON
    #[error("invalid GeoJSON in {}: {source}", path.display())]
    GeoJson {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },

    /// Output could not be created or written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the feature collection failed (e.g. a geometry the writer rejects)
    #[error("failed to encode GeoJSON for {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors returned by a conversion attempt
///
/// Every variant is reported exactly once through
/// `MetricsCollector::record_conversion_failure` before it reaches the caller.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Input missing, unreadable or not a parseable vector file
    #[error(transparent)]
    Input(IoError),

    /// Output path unwritable or the writer rejected the data
    #[error(transparent)]
    Output(IoError),

    /// No usable output path could be derived
    #[error("cannot use output path for {}: {reason}", input.display())]
    OutputPath { input: PathBuf, reason: String },
}

impl ConversionError {
    /// True for failures on the input side (missing/unreadable/unparseable)
    pub fn is_input(&self) -> bool {
        matches!(self, ConversionError::Input(_))
    }

    /// True for failures on the output side
    pub fn is_output(&self) -> bool {
        matches!(self, ConversionError::Output(_) | ConversionError::OutputPath { .. })
    }
}

/// Errors raised while building a metrics backend or loading settings
///
/// Fatal: the conversion is never attempted when one of these occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Metrics endpoint could not bind its listen address
    #[error("failed to bind metrics endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Metrics server runtime or thread could not be started
    #[error("failed to start metrics server: {0}")]
    Runtime(#[source] std::io::Error),

    /// The metric set is already registered in the target registry
    #[error("conversion metrics are already registered in this registry")]
    DuplicateRegistration,

    /// Prometheus client rejected a metric definition
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// UDP socket for StatsD could not be opened
    #[error("failed to open StatsD socket for {target}: {source}")]
    StatsdSocket {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// StatsD client could not be created (e.g. host does not resolve)
    #[error("failed to create StatsD client for {target}: {source}")]
    Statsd {
        target: String,
        #[source]
        source: cadence::MetricError,
    },

    /// Settings file or environment could not be loaded
    #[error("failed to load settings: {0}")]
    Settings(#[from] config::ConfigError),

    /// Settings loaded but hold an invalid value
    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Human-readable hint printed before the process exits
    pub fn remediation(&self) -> &'static str {
        match self {
            ConfigError::Bind { .. } => {
                "Choose a free port with --metrics-port, or run with --metrics none"
            }
            ConfigError::Runtime(_) => "Check system thread/socket limits, or run with --metrics none",
            ConfigError::DuplicateRegistration | ConfigError::Prometheus(_) => {
                "Use a separate registry per collector, or run with --metrics none"
            }
            ConfigError::StatsdSocket { .. } | ConfigError::Statsd { .. } => {
                "Check --statsd-host and --statsd-port, or run with --metrics none"
            }
            ConfigError::Settings(_) | ConfigError::Invalid(_) => {
                "Check the --config file and GEOFILE__* environment variables"
            }
        }
    }
}
