//! Geofile Core - shapefile to GeoJSON conversion with pluggable metrics
//!
//! Converts a vector geospatial file into a GeoJSON `FeatureCollection` and
//! reports what happened through an interchangeable metrics backend.
//!
//! ## Architecture
//! - **Leaf**: `metrics` is a capability trait with four implementations
//!   (null, JSON Lines log, Prometheus pull endpoint, StatsD push)
//! - **Orchestration**: `pipeline` runs read -> inspect -> write -> report
//!   and emits every event to the injected collector
//! - **Collaborator**: `io` reads shapefiles/GeoJSON into a `Table` and
//!   writes GeoJSON back out
//!
//! ## Core Modules
//! - `metrics`: `MetricsCollector` trait, variants, backend selection
//! - `pipeline`: `ConversionPipeline`, `ConversionRequest`, `convert`
//! - `io`: `Table`, `read_vector_file`, `write_vector_file`
//! - `config`: layered settings (defaults, TOML file, `GEOFILE__` env)
//! - `error`: error taxonomy
//! - `utils`: logger initialisation

pub mod config;
pub mod error;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod testing;
pub mod utils;

pub use crate::config::{LoggingSettings, MetricsSettings, Settings};
pub use error::{ConfigError, ConversionError, IoError};
pub use io::{read_vector_file, write_vector_file, Feature, Table, VectorFormat};
pub use metrics::{
    build_collector, ConversionMetadata, JsonLogCollector, MetricEvent, MetricsBackend,
    MetricsCollector, NullCollector, PrometheusCollector, StatsdCollector,
};
pub use pipeline::{convert, resolve_output_path, ConversionPipeline, ConversionRequest};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{ConversionMetadata, MetricsBackend, MetricsCollector, NullCollector};
    pub use crate::pipeline::{convert, ConversionPipeline, ConversionRequest};
    pub use crate::{ConfigError, ConversionError};
}
