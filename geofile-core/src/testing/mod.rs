//! Testing utilities for integration tests and benchmarks
//!
//! Provides:
//! - RecordingCollector: keeps every metrics call as a `MetricEvent`
//! - Fixture writers for shapefiles and GeoJSON tables

pub mod helpers;
pub mod recording;

pub use helpers::*;
pub use recording::RecordingCollector;
