//! Conversion metadata and the event vocabulary shared by all collectors

use super::MetricsCollector;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of one successful conversion
///
/// Produced exactly once per successful conversion and handed verbatim to
/// `MetricsCollector::record_conversion_success`. File names are rendered
/// with `Path::display`, so non-UTF-8 bytes become replacement characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionMetadata {
    pub input_file: String,
    pub output_file: String,
    pub feature_count: u64,
    pub input_size_mb: f64,
    pub output_size_mb: f64,
    pub crs: String,
}

/// One call on a `MetricsCollector`, as data
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    ConversionStart,
    ConversionSuccess {
        duration: Duration,
        metadata: ConversionMetadata,
    },
    ConversionFailure {
        error: String,
    },
    ReadTime {
        duration: Duration,
    },
    WriteTime {
        duration: Duration,
    },
    FeatureCount {
        count: u64,
    },
    FileSizes {
        input_mb: f64,
        output_mb: f64,
    },
}

impl MetricEvent {
    /// Short stable name, used in test assertions and debug logs
    pub fn name(&self) -> &'static str {
        match self {
            MetricEvent::ConversionStart => "start",
            MetricEvent::ConversionSuccess { .. } => "success",
            MetricEvent::ConversionFailure { .. } => "failure",
            MetricEvent::ReadTime { .. } => "read_time",
            MetricEvent::WriteTime { .. } => "write_time",
            MetricEvent::FeatureCount { .. } => "feature_count",
            MetricEvent::FileSizes { .. } => "file_sizes",
        }
    }

    /// Replay this event into a collector
    pub fn dispatch<C: MetricsCollector + ?Sized>(&self, collector: &mut C) {
        match self {
            MetricEvent::ConversionStart => collector.record_conversion_start(),
            MetricEvent::ConversionSuccess { duration, metadata } => {
                collector.record_conversion_success(*duration, metadata)
            }
            MetricEvent::ConversionFailure { error } => collector.record_conversion_failure(error),
            MetricEvent::ReadTime { duration } => collector.record_read_time(*duration),
            MetricEvent::WriteTime { duration } => collector.record_write_time(*duration),
            MetricEvent::FeatureCount { count } => collector.record_feature_count(*count),
            MetricEvent::FileSizes {
                input_mb,
                output_mb,
            } => collector.record_file_sizes(*input_mb, *output_mb),
        }
    }
}
