use super::{ConversionMetadata, MetricsCollector};
use std::time::Duration;

/// Collector used when no metrics backend is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCollector;

impl MetricsCollector for NullCollector {
    fn record_conversion_start(&mut self) {}

    fn record_conversion_success(&mut self, _duration: Duration, _metadata: &ConversionMetadata) {}

    fn record_conversion_failure(&mut self, _error: &str) {}

    fn record_read_time(&mut self, _duration: Duration) {}

    fn record_write_time(&mut self, _duration: Duration) {}

    fn record_feature_count(&mut self, _count: u64) {}

    fn record_file_sizes(&mut self, _input_mb: f64, _output_mb: f64) {}
}
