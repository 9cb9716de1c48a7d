use crate::metrics::{ConversionMetadata, MetricEvent, MetricsCollector};
use std::time::Duration;

/// Collector that remembers every call in order
#[derive(Debug, Default, Clone)]
pub struct RecordingCollector {
    events: Vec<MetricEvent>,
}

impl RecordingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MetricEvent] {
        &self.events
    }

    /// Event names in call order
    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(MetricEvent::name).collect()
    }

    /// Number of events named `name`
    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|event| event.name() == name).count()
    }

    /// Metadata of every success event
    pub fn successes(&self) -> Vec<&ConversionMetadata> {
        self.events
            .iter()
            .filter_map(|event| match event {
                MetricEvent::ConversionSuccess { metadata, .. } => Some(metadata),
                _ => None,
            })
            .collect()
    }

    /// Message of every failure event
    pub fn failures(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                MetricEvent::ConversionFailure { error } => Some(error.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Last reported feature count
    pub fn feature_count(&self) -> Option<u64> {
        self.events.iter().rev().find_map(|event| match event {
            MetricEvent::FeatureCount { count } => Some(*count),
            _ => None,
        })
    }

    /// Last reported (input, output) sizes in MB
    pub fn file_sizes(&self) -> Option<(f64, f64)> {
        self.events.iter().rev().find_map(|event| match event {
            MetricEvent::FileSizes {
                input_mb,
                output_mb,
            } => Some((*input_mb, *output_mb)),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl MetricsCollector for RecordingCollector {
    fn record_conversion_start(&mut self) {
        self.events.push(MetricEvent::ConversionStart);
    }

    fn record_conversion_success(&mut self, duration: Duration, metadata: &ConversionMetadata) {
        self.events.push(MetricEvent::ConversionSuccess {
            duration,
            metadata: metadata.clone(),
        });
    }

    fn record_conversion_failure(&mut self, error: &str) {
        self.events.push(MetricEvent::ConversionFailure {
            error: error.to_string(),
        });
    }

    fn record_read_time(&mut self, duration: Duration) {
        self.events.push(MetricEvent::ReadTime { duration });
    }

    fn record_write_time(&mut self, duration: Duration) {
        self.events.push(MetricEvent::WriteTime { duration });
    }

    fn record_feature_count(&mut self, count: u64) {
        self.events.push(MetricEvent::FeatureCount { count });
    }

    fn record_file_sizes(&mut self, input_mb: f64, output_mb: f64) {
        self.events.push(MetricEvent::FileSizes {
            input_mb,
            output_mb,
        });
    }
}
