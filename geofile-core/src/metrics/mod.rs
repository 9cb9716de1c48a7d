//! Metrics collection
//!
//! `MetricsCollector` is the capability every backend implements. The
//! conversion pipeline only talks to this trait, so backends can be swapped
//! without touching conversion logic.
//!
//! Backends:
//! - `NullCollector`: drops everything
//! - `JsonLogCollector`: one JSON Lines record per conversion
//! - `PrometheusCollector`: counters/histograms/gauges behind an HTTP endpoint
//! - `StatsdCollector`: UDP push to a StatsD daemon

pub mod event;
pub mod json_log;
pub mod null;
pub mod prom;
pub mod server;
pub mod statsd;

pub use event::{ConversionMetadata, MetricEvent};
pub use json_log::JsonLogCollector;
pub use null::NullCollector;
pub use prom::{ConversionMetrics, PrometheusCollector, DURATION_BUCKETS};
pub use server::{MetricsServer, MetricsServerConfig, MetricsServerHandle};
pub use statsd::{StatsdCollector, STATSD_PREFIX};

use crate::config::MetricsSettings;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Sink for conversion telemetry
///
/// All operations are fire-and-forget: nothing is returned to the pipeline,
/// and a backend that fails to deliver logs the problem instead of failing
/// the conversion. Each may be called zero or more times per conversion.
pub trait MetricsCollector: Send {
    /// A conversion attempt begins
    fn record_conversion_start(&mut self);

    /// The attempt succeeded after `duration` in total
    fn record_conversion_success(&mut self, duration: Duration, metadata: &ConversionMetadata);

    /// The attempt failed with `error`
    fn record_conversion_failure(&mut self, error: &str);

    /// Time spent reading the source file
    fn record_read_time(&mut self, duration: Duration);

    /// Time spent writing the output file
    fn record_write_time(&mut self, duration: Duration);

    /// Number of rows processed
    fn record_feature_count(&mut self, count: u64);

    /// Input and output sizes in megabytes
    fn record_file_sizes(&mut self, input_mb: f64, output_mb: f64);
}

impl<C: MetricsCollector + ?Sized> MetricsCollector for Box<C> {
    fn record_conversion_start(&mut self) {
        (**self).record_conversion_start()
    }

    fn record_conversion_success(&mut self, duration: Duration, metadata: &ConversionMetadata) {
        (**self).record_conversion_success(duration, metadata)
    }

    fn record_conversion_failure(&mut self, error: &str) {
        (**self).record_conversion_failure(error)
    }

    fn record_read_time(&mut self, duration: Duration) {
        (**self).record_read_time(duration)
    }

    fn record_write_time(&mut self, duration: Duration) {
        (**self).record_write_time(duration)
    }

    fn record_feature_count(&mut self, count: u64) {
        (**self).record_feature_count(count)
    }

    fn record_file_sizes(&mut self, input_mb: f64, output_mb: f64) {
        (**self).record_file_sizes(input_mb, output_mb)
    }
}

/// Which collector to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsBackend {
    #[default]
    None,
    Prometheus,
    Json,
    Statsd,
}

impl MetricsBackend {
    pub const ALL: [MetricsBackend; 4] = [
        MetricsBackend::None,
        MetricsBackend::Prometheus,
        MetricsBackend::Json,
        MetricsBackend::Statsd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricsBackend::None => "none",
            MetricsBackend::Prometheus => "prometheus",
            MetricsBackend::Json => "json",
            MetricsBackend::Statsd => "statsd",
        }
    }
}

impl fmt::Display for MetricsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricsBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricsBackend::ALL
            .into_iter()
            .find(|backend| backend.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unknown metrics backend '{}', must be one of: none, prometheus, json, statsd",
                    s
                ))
            })
    }
}

/// Build the collector selected by `settings`
///
/// Backends that open sockets do so here; any failure is returned before a
/// conversion is attempted.
pub fn build_collector(settings: &MetricsSettings) -> Result<Box<dyn MetricsCollector>, ConfigError> {
    let collector: Box<dyn MetricsCollector> = match settings.backend {
        MetricsBackend::None => Box::new(NullCollector),
        MetricsBackend::Json => {
            match &settings.metrics_file {
                Some(path) => info!("JSON metrics will be written to {}", path.display()),
                None => info!("JSON metrics will be printed to console"),
            }
            Box::new(JsonLogCollector::new(settings.metrics_file.clone()))
        }
        MetricsBackend::Prometheus => Box::new(PrometheusCollector::new(settings.prometheus_port)?),
        MetricsBackend::Statsd => Box::new(StatsdCollector::new(
            &settings.statsd_host,
            settings.statsd_port,
        )?),
    };
    Ok(collector)
}
