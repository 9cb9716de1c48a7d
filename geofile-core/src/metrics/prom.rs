//! Prometheus metrics for conversion monitoring
//!
//! Provides:
//! - Conversion outcomes (counter by status)
//! - Durations (total, read, write)
//! - Last conversion shape (feature count, input/output size)
//!
//! Each collector owns its registry. Nothing is registered in the process-wide
//! default registry, so two collectors in one process never collide.

use super::server::{MetricsServer, MetricsServerConfig, MetricsServerHandle};
use super::{ConversionMetadata, MetricsCollector};
use crate::error::ConfigError;
use prometheus::{Gauge, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Metric name prefix
pub const NAMESPACE: &str = "shapefile";

/// Bucket boundaries (seconds) for total conversion duration
pub const DURATION_BUCKETS: [f64; 8] = [0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// The metric set reported for conversions
pub struct ConversionMetrics {
    /// Conversions by outcome (`status` = success | failure)
    pub conversions_total: IntCounterVec,
    /// Total conversion duration (seconds)
    pub conversion_duration: Histogram,
    /// Read duration (seconds)
    pub read_duration: Histogram,
    /// Write duration (seconds)
    pub write_duration: Histogram,
    /// Features in the last converted file
    pub feature_count: IntGauge,
    /// Last input size (MB)
    pub input_size_mb: Gauge,
    /// Last output size (MB)
    pub output_size_mb: Gauge,
}

impl ConversionMetrics {
    /// Create the metric set and register it in `registry`
    ///
    /// Registering twice into the same registry fails with
    /// `ConfigError::DuplicateRegistration`.
    pub fn register(registry: &Registry) -> Result<Self, ConfigError> {
        let conversions_total = IntCounterVec::new(
            Opts::new("conversions_total", "Total number of shapefile conversions")
                .namespace(NAMESPACE),
            &["status"],
        )?;
        register(registry, &conversions_total)?;

        let conversion_duration = Histogram::with_opts(
            HistogramOpts::new("conversion_duration_seconds", "Time taken to convert shapefile")
                .namespace(NAMESPACE)
                .buckets(DURATION_BUCKETS.to_vec()),
        )?;
        register(registry, &conversion_duration)?;

        let read_duration = Histogram::with_opts(
            HistogramOpts::new("read_duration_seconds", "Time taken to read shapefile")
                .namespace(NAMESPACE),
        )?;
        register(registry, &read_duration)?;

        let write_duration = Histogram::with_opts(
            HistogramOpts::new("write_duration_seconds", "Time taken to write GeoJSON")
                .namespace(NAMESPACE),
        )?;
        register(registry, &write_duration)?;

        let feature_count = IntGauge::with_opts(
            Opts::new("feature_count", "Number of features in the shapefile").namespace(NAMESPACE),
        )?;
        register(registry, &feature_count)?;

        let input_size_mb = Gauge::with_opts(
            Opts::new("input_size_mb", "Input shapefile size in MB").namespace(NAMESPACE),
        )?;
        register(registry, &input_size_mb)?;

        let output_size_mb = Gauge::with_opts(
            Opts::new("output_size_mb", "Output GeoJSON file size in MB").namespace(NAMESPACE),
        )?;
        register(registry, &output_size_mb)?;

        Ok(Self {
            conversions_total,
            conversion_duration,
            read_duration,
            write_duration,
            feature_count,
            input_size_mb,
            output_size_mb,
        })
    }
}

fn register<M>(registry: &Registry, metric: &M) -> Result<(), ConfigError>
where
    M: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(metric.clone()))
        .map_err(|e| match e {
            prometheus::Error::AlreadyReg => ConfigError::DuplicateRegistration,
            other => ConfigError::Prometheus(other),
        })
}

/// Collector that exposes conversion metrics for Prometheus scraping
pub struct PrometheusCollector {
    registry: Arc<Registry>,
    metrics: ConversionMetrics,
    server: Option<MetricsServerHandle>,
}

impl PrometheusCollector {
    /// Register metrics and serve them on `0.0.0.0:<port>/metrics`
    pub fn new(port: u16) -> Result<Self, ConfigError> {
        Self::with_server(MetricsServerConfig::on_port(port))
    }

    /// Register metrics and serve them with an explicit server config
    pub fn with_server(config: MetricsServerConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(Registry::new());
        let metrics = ConversionMetrics::register(&registry)?;
        let metrics_path = config.metrics_path.clone();
        let server = MetricsServer::new(config, registry.clone()).spawn()?;

        info!(
            "Prometheus metrics available at http://{}{}",
            server.local_addr(),
            metrics_path
        );

        Ok(Self {
            registry,
            metrics,
            server: Some(server),
        })
    }

    /// Register metrics into a caller-owned registry without starting a server
    ///
    /// For embedding in a process that already exposes `registry`.
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self, ConfigError> {
        let metrics = ConversionMetrics::register(&registry)?;
        Ok(Self {
            registry,
            metrics,
            server: None,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn metrics(&self) -> &ConversionMetrics {
        &self.metrics
    }

    /// Address the endpoint is bound to, if a server was started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(MetricsServerHandle::local_addr)
    }

    /// Current metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        super::server::encode_metrics(&self.registry)
    }
}

impl MetricsCollector for PrometheusCollector {
    fn record_conversion_start(&mut self) {}

    fn record_conversion_success(&mut self, duration: Duration, _metadata: &ConversionMetadata) {
        self.metrics
            .conversions_total
            .with_label_values(&["success"])
            .inc();
        self.metrics
            .conversion_duration
            .observe(duration.as_secs_f64());
    }

    fn record_conversion_failure(&mut self, _error: &str) {
        self.metrics
            .conversions_total
            .with_label_values(&["failure"])
            .inc();
    }

    fn record_read_time(&mut self, duration: Duration) {
        self.metrics.read_duration.observe(duration.as_secs_f64());
    }

    fn record_write_time(&mut self, duration: Duration) {
        self.metrics.write_duration.observe(duration.as_secs_f64());
    }

    fn record_feature_count(&mut self, count: u64) {
        self.metrics
            .feature_count
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    fn record_file_sizes(&mut self, input_mb: f64, output_mb: f64) {
        self.metrics.input_size_mb.set(input_mb);
        self.metrics.output_size_mb.set(output_mb);
    }
}
