//! Common utilities for the geofile binary
//!
//! CLI parsing, settings overrides, logging setup and the final summary.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use geofile_core::utils::init_logger;
use geofile_core::{ConversionMetadata, ConversionRequest, MetricsBackend, Settings};
use std::path::PathBuf;

/// Metrics backend choices on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricsArg {
    None,
    Prometheus,
    Json,
    Statsd,
}

impl From<MetricsArg> for MetricsBackend {
    fn from(arg: MetricsArg) -> Self {
        match arg {
            MetricsArg::None => MetricsBackend::None,
            MetricsArg::Prometheus => MetricsBackend::Prometheus,
            MetricsArg::Json => MetricsBackend::Json,
            MetricsArg::Statsd => MetricsBackend::Statsd,
        }
    }
}

/// Convert a shapefile to GeoJSON with optional metrics
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Input shapefile (.shp) or GeoJSON file
    pub input: PathBuf,

    /// Output GeoJSON path (defaults to the input with a .geojson extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Metrics backend
    #[arg(long, value_enum)]
    pub metrics: Option<MetricsArg>,

    /// Port for the Prometheus metrics endpoint
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// File for JSON Lines metrics (stdout when omitted)
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,

    /// StatsD host
    #[arg(long)]
    pub statsd_host: Option<String>,

    /// StatsD port
    #[arg(long)]
    pub statsd_port: Option<u16>,

    /// Seconds to keep the Prometheus endpoint up after converting
    #[arg(long)]
    pub metrics_linger: Option<u64>,

    /// Optional TOML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    /// Load settings (defaults, config file, env) and apply CLI overrides
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref()).with_context(|| match &self.config {
            Some(path) => format!("Failed to load settings from {}", path.display()),
            None => "Failed to load settings".to_string(),
        })?;
        self.apply(&mut settings);
        settings.validate().context("Invalid settings")?;
        Ok(settings)
    }

    /// Flags given on the command line win over every other source
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(metrics) = self.metrics {
            settings.metrics.backend = metrics.into();
        }
        if let Some(port) = self.metrics_port {
            settings.metrics.prometheus_port = port;
        }
        if let Some(path) = &self.metrics_file {
            settings.metrics.metrics_file = Some(path.clone());
        }
        if let Some(host) = &self.statsd_host {
            settings.metrics.statsd_host = host.clone();
        }
        if let Some(port) = self.statsd_port {
            settings.metrics.statsd_port = port;
        }
        if let Some(secs) = self.metrics_linger {
            settings.metrics.linger_secs = secs;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level = level.clone();
        }
        if self.json_logs {
            settings.logging.json_logs = true;
        }
    }

    pub fn request(&self) -> ConversionRequest {
        let request = ConversionRequest::new(&self.input);
        match &self.output {
            Some(output) => request.with_output(output),
            None => request,
        }
    }
}

/// Initialize tracing/logging
pub fn init_logging(settings: &Settings) -> Result<()> {
    init_logger(&settings.logging)
}

/// Print the conversion summary
pub fn print_summary(metadata: &ConversionMetadata) {
    tracing::info!("=== Conversion Complete ===");
    tracing::info!("Input: {}", metadata.input_file);
    tracing::info!("Output: {}", metadata.output_file);
    tracing::info!("Features: {}", metadata.feature_count);
    tracing::info!("CRS: {}", metadata.crs);
    tracing::info!(
        "Size: {:.2} MB -> {:.2} MB",
        metadata.input_size_mb,
        metadata.output_size_mb
    );

    if metadata.input_size_mb > 0.0 {
        let ratio = metadata.output_size_mb / metadata.input_size_mb;
        tracing::info!("Size ratio: {:.2}x", ratio);
    }
}
