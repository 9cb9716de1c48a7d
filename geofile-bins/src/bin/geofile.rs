//! Shapefile to GeoJSON converter
//!
//! Converts one file and reports the run through the selected metrics
//! backend (none, prometheus, json or statsd).

use anyhow::{Context, Result};
use clap::Parser;
use geofile_bins::common::{init_logging, print_summary, CliArgs};
use geofile_core::{build_collector, ConversionPipeline, MetricsBackend};
use std::time::Duration;

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();
    let settings = args.settings()?;

    // Initialize logging
    init_logging(&settings)?;

    tracing::info!("=== Geofile: {} -> GeoJSON ===", args.input.display());
    tracing::info!("Metrics backend: {}", settings.metrics.backend);

    let collector = match build_collector(&settings.metrics) {
        Ok(collector) => collector,
        Err(e) => {
            tracing::error!("Failed to set up {} metrics: {}", settings.metrics.backend, e);
            tracing::error!("{}", e.remediation());
            return Err(e).context("Metrics backend unavailable, nothing was converted");
        }
    };

    let mut pipeline = ConversionPipeline::new(collector);
    let metadata = pipeline
        .convert(&args.request())
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    print_summary(&metadata);

    if settings.metrics.backend == MetricsBackend::Prometheus && settings.metrics.linger_secs > 0 {
        tracing::info!(
            "Serving metrics for {}s before exit",
            settings.metrics.linger_secs
        );
        std::thread::sleep(Duration::from_secs(settings.metrics.linger_secs));
    }

    Ok(())
}
