use crate::metrics::MetricsBackend;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Metrics backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Backend: "none", "prometheus", "json" or "statsd"
    #[serde(default)]
    pub backend: MetricsBackend,

    /// Port for the Prometheus HTTP endpoint
    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,

    /// JSON Lines destination; stdout when unset
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,

    /// StatsD daemon host
    #[serde(default = "default_statsd_host")]
    pub statsd_host: String,

    /// StatsD daemon port
    #[serde(default = "default_statsd_port")]
    pub statsd_port: u16,

    /// Seconds to keep the Prometheus endpoint up after the conversion
    #[serde(default)]
    pub linger_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

// Default value functions
pub(crate) fn default_prometheus_port() -> u16 {
    8000
}

pub(crate) fn default_statsd_host() -> String {
    "localhost".to_string()
}

pub(crate) fn default_statsd_port() -> u16 {
    8125
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            backend: MetricsBackend::None,
            prometheus_port: default_prometheus_port(),
            metrics_file: None,
            statsd_host: default_statsd_host(),
            statsd_port: default_statsd_port(),
            linger_secs: 0,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_logs: false,
        }
    }
}
