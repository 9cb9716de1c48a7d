pub mod types;

pub use types::*;

use crate::error::ConfigError;
use config::{Config as ConfigLoader, Environment, File, FileFormat};
use std::path::Path;

/// Environment variable prefix (`GEOFILE__METRICS__BACKEND=json`)
pub const ENV_PREFIX: &str = "GEOFILE";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Settings {
    /// Load settings: defaults, then the optional TOML file, then `GEOFILE__*` env vars
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    pub(crate) fn load_with_env_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = ConfigLoader::builder()
            // Start with default values
            .set_default("metrics.backend", "none")?
            .set_default("metrics.prometheus_port", i64::from(default_prometheus_port()))?
            .set_default("metrics.statsd_host", default_statsd_host())?
            .set_default("metrics.statsd_port", i64::from(default_statsd_port()))?
            .set_default("metrics.linger_secs", 0_i64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json_logs", false)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let settings: Settings = builder
            // Override with environment variables (GEOFILE__)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.logging.level, VALID_LOG_LEVELS
            )));
        }

        if self.metrics.statsd_host.trim().is_empty() {
            return Err(ConfigError::Invalid("statsd_host must not be empty".to_string()));
        }

        if let Some(path) = &self.metrics.metrics_file {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("metrics_file must not be empty".to_string()));
            }
        }

        Ok(())
    }
}
