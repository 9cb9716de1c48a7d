use crate::config::LoggingSettings;
use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing logger
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so stdout stays clean for JSON Lines metrics.
pub fn init_logger(settings: &LoggingSettings) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;

    let result = if settings.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| anyhow!("Failed to initialize logger: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_error_not_panic() {
        let settings = LoggingSettings::default();
        // Another test may have installed a subscriber already
        let _ = init_logger(&settings);
        assert!(init_logger(&settings).is_err());
    }
}
