//! Logging setup for binaries and services embedding the simulator.
//!
//! Supports:
//! - Console output (development)
//! - JSON structured logging (production)

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console output (for development).
    Console,
    /// JSON structured logging (for production).
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Log level filter (e.g., "info", "qmc_exec=debug").
    pub log_level: String,
    pub format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Console,
        }
    }
}

impl TelemetryConfig {
    /// Create config from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_LOG`: Log level (default: "info")
    /// - `QMC_LOG_FORMAT`: "console" or "json" (default: "console")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());
        let format = match lookup("QMC_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Console,
        };
        Self { log_level, format }
    }
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init(config: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match config.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(format = ?config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.format, LogFormat::Console);
    }

    #[test]
    fn test_from_lookup() {
        let config = TelemetryConfig::from_lookup(|key| match key {
            "RUST_LOG" => Some("qmc_exec=debug".to_string()),
            "QMC_LOG_FORMAT" => Some("json".to_string()),
            _ => None,
        });
        assert_eq!(config.log_level, "qmc_exec=debug");
        assert_eq!(config.format, LogFormat::Json);

        let config = TelemetryConfig::from_lookup(|_| None);
        assert_eq!(config.format, LogFormat::Console);
    }
}
