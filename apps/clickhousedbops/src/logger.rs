//! # Logger Module
//!
//! Logging for the provider process using `tracing-subscriber`.
//!
//! Logs go to stderr, stdout belongs to the host protocol. `RUST_LOG` takes
//! precedence over the configured level:
//! ```bash
//! RUST_LOG=clickhousedbops::dbops=debug
//! ```
//!
//! ## Environment Variables
//!
//! - `CLICKHOUSEDBOPS__LOGGER__LEVEL`: DEBUG, INFO, WARN or ERROR (default: INFO)
//! - `CLICKHOUSEDBOPS__LOGGER__FORMAT`: Text or Json (default: Text)
//! - `CLICKHOUSEDBOPS__LOGGER__INCLUDE_TARGET`: prefix lines with the module path (default: `true`)
//!
//! ## Log Levels
//!
//! - `DEBUG`: every SQL statement sent to ClickHouse and every row fetched.
//! - `INFO`: objects created, renamed, granted or dropped.
//! - `WARN`: best-effort steps that failed without failing the operation.
//! - `ERROR`: requests that gave up after retrying.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum LoggerLevel {
    #[serde(alias = "DEBUG", alias = "debug")]
    Debug,
    #[serde(alias = "INFO", alias = "info")]
    Info,
    #[serde(alias = "WARN", alias = "warn")]
    Warn,
    #[serde(alias = "ERROR", alias = "error")]
    Error,
}

impl LoggerLevel {
    pub fn to_tracing_level(&self) -> LevelFilter {
        match self {
            LoggerLevel::Debug => LevelFilter::DEBUG,
            LoggerLevel::Info => LevelFilter::INFO,
            LoggerLevel::Warn => LevelFilter::WARN,
            LoggerLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    #[serde(alias = "json", alias = "JSON")]
    Json,
    #[serde(alias = "text", alias = "TEXT")]
    Text,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggerSettings {
    #[serde(default = "default_log_level")]
    pub level: LoggerLevel,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    #[serde(default = "default_include_target")]
    pub include_target: bool,
}

fn default_log_level() -> LoggerLevel {
    LoggerLevel::Info
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_include_target() -> bool {
    true
}

impl Default for LoggerSettings {
    fn default() -> Self {
        LoggerSettings {
            level: default_log_level(),
            format: default_log_format(),
            include_target: default_include_target(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoggerError {
    #[error("Error installing the global logger: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// RFC 3339 UTC timestamps with millisecond precision.
struct UtcTimestamp;

impl FormatTime for UtcTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

fn env_filter(settings: &LoggerSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_tracing_level().to_string()))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn setup_logging(settings: &LoggerSettings) -> Result<(), LoggerError> {
    let format_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(UtcTimestamp)
        .with_target(settings.include_target)
        .with_level(true);

    if settings.format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(env_filter(settings))
            .with(format_layer.json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter(settings))
            .with(format_layer.compact())
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_aliases() {
        let settings: LoggerSettings =
            serde_json::from_str(r#"{"level": "debug", "format": "JSON"}"#).unwrap();
        assert_eq!(settings.level, LoggerLevel::Debug);
        assert_eq!(settings.format, LogFormat::Json);
        assert!(settings.include_target);
        assert_eq!(settings.level.to_tracing_level(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_defaults() {
        let settings: LoggerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, LoggerSettings::default());
    }

    #[test]
    fn test_second_install_fails() {
        let settings = LoggerSettings::default();
        let _ = setup_logging(&settings);
        assert!(setup_logging(&settings).is_err());
    }
}
