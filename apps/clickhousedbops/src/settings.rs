//! # Settings
//!
//! Provider and logger configuration, layered from an optional TOML file and
//! `CLICKHOUSEDBOPS__*` environment variables (environment wins):
//!
//! ```toml
//! [provider]
//! protocol = "https"
//! host = "ch.example.com"
//!
//! [provider.auth_config]
//! strategy = "basicauth"
//! username = "admin"
//!
//! [logger]
//! level = "DEBUG"
//! ```
//!
//! `CLICKHOUSEDBOPS__PROVIDER__AUTH_CONFIG__PASSWORD=...` keeps the password
//! out of the file.

use std::path::Path;

use anyhow::Context;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::infrastructure::clickhouse::ProviderConfig;
use crate::logger::LoggerSettings;

pub const ENV_PREFIX: &str = "CLICKHOUSEDBOPS";
const ENV_SEPARATOR: &str = "__";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logger: LoggerSettings,
}

/// Loads settings from `path` (if it exists) overlaid with the environment.
pub fn read_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(false));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .build()
        .context("Failed to read settings")?
        .try_deserialize::<Settings>()
        .context("Failed to parse settings")?;

    settings
        .provider
        .validate()
        .context("Invalid provider settings")?;

    Ok(settings)
}
