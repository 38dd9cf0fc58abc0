//! # Provider Config
//! Connection settings for the ClickHouse server the resources are applied to.
//!
//! The same structure is read from the settings file, from
//! `CLICKHOUSEDBOPS__PROVIDER__*` environment variables, or built directly by
//! a host embedding the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

fn default_host() -> String {
    "localhost".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Native,
    Http,
    Https,
}

impl Protocol {
    pub fn default_port(&self) -> u16 {
        match self {
            Protocol::Native => 9000,
            Protocol::Http => 8123,
            Protocol::Https => 8443,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Native => "native",
            Protocol::Http => "http",
            Protocol::Https => "https",
        };
        write!(f, "{s}")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthStrategy {
    Password,
    Basicauth,
}

impl fmt::Display for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStrategy::Password => write!(f, "password"),
            AuthStrategy::Basicauth => write!(f, "basicauth"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub strategy: AuthStrategy,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub protocol: Protocol,
    #[serde(default = "default_host")]
    pub host: String,
    /// Falls back to the protocol's well known port when unset.
    #[serde(default)]
    pub port: Option<u16>,
    pub auth_config: AuthConfig,
    #[serde(default)]
    pub tls_config: Option<TlsConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Http,
            host: default_host(),
            port: None,
            auth_config: AuthConfig {
                strategy: AuthStrategy::Basicauth,
                username: "default".to_string(),
                password: None,
            },
            tls_config: None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("host must not be empty")]
    EmptyHost,

    #[error("auth_config.username must not be empty")]
    EmptyUsername,

    #[error("protocol '{protocol}' requires auth_config.strategy '{expected}'")]
    StrategyMismatch {
        protocol: Protocol,
        expected: AuthStrategy,
    },

    #[error("tls_config is only supported with protocol 'https'")]
    TlsRequiresHttps,
}

impl ProviderConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    pub fn insecure_skip_verify(&self) -> bool {
        self.tls_config
            .as_ref()
            .is_some_and(|tls| tls.insecure_skip_verify)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.auth_config.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }

        let expected = match self.protocol {
            Protocol::Native => AuthStrategy::Password,
            Protocol::Http | Protocol::Https => AuthStrategy::Basicauth,
        };
        if self.auth_config.strategy != expected {
            return Err(ConfigError::StrategyMismatch {
                protocol: self.protocol,
                expected,
            });
        }

        if self.tls_config.is_some() && self.protocol != Protocol::Https {
            return Err(ConfigError::TlsRequiresHttps);
        }

        Ok(())
    }

    /// Connection string without the password, for log lines.
    pub fn display_url(&self) -> String {
        format!(
            "{}://{}@{}:{}",
            self.protocol,
            self.auth_config.username,
            self.host,
            self.port()
        )
    }
}
