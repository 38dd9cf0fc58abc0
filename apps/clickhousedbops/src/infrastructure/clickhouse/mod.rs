//! # ClickHouse
//!
//! The "execute SQL / fetch rows" collaborator every dbops operation goes
//! through. [`ClickhouseClient`] is the seam: the built-in implementation
//! talks HTTP(S), tests substitute an in-memory double.

use async_trait::async_trait;

pub mod config;
pub mod errors;
pub mod http_client;
#[cfg(test)]
pub(crate) mod mock;
pub mod row;

pub use config::{AuthConfig, AuthStrategy, ConfigError, Protocol, ProviderConfig, TlsConfig};
pub use errors::ClickhouseError;
pub use http_client::HttpClickhouseClient;
pub use row::Row;

#[async_trait]
pub trait ClickhouseClient: Send + Sync {
    /// Runs a statement that returns no rows.
    async fn exec(&self, sql: &str) -> Result<(), ClickhouseError>;

    /// Runs a query and returns every result row.
    async fn select(&self, sql: &str) -> Result<Vec<Row>, ClickhouseError>;
}
