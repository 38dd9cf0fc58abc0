//! HTTP(S) ClickHouse client.
//!
//! Statements are POSTed as the request body. Result sets are requested in
//! `JSONEachRow` format so each line decodes into a [`Row`].

use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use tracing::{debug, error};

use super::config::{Protocol, ProviderConfig};
use super::errors::ClickhouseError;
use super::row::Row;
use super::ClickhouseClient;

// ClickHouse can take a while to accept connections after a restart
const BACKOFF_START_MILLIS: u64 = 1000;
const MAX_RETRIES: u8 = 10;
// Retries will be 1s, 2s, 4s, 8s, 16s, 32s, 64s, 128s, 256s, 512s

const DDL_COMMANDS: &[&str] = &[
    "INSERT", "CREATE", "ALTER", "DROP", "TRUNCATE", "GRANT", "REVOKE",
];

pub struct HttpClickhouseClient {
    client: reqwest::Client,
    url: String,
    username: String,
    password: Option<String>,
    max_retries: u8,
    backoff_start_millis: u64,
}

impl HttpClickhouseClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ClickhouseError> {
        let scheme = match config.protocol {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Native => {
                return Err(ClickhouseError::UnsupportedProtocol(
                    config.protocol.to_string(),
                ))
            }
        };

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify())
            .build()?;

        Ok(Self {
            client,
            url: format!("{}://{}:{}/", scheme, config.host, config.port()),
            username: config.auth_config.username.clone(),
            password: config.auth_config.password.clone(),
            max_retries: MAX_RETRIES,
            backoff_start_millis: BACKOFF_START_MILLIS,
        })
    }

    /// Overrides the connect retry policy.
    pub fn with_retries(mut self, max_retries: u8, backoff_start_millis: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_start_millis = backoff_start_millis;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, sql: &str) -> Result<String, ClickhouseError> {
        let params = query_param(sql)?;
        let mut retries = self.max_retries;
        let mut backoff_millis = self.backoff_start_millis;

        loop {
            let res = self
                .client
                .post(format!("{}?{}", self.url, params))
                .basic_auth(&self.username, self.password.as_ref())
                .body(sql.to_string())
                .send()
                .await;

            match res {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await?;
                    if !status.is_success() {
                        error!("Failed to execute SQL: Res {} - {}", status, body.trim());
                        return Err(ClickhouseError::Server {
                            status: status.as_u16(),
                            message: body.trim().to_string(),
                        });
                    }
                    return Ok(body);
                }
                Err(e) if e.is_connect() && retries > 0 => {
                    debug!(
                        "Connection to ClickHouse failed, retrying in {}ms: {}",
                        backoff_millis, e
                    );
                    sleep(Duration::from_millis(backoff_millis)).await;
                    retries -= 1;
                    backoff_millis = next_backoff(backoff_millis);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Doubles the retry delay, capped at `u64::MAX`.
fn next_backoff(millis: u64) -> u64 {
    millis.saturating_mul(2)
}

/// Encodes the URL parameters sent alongside a statement.
///
/// `wait_end_of_query` makes ClickHouse buffer the response until DDL has
/// finished, so errors are reported with a non-200 status instead of
/// mid-stream. Reads skip it to keep responses streaming.
fn query_param(sql: &str) -> Result<String, ClickhouseError> {
    let mut params = vec![("default_format", "JSONEachRow")];

    let query_upper = sql.trim().to_uppercase();
    if DDL_COMMANDS.iter().any(|cmd| query_upper.starts_with(cmd)) {
        params.push(("wait_end_of_query", "1"));
    }

    Ok(serde_urlencoded::to_string(&params)?)
}

#[async_trait]
impl ClickhouseClient for HttpClickhouseClient {
    async fn exec(&self, sql: &str) -> Result<(), ClickhouseError> {
        debug!("Executing SQL: {}", sql);
        self.request(sql).await?;
        Ok(())
    }

    async fn select(&self, sql: &str) -> Result<Vec<Row>, ClickhouseError> {
        debug!("Executing HTTP query: {}", sql);
        let text = self.request(sql).await?;

        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(Row::parse)
            .collect()
    }
}
