#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClickhouseError {
    #[error("Clickhouse - Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Clickhouse - Query failed ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Clickhouse - Unable to encode query parameters: {0}")]
    QueryParams(#[from] serde_urlencoded::ser::Error),

    #[error("Clickhouse - Unable to decode row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Clickhouse - Missing column '{column}' in result row")]
    MissingColumn { column: String },

    #[error("Clickhouse - Column '{column}' is not a {expected}")]
    UnexpectedType {
        column: String,
        expected: &'static str,
    },

    #[error("Clickhouse - Unsupported protocol: {0}")]
    UnsupportedProtocol(String),
}
