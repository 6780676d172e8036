//! Remote list source used by the bulk import.

use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpListSource;
pub use mock::MockListSource;

/// Default endpoint for the list import.
pub const DEFAULT_IMPORT_URL: &str =
    "https://67e1773958cc6bf78525efdf.mockapi.io/api/v1/22657391_VoTrieuAn";

/// Source of remote list records.
#[async_trait]
pub trait ListSource: Send + Sync + fmt::Debug {
    /// Fetch the remote list.
    ///
    /// # Returns
    /// The raw records of the JSON array, in payload order. Records are left
    /// untyped; mapping to drafts applies defaults for missing fields.
    async fn fetch_list(&self) -> Result<Vec<serde_json::Value>, DataSourceError>;
}

/// Error type for remote list fetches.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection refused, DNS failure)
    NetworkError(String),
    /// Non-success HTTP status
    HttpError { status: u16, message: String },
    /// Invalid JSON or a payload that is not an array
    ParseError(String),
    /// Rate limit exceeded and retries ran out
    RateLimited,
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
        }
    }
}

impl std::error::Error for DataSourceError {}

/// Split a decoded payload into its records.
pub(crate) fn records_from_payload(
    payload: serde_json::Value,
) -> Result<Vec<serde_json::Value>, DataSourceError> {
    match payload {
        serde_json::Value::Array(records) => Ok(records),
        other => Err(DataSourceError::ParseError(format!(
            "Expected array response, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
