//! HTTP list source.

use super::{records_from_payload, DataSourceError, ListSource};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Remote list fetched with a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpListSource {
    client: Client,
    url: String,
    max_elapsed: Duration,
}

impl HttpListSource {
    /// Create a source for `url`, retrying transient failures for up to
    /// `max_elapsed`.
    pub fn new(url: String, max_elapsed: Duration) -> Self {
        Self {
            client: Client::new(),
            url,
            max_elapsed,
        }
    }

    /// Source for the default import endpoint.
    pub fn default_url() -> Self {
        Self::new(super::DEFAULT_IMPORT_URL.to_string(), Duration::from_secs(30))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get_json(&self) -> Result<serde_json::Value, DataSourceError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self.client.get(&self.url).send().await.map_err(|e| {
                backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
            })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl ListSource for HttpListSource {
    async fn fetch_list(&self) -> Result<Vec<serde_json::Value>, DataSourceError> {
        debug!(url = %self.url, "Fetching remote list");
        let payload = self.get_json().await?;
        let records = records_from_payload(payload)?;
        debug!(count = records.len(), "Fetched remote list");
        Ok(records)
    }
}
