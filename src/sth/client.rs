//! STH REST API Client
//!
//! HTTP client for the FIWARE STH-Comet history endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use super::types::{AttrValue, HistoryResponse};
use crate::config::SthConfig;
use crate::poller::SampleSource;

/// STH history client for a single entity attribute
pub struct SthClient {
    client: Client,
    config: SthConfig,
}

impl SthClient {
    /// Create a new STH client with the given configuration
    pub fn new(config: SthConfig) -> Result<Self, SthError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder.build().map_err(SthError::Request)?;

        // Fail early on a base URL the history path cannot be joined to
        let client = Self { client, config };
        client.history_url(1)?;

        Ok(client)
    }

    /// Get the current configuration
    pub fn config(&self) -> &SthConfig {
        &self.config
    }

    /// Build the `lastN` history query URL
    pub fn history_url(&self, last_n: usize) -> Result<Url, SthError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| SthError::InvalidUrl(format!("{}: {}", self.config.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| SthError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "STH",
                "v1",
                "contextEntities",
                "type",
                self.config.entity_type.as_str(),
                "id",
                self.config.entity_id.as_str(),
                "attributes",
                self.config.attribute.as_str(),
            ]);

        url.query_pairs_mut()
            .append_pair("lastN", &last_n.to_string());

        Ok(url)
    }

    /// Fetch the `last_n` most recent values, reporting every failure
    pub async fn fetch_values(&self, last_n: usize) -> Result<Vec<AttrValue>, SthError> {
        let url = self.history_url(last_n)?;

        let response = self
            .client
            .get(url.clone())
            .header("fiware-service", &self.config.service)
            .header("fiware-servicepath", &self.config.service_path)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SthError::Timeout
                } else {
                    SthError::Request(e)
                }
            })?;

        if response.status() != StatusCode::OK {
            return Err(SthError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(SthError::Request)?;
        let envelope: HistoryResponse =
            serde_json::from_slice(&body).map_err(|e| SthError::Decode(e.to_string()))?;

        envelope.into_values()
    }

    /// Fetch the `last_n` most recent values.
    ///
    /// Any failure is logged and treated as "no new data": the result is an
    /// empty list.
    pub async fn latest_values(&self, last_n: usize) -> Vec<AttrValue> {
        match self.fetch_values(last_n).await {
            Ok(values) => {
                tracing::debug!(count = values.len(), last_n, "Fetched STH history window");
                values
            }
            Err(e) => {
                tracing::warn!(
                    entity = %self.config.entity_id,
                    attribute = %self.config.attribute,
                    error = %e,
                    "STH fetch failed, no new data this tick"
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SampleSource for SthClient {
    async fn latest(&self, last_n: usize) -> Vec<AttrValue> {
        self.latest_values(last_n).await
    }
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when querying STH
#[derive(Error, Debug)]
pub enum SthError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Error accessing {url}: HTTP {status}")]
    Status { status: u16, url: String },

    #[error("Key error: {0}")]
    MissingKey(&'static str),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid STH URL: {0}")]
    InvalidUrl(String),

    #[error("Request timeout")]
    Timeout,
}
