//! BOM API client over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::domain::Complexity;
use crate::infrastructure::traits::{BomSource, FetchError};

/// Path segments of the BOM tree endpoint.
pub const BOM_TREE_PATH: [&str; 2] = ["api", "bom"];

/// Path segments of the routing table endpoint.
pub const BOM_ROUTING_PATH: [&str; 2] = ["api", "bom-routing"];

/// Longest error body echoed into a status error.
const MAX_ERROR_BODY: usize = 200;

/// Client for the BOM API at a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpBomSource {
    client: Client,
    base_url: Url,
}

/// Error payload returned by the API, e.g. on 404.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: String,
}

impl HttpBomSource {
    /// Create a client for `base_url`; `timeout` of None waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::Endpoint(format!("base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Endpoint(format!(
                "base URL '{}' cannot carry a path",
                base_url
            )));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| FetchError::Network {
            url: base_url.to_string(),
            source,
        })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/<prefix...>/<complexity>/` with the complexity percent-encoded.
    pub fn endpoint(&self, prefix: &[&str], complexity: &Complexity) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Endpoint(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(prefix)
            .push(complexity.as_str())
            .push("");
        Ok(url)
    }

    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn get(&self, url: Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| FetchError::Network {
            url: url.to_string(),
            source,
        })?;
        debug!("get: status={} bytes={}", status, body.len());

        if !status.is_success() {
            let message = error_message(&body);
            warn!("BOM API error {}: {}", status, message);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

/// Server-provided error text, or a truncated raw body.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY).collect()
}

#[async_trait]
impl BomSource for HttpBomSource {
    async fn fetch_tree(&self, complexity: &Complexity) -> Result<String, FetchError> {
        let url = self.endpoint(&BOM_TREE_PATH, complexity)?;
        self.get(url).await
    }

    async fn fetch_routing(&self, complexity: &Complexity) -> Result<String, FetchError> {
        let url = self.endpoint(&BOM_ROUTING_PATH, complexity)?;
        self.get(url).await
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}
