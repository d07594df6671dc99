//! Delivery of events to the paging service

use crate::{PagerDutyRequestBody, PagerError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Events API v2 enqueue endpoint
pub const DEFAULT_EVENTS_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// Paging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerConfig {
    /// Events endpoint
    pub endpoint: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
    /// `source` field of every alert
    pub source: String,
    /// `component` field of every alert
    pub component: String,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_EVENTS_URL.to_string(),
            timeout_secs: 10,
            source: "LLM Gateway Alert".to_string(),
            component: "llm-gateway".to_string(),
        }
    }
}

/// Capability to deliver one event to the paging service.
///
/// Implementations report the outcome of a single send and do not retry.
#[async_trait]
pub trait PagingTransport: Send + Sync {
    async fn send(&self, body: &PagerDutyRequestBody) -> Result<(), PagerError>;
}

/// JSON-over-HTTPS transport
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport from configuration
    pub fn new(config: &PagerConfig) -> Result<Self, PagerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PagerError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl PagingTransport for HttpTransport {
    async fn send(&self, body: &PagerDutyRequestBody) -> Result<(), PagerError> {
        let json = serde_json::to_vec(body).map_err(|e| PagerError::Serialization(e.to_string()))?;

        debug!("Sending alert to paging service: POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(json)
            .send()
            .await
            .map_err(|e| PagerError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PagerError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
