//! Paging Service Client
//!
//! Event payloads for the paging provider's event-ingestion API and the
//! transports that deliver them.

mod payload;
mod transport;

pub use payload::{EventAction, PagerDutyPayload, PagerDutyRequestBody, Severity};
pub use transport::{HttpTransport, PagerConfig, PagingTransport, DEFAULT_EVENTS_URL};

use std::fmt;
use thiserror::Error;

/// Environment variable holding the routing key
pub const ROUTING_KEY_ENV: &str = "PAGERDUTY_API_KEY";

/// Paging errors
#[derive(Debug, Error)]
pub enum PagerError {
    #[error("{} is not set", ROUTING_KEY_ENV)]
    MissingRoutingKey,

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    Http(String),

    #[error("Paging service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Secret identifying the paging destination
#[derive(Clone, PartialEq, Eq)]
pub struct RoutingKey(String);

impl RoutingKey {
    /// Wrap a routing key, rejecting blank values
    pub fn new(key: impl Into<String>) -> Result<Self, PagerError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(PagerError::MissingRoutingKey);
        }
        Ok(Self(key))
    }

    /// Read the routing key from `PAGERDUTY_API_KEY`
    pub fn from_env() -> Result<Self, PagerError> {
        let key = std::env::var(ROUTING_KEY_ENV).map_err(|_| PagerError::MissingRoutingKey)?;
        Self::new(key)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoutingKey(***)")
    }
}
