//! Failure Event Store
//!
//! Keeps the upstream failures observed inside a trailing time window.

mod clock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::FailureStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Correlation identifiers carried through for triage (never interpreted)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityFields {
    pub user_api_key_hash: Option<String>,
    pub user_api_key_alias: Option<String>,
    pub user_api_key_org_id: Option<String>,
    pub user_api_key_team_id: Option<String>,
    pub user_api_key_user_id: Option<String>,
    pub user_api_key_team_alias: Option<String>,
    pub user_api_key_end_user_id: Option<String>,
}

/// One observed upstream failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEvent {
    timestamp: DateTime<Utc>,
    error_class: Option<String>,
    error_code: Option<String>,
    error_provider: Option<String>,
    identity: IdentityFields,
}

impl FailureEvent {
    /// Create an event stamped at `timestamp`.
    ///
    /// Empty classification strings are stored as absent.
    pub fn new(
        timestamp: DateTime<Utc>,
        error_class: Option<String>,
        error_code: Option<String>,
        error_provider: Option<String>,
        identity: IdentityFields,
    ) -> Self {
        Self {
            timestamp,
            error_class: non_empty(error_class),
            error_code: non_empty(error_code),
            error_provider: non_empty(error_provider),
            identity,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn error_class(&self) -> Option<&str> {
        self.error_class.as_deref()
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn error_provider(&self) -> Option<&str> {
        self.error_provider.as_deref()
    }

    pub fn identity(&self) -> &IdentityFields {
        &self.identity
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
