//! Inbound failure notifications

use chrono::{DateTime, Utc};
use failure_store::{FailureEvent, IdentityFields};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One failure reported by the upstream request pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FailureNotification {
    pub standard_logging_object: Option<LoggingPayload>,
}

/// Logging object attached to a failed call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingPayload {
    #[serde(default)]
    pub metadata: Option<PayloadMetadata>,
    #[serde(default)]
    pub error_information: Option<ErrorInformation>,
}

/// Caller identity recorded with the request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadMetadata {
    pub user_api_key_hash: Option<String>,
    pub user_api_key_alias: Option<String>,
    pub user_api_key_org_id: Option<String>,
    pub user_api_key_team_id: Option<String>,
    pub user_api_key_user_id: Option<String>,
    pub user_api_key_team_alias: Option<String>,
    pub user_api_key_end_user_id: Option<String>,
}

/// Error classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorInformation {
    pub error_class: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub error_code: Option<String>,
    pub llm_provider: Option<String>,
}

impl FailureNotification {
    /// Notification wrapping `payload`
    pub fn new(payload: LoggingPayload) -> Self {
        Self {
            standard_logging_object: Some(payload),
        }
    }
}

impl LoggingPayload {
    /// Payload with classification only
    pub fn with_error(
        error_class: Option<&str>,
        error_code: Option<&str>,
        llm_provider: Option<&str>,
    ) -> Self {
        Self {
            metadata: None,
            error_information: Some(ErrorInformation {
                error_class: error_class.map(str::to_string),
                error_code: error_code.map(str::to_string),
                llm_provider: llm_provider.map(str::to_string),
            }),
        }
    }

    /// Record this payload as a failure observed at `timestamp`
    pub fn to_failure_event(&self, timestamp: DateTime<Utc>) -> FailureEvent {
        let error = self.error_information.clone().unwrap_or_default();
        let metadata = self.metadata.clone().unwrap_or_default();

        FailureEvent::new(
            timestamp,
            error.error_class,
            error.error_code,
            error.llm_provider,
            IdentityFields {
                user_api_key_hash: metadata.user_api_key_hash,
                user_api_key_alias: metadata.user_api_key_alias,
                user_api_key_org_id: metadata.user_api_key_org_id,
                user_api_key_team_id: metadata.user_api_key_team_id,
                user_api_key_user_id: metadata.user_api_key_user_id,
                user_api_key_team_alias: metadata.user_api_key_team_alias,
                user_api_key_end_user_id: metadata.user_api_key_end_user_id,
            },
        )
    }
}

// Providers report status codes as either strings or integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
