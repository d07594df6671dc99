//! Event payloads (Events API v2 shape)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
}

/// Action requested from the paging service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Trigger,
}

/// Alert body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagerDutyPayload {
    pub summary: String,
    pub severity: Severity,
    pub source: String,
    pub component: String,
    pub custom_details: BTreeMap<String, serde_json::Value>,
}

/// Full request posted to the events endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagerDutyRequestBody {
    pub payload: PagerDutyPayload,
    pub routing_key: String,
    pub event_action: EventAction,
}
