//! Alerting configuration

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Failure-rate alerting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Trailing retention window (seconds)
    pub window_seconds: u64,
    /// Retained-failure count that triggers an alert
    pub failure_threshold: i64,
    /// Most recent failures listed in an alert
    pub max_summary_errors: usize,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            window_seconds: 60,
            failure_threshold: 1,
            max_summary_errors: 5,
        }
    }
}

impl AlertingConfig {
    /// Log settings that are accepted but almost certainly unintended
    pub fn warn_if_suspicious(&self) {
        if self.failure_threshold <= 0 {
            warn!(
                "failure_threshold is {}; every failure will page",
                self.failure_threshold
            );
        }
        if self.window_seconds == 0 {
            warn!("window_seconds is 0; failures are pruned as soon as they are recorded");
        }
        if self.max_summary_errors == 0 {
            warn!("max_summary_errors is 0; alerts will carry no recent errors");
        }
    }
}

/// Hanging-request watchdog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Page on hanging requests
    pub enabled: bool,
    /// Time a request may stay in flight before it counts as hanging (seconds)
    pub latency_budget_secs: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latency_budget_secs: 300,
        }
    }
}
