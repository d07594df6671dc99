//! Alerting error types

use pager::PagerError;
use thiserror::Error;

/// Errors raised by the failure-rate alerter
#[derive(Debug, Error)]
pub enum AlertingError {
    /// The failure notification carried no logging payload
    #[error("standard_logging_object is required for failure-rate alerting")]
    MissingPayload,

    /// Invalid construction-time configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The alert could not be delivered
    #[error("Alert dispatch failed: {0}")]
    Dispatch(#[from] PagerError),

    /// The failure store lock was poisoned by a panicking holder
    #[error("Failure store lock error: {0}")]
    StateLock(String),
}
