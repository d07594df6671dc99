//! Failure-Rate Alerting
//!
//! Counts upstream failures inside a sliding window and pages once when the
//! count reaches a threshold, then starts the window over.

mod config;
mod dispatcher;
mod engine;
mod error;
mod evaluator;
mod notification;
mod summary;
mod watchdog;

pub use config::{AlertingConfig, WatchdogConfig};
pub use dispatcher::AlertDispatcher;
pub use engine::{FailureRateAlerter, IngestOutcome};
pub use error::AlertingError;
pub use evaluator::threshold_crossed;
pub use notification::{ErrorInformation, FailureNotification, LoggingPayload, PayloadMetadata};
pub use summary::{render as render_summary, summarize, DEFAULT_MAX_ERRORS, PLACEHOLDER};
pub use watchdog::{
    CallType, HangingRequestWatchdog, LatencyWatchdog, NoopWatchdog, RequestContext, RequestHandle,
};
