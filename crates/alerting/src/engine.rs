//! Failure-Rate Alerter
//!
//! Entry point invoked once per observed upstream failure. Appending,
//! pruning, evaluating and resetting happen in one critical section; the page
//! itself is sent after the lock is released.

use crate::config::AlertingConfig;
use crate::dispatcher::AlertDispatcher;
use crate::error::AlertingError;
use crate::evaluator::threshold_crossed;
use crate::notification::FailureNotification;
use crate::summary;
use crate::watchdog::{LatencyWatchdog, RequestContext};
use chrono::{DateTime, Duration, Utc};
use failure_store::{Clock, FailureStore};
use metrics::{counter, gauge};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Result of recording one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Below threshold; `retained` failures remain in the window
    Recorded { retained: usize },
    /// Threshold crossed; an alert covering `failures` was dispatched and the window reset
    Alerted { failures: usize },
}

/// Sliding-window failure-rate alerter
pub struct FailureRateAlerter {
    /// Configuration
    config: AlertingConfig,
    /// Retention window
    window: Duration,
    /// Failures inside the window
    store: Mutex<FailureStore>,
    dispatcher: Arc<AlertDispatcher>,
    watchdog: Arc<dyn LatencyWatchdog>,
    clock: Arc<dyn Clock>,
}

impl FailureRateAlerter {
    /// Create a new alerter with an empty failure store
    pub fn new(
        config: AlertingConfig,
        dispatcher: Arc<AlertDispatcher>,
        watchdog: Arc<dyn LatencyWatchdog>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AlertingError> {
        let window = i64::try_from(config.window_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                AlertingError::Configuration(format!(
                    "window_seconds {} is out of range",
                    config.window_seconds
                ))
            })?;

        config.warn_if_suspicious();
        info!("Creating failure-rate alerter with config: {:?}", config);

        Ok(Self {
            config,
            window,
            store: Mutex::new(FailureStore::new()),
            dispatcher,
            watchdog,
            clock,
        })
    }

    /// Record one failure and page if the window now holds enough of them.
    ///
    /// The window is reset as soon as a crossing is observed, before the page
    /// is sent; a failed send is still reported to the caller.
    pub async fn record_failure(
        &self,
        notification: &FailureNotification,
    ) -> Result<IngestOutcome, AlertingError> {
        let payload = notification
            .standard_logging_object
            .as_ref()
            .ok_or(AlertingError::MissingPayload)?;

        let crossing = {
            let mut store = self.lock_store()?;
            let now = self.clock.now();

            store.append(payload.to_failure_event(now));
            store.prune(self.cutoff(now));

            let retained = store.size();
            counter!("failwatch_failures_recorded_total").increment(1);

            if !threshold_crossed(retained, self.config.failure_threshold) {
                gauge!("failwatch_retained_failures").set(retained as f64);
                debug!(
                    "{} failures in window, threshold {}",
                    retained, self.config.failure_threshold
                );
                return Ok(IngestOutcome::Recorded { retained });
            }

            gauge!("failwatch_retained_failures").set(0.0);
            store.drain_all()
        };

        let failures = crossing.len();
        let recent_errors = summary::render(&crossing, self.config.max_summary_errors);
        let message = format!(
            "High LLM API Failure Rate: {} failures in the last {} seconds.",
            failures, self.config.window_seconds
        );

        let mut details = BTreeMap::new();
        details.insert("recent_errors".to_string(), json!(recent_errors));

        info!("Failure threshold crossed: {}", message);
        self.dispatcher.dispatch(&message, details).await?;

        Ok(IngestOutcome::Alerted { failures })
    }

    /// Request-lifecycle hook: hand the request to the latency watchdog
    pub fn pre_call_hook(&self, ctx: RequestContext) {
        debug!("Pre-call hook for {} request {}", ctx.call_type, ctx.request_id);
        self.watchdog.monitor(ctx);
    }

    /// Failures currently inside the window; expired ones are pruned first
    pub fn retained_failures(&self) -> Result<usize, AlertingError> {
        let mut store = self.lock_store()?;
        store.prune(self.cutoff(self.clock.now()));

        let retained = store.size();
        gauge!("failwatch_retained_failures").set(retained as f64);
        Ok(retained)
    }

    pub fn config(&self) -> &AlertingConfig {
        &self.config
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, FailureStore>, AlertingError> {
        self.store
            .lock()
            .map_err(|e| AlertingError::StateLock(e.to_string()))
    }
}
