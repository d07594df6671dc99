//! Hanging-request watchdog
//!
//! Watches a single in-flight request against a latency budget. Runs on its
//! own task and never touches the failure store.

use crate::dispatcher::AlertDispatcher;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Kind of upstream call being monitored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Completion,
    TextCompletion,
    Embeddings,
    ImageGeneration,
    Moderation,
    AudioTranscription,
    PassThroughEndpoint,
    Rerank,
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallType::Completion => "completion",
            CallType::TextCompletion => "text_completion",
            CallType::Embeddings => "embeddings",
            CallType::ImageGeneration => "image_generation",
            CallType::Moderation => "moderation",
            CallType::AudioTranscription => "audio_transcription",
            CallType::PassThroughEndpoint => "pass_through_endpoint",
            CallType::Rerank => "rerank",
        };
        f.write_str(name)
    }
}

/// An in-flight request as seen by a watchdog
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub call_type: CallType,
    pub model: Option<String>,
    pub started_at: DateTime<Utc>,
    completion: watch::Receiver<bool>,
}

/// Owned by whoever serves the request; signals completion
#[derive(Debug)]
pub struct RequestHandle {
    request_id: Uuid,
    done: watch::Sender<bool>,
}

impl RequestContext {
    /// Start tracking a request
    pub fn start(call_type: CallType, model: Option<String>) -> (Self, RequestHandle) {
        let (done, completion) = watch::channel(false);
        let request_id = Uuid::new_v4();

        let ctx = Self {
            request_id,
            call_type,
            model,
            started_at: Utc::now(),
            completion,
        };
        (ctx, RequestHandle { request_id, done })
    }

    /// Resolves once the request finishes. Dropping the handle counts as finishing.
    pub async fn completed(&mut self) {
        let _ = self.completion.wait_for(|done| *done).await;
    }
}

impl RequestHandle {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Mark the request as complete
    pub fn finish(self) {
        let _ = self.done.send(true);
    }
}

/// Capability to monitor a request against a latency budget.
///
/// `monitor` must return immediately; any waiting happens elsewhere.
pub trait LatencyWatchdog: Send + Sync {
    fn monitor(&self, ctx: RequestContext);
}

/// Watchdog that does nothing
#[derive(Debug, Default)]
pub struct NoopWatchdog;

impl LatencyWatchdog for NoopWatchdog {
    fn monitor(&self, ctx: RequestContext) {
        debug!("Watchdog disabled, not monitoring request {}", ctx.request_id);
    }
}

/// Pages when a request is still in flight after the latency budget
pub struct HangingRequestWatchdog {
    budget: Duration,
    dispatcher: Arc<AlertDispatcher>,
}

impl HangingRequestWatchdog {
    pub fn new(budget: Duration, dispatcher: Arc<AlertDispatcher>) -> Self {
        Self { budget, dispatcher }
    }
}

impl LatencyWatchdog for HangingRequestWatchdog {
    fn monitor(&self, mut ctx: RequestContext) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime; request {} is not monitored", ctx.request_id);
                return;
            }
        };

        let budget = self.budget;
        let dispatcher = Arc::clone(&self.dispatcher);

        runtime.spawn(async move {
            if tokio::time::timeout(budget, ctx.completed()).await.is_ok() {
                return;
            }

            counter!("failwatch_hanging_requests_total").increment(1);
            warn!(
                "Request {} ({}) still running after {}s",
                ctx.request_id,
                ctx.call_type,
                budget.as_secs()
            );

            let model = ctx.model.as_deref().unwrap_or(crate::summary::PLACEHOLDER);
            let message = format!(
                "Hanging request: {} call to {} has not completed after {} seconds.",
                ctx.call_type,
                model,
                budget.as_secs()
            );

            let mut details = BTreeMap::new();
            details.insert("request_id".to_string(), json!(ctx.request_id.to_string()));
            details.insert("call_type".to_string(), json!(ctx.call_type));
            details.insert("model".to_string(), json!(model));
            details.insert("started_at".to_string(), json!(ctx.started_at.to_rfc3339()));

            if let Err(e) = dispatcher.dispatch(&message, details).await {
                error!("Failed to page for hanging request {}: {}", ctx.request_id, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTransport;
    use pager::{PagerConfig, RoutingKey};

    fn watchdog(transport: Arc<RecordingTransport>, budget_secs: u64) -> HangingRequestWatchdog {
        let dispatcher = AlertDispatcher::new(
            transport,
            RoutingKey::new("routing-key").unwrap(),
            &PagerConfig::default(),
        );
        HangingRequestWatchdog::new(Duration::from_secs(budget_secs), Arc::new(dispatcher))
    }

    #[test]
    fn test_call_type_names() {
        assert_eq!(CallType::PassThroughEndpoint.to_string(), "pass_through_endpoint");
        assert_eq!(
            serde_json::to_value(CallType::AudioTranscription).unwrap(),
            serde_json::json!("audio_transcription")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_request_pages() {
        let transport = Arc::new(RecordingTransport::default());
        let watchdog = watchdog(transport.clone(), 300);

        let (ctx, _handle) = RequestContext::start(CallType::Completion, Some("gpt-4o".to_string()));
        watchdog.monitor(ctx);

        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::task::yield_now().await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].payload.summary,
            "Hanging request: completion call to gpt-4o has not completed after 300 seconds."
        );
        assert_eq!(sent[0].payload.custom_details["call_type"], "completion");
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_request_does_not_page() {
        let transport = Arc::new(RecordingTransport::default());
        let watchdog = watchdog(transport.clone(), 300);

        let (ctx, handle) = RequestContext::start(CallType::Embeddings, None);
        watchdog.monitor(ctx);

        tokio::time::sleep(Duration::from_secs(10)).await;
        handle.finish();

        tokio::time::sleep(Duration::from_secs(400)).await;
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_monitor_outside_runtime_is_harmless() {
        let transport = Arc::new(RecordingTransport::default());
        let watchdog = watchdog(transport.clone(), 1);

        let (ctx, _handle) = RequestContext::start(CallType::Rerank, None);
        watchdog.monitor(ctx);

        assert!(transport.sent().is_empty());
    }
}
