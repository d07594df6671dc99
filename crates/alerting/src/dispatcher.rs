//! Alert dispatch to the paging service

use metrics::counter;
use pager::{
    EventAction, PagerConfig, PagerDutyPayload, PagerDutyRequestBody, PagerError, PagingTransport,
    RoutingKey, Severity,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Builds critical alerts and hands them to a paging transport
pub struct AlertDispatcher {
    transport: Arc<dyn PagingTransport>,
    routing_key: RoutingKey,
    source: String,
    component: String,
}

impl AlertDispatcher {
    /// Create a dispatcher; the routing key has already been validated
    pub fn new(transport: Arc<dyn PagingTransport>, routing_key: RoutingKey, config: &PagerConfig) -> Self {
        info!(
            "Creating alert dispatcher (source: {}, component: {})",
            config.source, config.component
        );
        Self {
            transport,
            routing_key,
            source: config.source.clone(),
            component: config.component.clone(),
        }
    }

    /// Build the request body for one alert
    pub fn build(&self, message: &str, details: BTreeMap<String, Value>) -> PagerDutyRequestBody {
        PagerDutyRequestBody {
            payload: PagerDutyPayload {
                summary: message.to_string(),
                severity: Severity::Critical,
                source: self.source.clone(),
                component: self.component.clone(),
                custom_details: details,
            },
            routing_key: self.routing_key.expose().to_string(),
            event_action: EventAction::Trigger,
        }
    }

    /// Send one alert; the result reflects this single send only
    pub async fn dispatch(&self, message: &str, details: BTreeMap<String, Value>) -> Result<(), PagerError> {
        let body = self.build(message, details);

        match self.transport.send(&body).await {
            Ok(()) => {
                counter!("failwatch_alerts_dispatched_total").increment(1);
                info!("Alert dispatched: {}", message);
                Ok(())
            }
            Err(e) => {
                counter!("failwatch_alert_dispatch_failures_total").increment(1);
                error!("Alert dispatch failed: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_dispatch_sends_critical_trigger() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = AlertDispatcher::new(
            transport.clone(),
            RoutingKey::new("routing-key").unwrap(),
            &PagerConfig::default(),
        );

        let mut details = BTreeMap::new();
        details.insert("recent_errors".to_string(), json!(["A (code: 1, provider: p)"]));
        dispatcher.dispatch("something broke", details).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload.summary, "something broke");
        assert_eq!(sent[0].payload.severity, Severity::Critical);
        assert_eq!(sent[0].payload.source, "LLM Gateway Alert");
        assert_eq!(sent[0].payload.component, "llm-gateway");
        assert_eq!(sent[0].routing_key, "routing-key");
        assert_eq!(sent[0].event_action, EventAction::Trigger);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(RecordingTransport::failing());
        let dispatcher = AlertDispatcher::new(
            transport.clone(),
            RoutingKey::new("routing-key").unwrap(),
            &PagerConfig::default(),
        );

        let result = dispatcher.dispatch("something broke", BTreeMap::new()).await;

        assert!(matches!(result, Err(PagerError::Status { status: 503, .. })));
        assert_eq!(transport.attempts(), 1); // No retry
    }
}
