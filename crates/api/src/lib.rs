//! Failure-Rate Alerting Service
//!
//! HTTP surface that feeds upstream failures and request-lifecycle hooks to
//! the failure-rate alerter.

use alerting::{
    AlertDispatcher, FailureRateAlerter, HangingRequestWatchdog, LatencyWatchdog, NoopWatchdog,
    RequestHandle,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use failure_store::SystemClock;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use pager::{HttpTransport, PagingTransport, RoutingKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub mod error;
mod routes;
pub mod settings;

use error::StartupError;
use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    /// Failure-rate alerter
    pub alerter: Arc<FailureRateAlerter>,
    /// Requests currently being watched
    pub in_flight: Mutex<HashMap<Uuid, RequestHandle>>,
    /// How long an uncompleted request stays in `in_flight`
    pub request_ttl: Duration,
    /// Prometheus exporter, when installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(
        alerter: Arc<FailureRateAlerter>,
        metrics: Option<PrometheusHandle>,
        request_ttl: Duration,
    ) -> Self {
        Self {
            alerter,
            in_flight: Mutex::new(HashMap::new()),
            request_ttl,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Extra time an uncompleted request is kept past the latency budget.
/// Expiry must land after the watchdog deadline; dropping the handle counts as completion.
pub const IN_FLIGHT_GRACE: Duration = Duration::from_secs(60);

/// Lifetime of an uncompleted entry in `AppState::in_flight`
pub fn request_ttl(settings: &Settings) -> Duration {
    Duration::from_secs(settings.watchdog.latency_budget_secs)
        .checked_add(IN_FLIGHT_GRACE)
        .unwrap_or(Duration::MAX)
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub retained_failures: usize,
    pub in_flight_requests: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/failures", post(routes::failures::record_failure))
        .route("/api/v1/requests", post(routes::requests::start_request))
        .route(
            "/api/v1/requests/:id/complete",
            post(routes::requests::complete_request),
        )
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, error::ApiError> {
    let retained_failures = state.alerter.retained_failures()?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        retained_failures,
        in_flight_requests: state.in_flight.lock().await.len(),
    }))
}

/// Prometheus scrape handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed".to_string()),
    }
}

/// Initialize logging (`RUST_LOG` overrides the default `info` level)
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Wire the alerter from settings, delivering pages through `transport`
pub fn build_alerter(
    settings: &Settings,
    routing_key: RoutingKey,
    transport: Arc<dyn PagingTransport>,
) -> Result<Arc<FailureRateAlerter>, StartupError> {
    let dispatcher = Arc::new(AlertDispatcher::new(transport, routing_key, &settings.pager));

    let watchdog: Arc<dyn LatencyWatchdog> = if settings.watchdog.enabled {
        Arc::new(HangingRequestWatchdog::new(
            Duration::from_secs(settings.watchdog.latency_budget_secs),
            Arc::clone(&dispatcher),
        ))
    } else {
        Arc::new(NoopWatchdog)
    };

    let alerter = FailureRateAlerter::new(
        settings.alerting.clone(),
        dispatcher,
        watchdog,
        Arc::new(SystemClock),
    )?;
    Ok(Arc::new(alerter))
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: Settings) -> Result<(), StartupError> {
    // Fail before binding anything if the routing key is absent
    let routing_key = RoutingKey::from_env()?;
    let transport = Arc::new(HttpTransport::new(&settings.pager)?);
    let alerter = build_alerter(&settings, routing_key, transport)?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| StartupError::Metrics(e.to_string()))?;

    let state = Arc::new(AppState::new(alerter, Some(metrics), request_ttl(&settings)));
    let app = create_router(state);

    info!("Starting failure-rate alerting service on {}", settings.server.addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped; unsent alerts are dropped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
