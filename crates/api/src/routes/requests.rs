//! Request Lifecycle Routes

use alerting::{CallType, RequestContext};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// Body of a request-start notification
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub call_type: CallType,
    pub model: Option<String>,
}

/// Response for a started request
#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub request_id: Uuid,
}

/// Register an in-flight request and hand it to the watchdog
pub async fn start_request(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartRequest>,
) -> Json<StartResponse> {
    let (ctx, handle) = RequestContext::start(body.call_type, body.model);
    let request_id = handle.request_id();

    state.in_flight.lock().await.insert(request_id, handle);
    state.alerter.pre_call_hook(ctx);

    // Forget requests that are never completed once the watchdog is done with them
    let expiring = Arc::clone(&state);
    tokio::spawn(async move {
        tokio::time::sleep(expiring.request_ttl).await;
        if expiring.in_flight.lock().await.remove(&request_id).is_some() {
            debug!("Request {} expired without completing", request_id);
        }
    });

    Json(StartResponse { request_id })
}

/// Mark an in-flight request as finished
pub async fn complete_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let handle = state
        .in_flight
        .lock()
        .await
        .remove(&request_id)
        .ok_or(ApiError::UnknownRequest(request_id))?;

    handle.finish();
    debug!("Request {} completed", request_id);
    Ok(StatusCode::NO_CONTENT)
}
