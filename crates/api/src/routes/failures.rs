//! Failure Routes

use alerting::{FailureNotification, IngestOutcome};
use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{error::ApiError, AppState};

/// Record one upstream failure
pub async fn record_failure(
    State(state): State<Arc<AppState>>,
    Json(notification): Json<FailureNotification>,
) -> Result<Json<IngestOutcome>, ApiError> {
    let outcome = state.alerter.record_failure(&notification).await?;
    Ok(Json(outcome))
}
