//! Service error types

use alerting::AlertingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pager::PagerError;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Errors that stop the service from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Paging setup error: {0}")]
    Pager(#[from] PagerError),

    #[error("Alerter setup error: {0}")]
    Alerting(#[from] AlertingError),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Alerting(#[from] AlertingError),

    #[error("Unknown request id: {0}")]
    UnknownRequest(Uuid),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Alerting(AlertingError::MissingPayload) => StatusCode::BAD_REQUEST,
            ApiError::Alerting(AlertingError::Dispatch(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Alerting(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UnknownRequest(_) => StatusCode::NOT_FOUND,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
