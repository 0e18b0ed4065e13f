//! HTTP endpoint handlers.
//!
//! `send_message` only awaits the publish before answering; consuming happens
//! in the background listener.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};

use crate::message::Message;
use crate::queue::{Publisher, QueueError};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub publisher: Publisher,
}

impl AppState {
    pub fn new(config: Config, publisher: Publisher) -> Self {
        Self {
            config: Arc::new(config),
            publisher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint probed by the load balancer.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

// =============================================================================
// Greeting
// =============================================================================

#[derive(Serialize)]
pub struct HelloResponse {
    pub message: String,
}

/// Greeting that reports the configured version.
pub async fn hello(State(state): State<AppState>) -> Json<HelloResponse> {
    Json(HelloResponse {
        message: format!("hello world: v{}", state.config.app_version),
    })
}

// =============================================================================
// Send Message
// =============================================================================

/// Generic server error returned when the queue backend fails.
///
/// The underlying cause is logged, never returned to the caller.
#[derive(Debug)]
pub struct ApiError(QueueError);

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    error: &'static str,
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, details = ?self.0, "request_failed");

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (
            status,
            Json(ErrorBody {
                status: status.as_u16(),
                error: "Internal Server Error",
            }),
        )
            .into_response()
    }
}

/// Publish the body to the configured queue.
///
/// Returns `201 Created` with an empty body once the backend has accepted it.
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<Message>,
) -> Result<StatusCode, ApiError> {
    info!(keys = payload.len(), "send_message_received");

    let message_id = state
        .publisher
        .send(&state.config.queue_name, &payload)
        .await?;

    info!(message_id = %message_id, "send_message_enqueued");

    Ok(StatusCode::CREATED)
}
