//! HTTP API handlers for the emotion display.

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use visu_types::{EmotionState, EmotionUpdateRequest, EmotionUpdateResponse, HealthResponse};

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Handler for `POST /update-emotion`.
///
/// Accepts any label. Unparseable bodies are rejected before the state is
/// touched.
pub async fn update_emotion_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<EmotionUpdateRequest>, JsonRejection>,
) -> Result<Json<EmotionUpdateResponse>, ApiError> {
    let Json(payload) = payload.inspect_err(|e| {
        tracing::warn!("rejected emotion update: {}", e.body_text());
    })?;

    let outcome = state.hub.update(&payload.emotion).await;
    tracing::debug!(
        emotion = %outcome.state.label,
        delivered = outcome.report.delivered,
        removed = outcome.report.removed,
        "emotion update broadcast"
    );

    Ok(Json(EmotionUpdateResponse::from(&outcome.state)))
}

/// Handler for `GET /api/get_emotion`. Polling fallback for display clients.
pub async fn get_emotion_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<EmotionState> {
    Json(state.hub.current().await)
}

/// Handler for `GET /health`.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    let current = state.hub.current().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        active_connections: state.hub.active_connections().await,
        current_emotion: current.label,
        timestamp: Utc::now(),
    })
}
