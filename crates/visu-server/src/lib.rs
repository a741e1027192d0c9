//! VISU emotion broadcast server library logic.

pub mod api;
pub mod api_ws;
pub mod config;
pub mod hub;
pub mod page;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use visu_types::UPDATE_EMOTION_PATH;

pub use hub::EmotionHub;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Current emotion and the display connections watching it.
    pub hub: EmotionHub,
    /// Close display connections that stay silent this long.
    pub ws_idle_timeout: Option<Duration>,
    /// Directory served under `/static`.
    pub static_dir: String,
}

impl AppState {
    pub fn new(hub: EmotionHub) -> Self {
        Self {
            hub,
            ws_idle_timeout: None,
            static_dir: config::default_static_dir(),
        }
    }
}

/// Maximum request body size (64 KiB). Update bodies are a single short label.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(page::index_handler))
        .route("/health", get(api::health_handler))
        .route(UPDATE_EMOTION_PATH, post(api::update_emotion_handler))
        .route("/api/get_emotion", get(api::get_emotion_handler))
        .route("/ws", get(api_ws::ws_handler));

    let static_dir = state.static_dir.clone();
    let router = if std::path::Path::new(&static_dir).exists() {
        tracing::info!(path = %static_dir, "serving display assets at /static");
        router.nest_service("/static", ServeDir::new(&static_dir))
    } else {
        tracing::warn!(path = %static_dir, "static directory not found, display page will load without its script");
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
