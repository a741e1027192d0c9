//! The face script is served with the default config no matter where the
//! server is started from. Kept in its own test binary because it changes the
//! process working directory.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::path::Path;
use tower::ServiceExt; // for oneshot
use visu_server::{app, config, AppState, EmotionHub};

#[tokio::test]
async fn face_script_served_from_workspace_root() {
    let workspace_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    std::env::set_current_dir(&workspace_root).unwrap();
    assert!(!Path::new("static/index.js").exists());

    let config = config::load_config(None).unwrap();
    let mut state = AppState::new(EmotionHub::new());
    state.static_dir = config.server.static_dir;

    let response = app(state)
        .oneshot(Request::builder().uri("/static/index.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let script = String::from_utf8_lossy(&body);
    assert!(script.contains("/ws"));
    assert!(script.contains("/api/get_emotion"));
}
