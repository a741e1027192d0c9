//! Server-rendered face display page.

use crate::AppState;
use axum::{extract::Extension, response::Html};
use std::sync::Arc;

/// Handler for `GET /`.
///
/// Embeds the current emotion so the face is correct before the WebSocket
/// connects.
pub async fn index_handler(Extension(state): Extension<Arc<AppState>>) -> Html<String> {
    let current = state.hub.current().await;
    Html(render_index(&current.label))
}

/// Renders the display page for `emotion`.
pub fn render_index(emotion: &str) -> String {
    let emotion = escape_html(emotion);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>VISU</title>
  <style>
    html, body {{ margin: 0; height: 100%; background: #000; overflow: hidden; }}
    .face {{ display: flex; justify-content: center; align-items: center; gap: 10vmin; height: 100%; }}
    .eye {{ position: relative; width: 33.33vmin; height: 33.33vmin; border-radius: 50%;
            background: #4fd1ff; overflow: hidden; }}
    .eyelid {{ position: absolute; left: -10%; width: 120%; height: 100%; background: #000; }}
    .eyelid.upper {{ top: -100%; }}
    .eyelid.lower {{ top: 100%; }}
  </style>
</head>
<body data-emotion="{emotion}">
  <div class="face">
    <div class="left eye"><div class="eyelid upper"></div><div class="eyelid lower"></div></div>
    <div class="right eye"><div class="eyelid upper"></div><div class="eyelid lower"></div></div>
  </div>
  <script src="/static/index.js"></script>
</body>
</html>
"#
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
