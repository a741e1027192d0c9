//! End-to-end tests against a live server socket.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use visu_server::{app, AppState, EmotionHub};

async fn start_server(state: AppState) -> SocketAddr {
    let app = app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

/// Waits until the hub has registered `expected` connections.
async fn wait_for_connections(hub: &EmotionHub, expected: usize) {
    for _ in 0..50 {
        if hub.active_connections().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {} connections", expected);
}

async fn post_emotion(addr: SocketAddr, emotion: &str) -> serde_json::Value {
    // Plain HTTP/1.1 over a raw socket keeps the test free of an HTTP client.
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let body = serde_json::json!({ "emotion": emotion }).to_string();
    let request = format!(
        "POST /update-emotion HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    assert!(raw.starts_with("HTTP/1.1 200"), "unexpected response: {raw}");
    let json_start = raw.find("\r\n\r\n").unwrap() + 4;
    serde_json::from_str(&raw[json_start..]).unwrap()
}

#[tokio::test]
async fn update_reaches_connected_client_and_polling_agrees() {
    let hub = EmotionHub::new();
    let addr = start_server(AppState::new(hub.clone())).await;

    let (mut ws_stream, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("failed to connect");
    wait_for_connections(&hub, 1).await;

    let response = post_emotion(addr, "Confused").await;
    assert_eq!(response["emotion"], "confused");

    let frame = tokio::time::timeout(Duration::from_secs(2), ws_stream.next())
        .await
        .expect("no broadcast within timeout")
        .expect("stream closed")
        .expect("websocket error");
    let Message::Text(text) = frame else {
        panic!("expected text frame");
    };
    let pushed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(pushed["type"], "emotion_update");
    assert_eq!(pushed["emotion"], "confused");
    assert_eq!(pushed["timestamp"], response["timestamp"]);

    let current = hub.current().await;
    assert_eq!(current.label, "confused");
    assert_eq!(
        serde_json::to_value(current.timestamp).unwrap(),
        pushed["timestamp"]
    );
}

#[tokio::test]
async fn keepalive_frames_are_ignored() {
    let hub = EmotionHub::new();
    let addr = start_server(AppState::new(hub.clone())).await;

    let (mut ws_stream, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    wait_for_connections(&hub, 1).await;

    ws_stream
        .send(Message::Text("ping".into()))
        .await
        .expect("failed to send keepalive");
    ws_stream
        .send(Message::Text(r#"{"type":"anything"}"#.into()))
        .await
        .expect("failed to send keepalive");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hub.active_connections().await, 1);
    assert_eq!(hub.current().await.label, "neutral");
}

#[tokio::test]
async fn closing_client_is_unregistered() {
    let hub = EmotionHub::new();
    let addr = start_server(AppState::new(hub.clone())).await;

    let (mut ws_stream, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    wait_for_connections(&hub, 1).await;

    ws_stream.close(None).await.unwrap();
    wait_for_connections(&hub, 0).await;
}

#[tokio::test]
async fn silent_client_is_dropped_after_idle_window() {
    let hub = EmotionHub::new();
    let mut state = AppState::new(hub.clone());
    state.ws_idle_timeout = Some(Duration::from_millis(200));
    let addr = start_server(state).await;

    let (_ws_stream, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    wait_for_connections(&hub, 1).await;

    tokio::time::sleep(Duration::from_millis(400)).await;
    wait_for_connections(&hub, 0).await;
}

#[tokio::test]
async fn every_client_receives_the_update() {
    let hub = EmotionHub::new();
    let addr = start_server(AppState::new(hub.clone())).await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
        clients.push(ws);
    }
    wait_for_connections(&hub, 3).await;

    post_emotion(addr, "happy").await;

    for ws in clients.iter_mut() {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let pushed: serde_json::Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(pushed["emotion"], "happy");
    }
}

#[tokio::test]
async fn websocket_works_without_connect_info() {
    let hub = EmotionHub::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app(AppState::new(hub.clone()));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let (mut ws_stream, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("upgrade should not need peer address info");
    wait_for_connections(&hub, 1).await;

    hub.update("sad").await;
    let frame = tokio::time::timeout(Duration::from_secs(2), ws_stream.next())
        .await
        .expect("no broadcast within timeout")
        .expect("stream closed")
        .expect("websocket error");
    let Message::Text(text) = frame else {
        panic!("expected text frame");
    };
    let pushed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(pushed["emotion"], "sad");
}
