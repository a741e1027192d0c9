//! Agent tools driving a live display server.

use serde_json::json;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use visu_agent::agent::{GREETING, GREETING_EMOTION};
use visu_agent::motor::Link;
use visu_agent::search::{PageReader, WebSearch, SEARCH_APOLOGY};
use visu_agent::{DebounceGuard, MotorController, MotorError, Publisher, VisuAgent};
use visu_server::{app, AppState, EmotionHub};

async fn start_display(hub: EmotionHub) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app(AppState::new(hub));
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

struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn agent(addr: SocketAddr, body: Arc<Mutex<Vec<u8>>>) -> VisuAgent {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let publisher = Arc::new(Publisher::with_client(
        client.clone(),
        &format!("http://{addr}"),
        DebounceGuard::default(),
    ));
    let motor = MotorController::with_opener(
        Some("/dev/ttyACM0".to_string()),
        9600,
        Duration::ZERO,
        Box::new(move |_port: &str, _baud: u32| -> Result<Link, MotorError> {
            Ok(Box::new(Capture(body.clone())))
        }),
    );
    VisuAgent::new(
        publisher,
        motor,
        "WAVE",
        "RANDOM",
        WebSearch::default(),
        PageReader::new(client, None, "http://127.0.0.1:9"),
    )
}

#[tokio::test]
async fn registers_every_tool() {
    let hub = EmotionHub::new();
    let addr = start_display(hub).await;
    let agent = agent(addr, Arc::default());

    assert_eq!(
        agent.tools().names(),
        vec![
            "read_webpage",
            "robot_talk_gesture",
            "robot_wave",
            "update_emotion_display",
            "web_search",
        ]
    );
}

#[tokio::test]
async fn on_enter_smiles_and_waves() {
    let hub = EmotionHub::new();
    let addr = start_display(hub.clone()).await;
    let body = Arc::new(Mutex::new(Vec::new()));
    let agent = agent(addr, body.clone());

    assert_eq!(agent.on_enter().await, GREETING);
    assert_eq!(hub.current().await.label, GREETING_EMOTION);
    assert_eq!(body.lock().unwrap().as_slice(), b"WAVE\n");
}

#[tokio::test]
async fn emotion_tool_updates_display_state() {
    let hub = EmotionHub::new();
    let addr = start_display(hub.clone()).await;
    let agent = agent(addr, Arc::default());

    let out = agent
        .dispatch("update_emotion_display", json!({ "emotion": "Focused" }))
        .await;
    assert_eq!(out, "");
    assert_eq!(hub.current().await.label, "focused");
}

#[tokio::test]
async fn repeated_emotion_is_debounced_end_to_end() {
    let hub = EmotionHub::new();
    let addr = start_display(hub.clone()).await;
    let agent = agent(addr, Arc::default());

    agent
        .dispatch("update_emotion_display", json!({ "emotion": "sad" }))
        .await;
    let first = hub.current().await;

    agent
        .dispatch("update_emotion_display", json!({ "emotion": "sad" }))
        .await;
    assert_eq!(hub.current().await.timestamp, first.timestamp);
}

#[tokio::test]
async fn gesture_tool_writes_gesture_command() {
    let hub = EmotionHub::new();
    let addr = start_display(hub).await;
    let body = Arc::new(Mutex::new(Vec::new()));
    let agent = agent(addr, body.clone());

    assert_eq!(agent.dispatch("robot_talk_gesture", json!({})).await, "");
    assert_eq!(body.lock().unwrap().as_slice(), b"RANDOM\n");
}

#[tokio::test]
async fn search_without_providers_apologizes() {
    let hub = EmotionHub::new();
    let addr = start_display(hub).await;
    let agent = agent(addr, Arc::default());

    let out = agent.dispatch("web_search", json!({ "query": "rust" })).await;
    assert_eq!(out, SEARCH_APOLOGY);
}

#[tokio::test]
async fn bad_tool_calls_return_messages() {
    let hub = EmotionHub::new();
    let addr = start_display(hub.clone()).await;
    let agent = agent(addr, Arc::default());

    let out = agent.dispatch("update_emotion_display", json!({})).await;
    assert!(out.starts_with("invalid arguments for update_emotion_display"), "{out}");
    assert_eq!(hub.current().await.label, "neutral");

    let out = agent.dispatch("dance", json!({})).await;
    assert_eq!(out, "unknown tool: dance");
}
