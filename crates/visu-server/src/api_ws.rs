//! WebSocket API handler and connection management.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket},
        Extension, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Per-connection outbound queue depth. A client that falls this far behind
/// is treated as failed and dropped on the next broadcast.
const SESSION_QUEUE_CAPACITY: usize = 64;

/// Type alias for session map to satisfy clippy complexity checks.
type SessionMap = HashMap<Uuid, mpsc::Sender<String>>;

/// Outcome of a single fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the message was queued on.
    pub delivered: usize,
    /// Connections that failed and were removed from the registry.
    pub removed: usize,
}

/// Registry of live display connections.
///
/// Connections carry no identity beyond a generated id. Each one is
/// represented by the sending half of its outbound queue; the socket writer
/// task owns the receiving half.
#[derive(Clone, Default)]
pub struct ConnectionManager {
    sessions: Arc<RwLock<SessionMap>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a connection and returns its id.
    pub async fn add_session(&self, sender: mpsc::Sender<String>) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, sender);
        tracing::info!(
            connection_id = %session_id,
            total = sessions.len(),
            "display client connected"
        );
        session_id
    }

    /// Removes a connection. Returns `false` if it was already gone.
    pub async fn remove_session(&self, session_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(&session_id).is_some();
        if removed {
            tracing::info!(
                connection_id = %session_id,
                total = sessions.len(),
                "display client disconnected"
            );
        }
        removed
    }

    /// Number of registered connections.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Queues `message_json` on every registered connection.
    ///
    /// Works in two phases: the registry is snapshotted and every entry is
    /// attempted, then the entries whose send failed (queue closed or full)
    /// are removed. A failure on one connection never stops delivery to the
    /// rest.
    pub async fn broadcast(&self, message_json: String) -> BroadcastReport {
        let snapshot: Vec<(Uuid, mpsc::Sender<String>)> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .map(|(id, sender)| (*id, sender.clone()))
                .collect()
        };

        if snapshot.is_empty() {
            tracing::debug!("no display clients connected, skipping broadcast");
            return BroadcastReport::default();
        }

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (session_id, sender) in snapshot {
            match sender.try_send(message_json.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %session_id,
                        "failed to send to display client: {}",
                        e
                    );
                    failed.push(session_id);
                }
            }
        }

        let mut removed = 0;
        if !failed.is_empty() {
            let mut sessions = self.sessions.write().await;
            for session_id in failed {
                if sessions.remove(&session_id).is_some() {
                    removed += 1;
                }
            }
            tracing::info!(
                removed,
                total = sessions.len(),
                "dropped failed display clients"
            );
        }

        BroadcastReport { delivered, removed }
    }
}

/// WebSocket handler: `GET /ws`.
///
/// No authentication; any client may listen. Inbound frames only signal
/// liveness and their content is ignored.
pub async fn ws_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    tracing::debug!("websocket upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles the WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(SESSION_QUEUE_CAPACITY);
    let session_id = state.hub.connect(tx).await;

    // Forward queued messages to the socket. If the socket write fails this
    // task ends, the queue closes, and the next broadcast drops the session.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(AxumMessage::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        let frame = match next_frame(&mut receiver, state.ws_idle_timeout).await {
            Some(frame) => frame,
            None => {
                tracing::info!(
                    connection_id = %session_id,
                    "no keepalive within idle window, closing websocket"
                );
                break;
            }
        };

        match frame {
            Some(Ok(AxumMessage::Close(_))) | None => break,
            Some(Ok(_)) => {
                tracing::trace!(connection_id = %session_id, "keepalive frame received");
            }
            Some(Err(e)) => {
                tracing::debug!(connection_id = %session_id, "websocket receive error: {}", e);
                break;
            }
        }
    }

    state.hub.disconnect(session_id).await;
    send_task.abort();
}

/// Waits for the next inbound frame. Returns `None` when the idle window
/// elapsed without one.
async fn next_frame(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    idle_timeout: Option<Duration>,
) -> Option<Option<Result<AxumMessage, axum::Error>>> {
    match idle_timeout {
        Some(window) => tokio::time::timeout(window, receiver.next()).await.ok(),
        None => Some(receiver.next().await),
    }
}
