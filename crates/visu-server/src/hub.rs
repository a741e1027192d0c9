//! The emotion hub: current display state plus the connections watching it.

use crate::api_ws::{BroadcastReport, ConnectionManager};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;
use visu_types::{EmotionState, OutgoingMessage};

/// Result of applying one update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The state as committed.
    pub state: EmotionState,
    /// How the fan-out went.
    pub report: BroadcastReport,
}

/// Single source of truth for the displayed emotion.
///
/// Constructed once at startup and shared with every handler through
/// [`crate::AppState`]. The only mutators are [`EmotionHub::update`] (state)
/// and [`EmotionHub::connect`] / [`EmotionHub::disconnect`] (registry).
#[derive(Clone)]
pub struct EmotionHub {
    state: Arc<RwLock<EmotionState>>,
    connections: ConnectionManager,
}

impl Default for EmotionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionHub {
    /// Creates a hub showing the neutral face with no connections.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(EmotionState::initial(Utc::now()))),
            connections: ConnectionManager::new(),
        }
    }

    /// Replaces the live state and fans it out to every connection.
    ///
    /// The state write lock is held until the message has been queued on
    /// every connection, so clients see updates in commit order. Queueing
    /// never waits on a socket, so this does not stall on slow clients.
    pub async fn update(&self, label: &str) -> UpdateOutcome {
        let mut current = self.state.write().await;
        *current = EmotionState::new(label, Utc::now());
        let committed = current.clone();

        tracing::info!(emotion = %committed.label, "emotion updated");

        let report = self.broadcast(&OutgoingMessage::from(&committed)).await;
        drop(current);

        UpdateOutcome {
            state: committed,
            report,
        }
    }

    /// Snapshot of the live state.
    pub async fn current(&self) -> EmotionState {
        self.state.read().await.clone()
    }

    /// Registers a display connection's outbound queue.
    pub async fn connect(&self, sender: mpsc::Sender<String>) -> Uuid {
        self.connections.add_session(sender).await
    }

    /// Removes a display connection.
    pub async fn disconnect(&self, session_id: Uuid) {
        self.connections.remove_session(session_id).await;
    }

    /// Queues a raw message on every connection.
    pub async fn broadcast(&self, message: &OutgoingMessage) -> BroadcastReport {
        match serde_json::to_string(message) {
            Ok(json) => self.connections.broadcast(json).await,
            Err(e) => {
                tracing::error!("failed to serialize broadcast message: {}", e);
                BroadcastReport::default()
            }
        }
    }

    /// Number of live connections.
    pub async fn active_connections(&self) -> usize {
        self.connections.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_neutral() {
        let hub = EmotionHub::new();
        assert_eq!(hub.current().await.label, "neutral");
        assert_eq!(hub.active_connections().await, 0);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let hub = EmotionHub::new();
        for label in ["happy", "sad", "Focused", "angry"] {
            hub.update(label).await;
        }
        assert_eq!(hub.current().await.label, "angry");
    }

    #[tokio::test]
    async fn label_casing_is_idempotent() {
        let hub = EmotionHub::new();
        let upper = hub.update("HAPPY").await.state;
        let lower = hub.update("happy").await.state;
        assert_eq!(upper.label, lower.label);
        assert_eq!(hub.current().await.label, "happy");
    }

    #[tokio::test]
    async fn timestamps_never_go_backwards() {
        let hub = EmotionHub::new();
        let first = hub.update("happy").await.state;
        let second = hub.update("sad").await.state;
        assert!(second.timestamp >= first.timestamp);
    }
}
