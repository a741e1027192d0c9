//! Shared types for the VISU emotion display.
//!
//! This crate holds the state model and the JSON wire shapes exchanged between
//! the agent-side publisher, the broadcast server and the browser display.
//! Both `visu-server` and `visu-agent` depend on it so the two ends of the
//! HTTP boundary can never disagree about field names.

pub mod startup;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label the display shows before any update has been received.
pub const DEFAULT_EMOTION: &str = "neutral";

/// Emotions the face display has a dedicated expression for.
///
/// The vocabulary is open: the server stores any label it receives and the
/// display falls back to its neutral face for labels outside this list.
pub const KNOWN_EMOTIONS: [&str; 6] = ["happy", "sad", "angry", "focused", "confused", "neutral"];

/// Path of the update endpoint on the broadcast server.
pub const UPDATE_EMOTION_PATH: &str = "/update-emotion";

/// Normalizes an incoming label. Labels are case-insensitive and stored lowercased.
pub fn normalize_label(label: &str) -> String {
    label.to_lowercase()
}

/// The single live emotion shown on the display.
///
/// Serialized as `{"type": <label>, "timestamp": <rfc3339>}`, which is the
/// shape returned by the polling endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionState {
    #[serde(rename = "type")]
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl EmotionState {
    /// Builds a state from a raw label, lowercasing it.
    pub fn new(label: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            label: normalize_label(label),
            timestamp,
        }
    }

    /// The state a freshly started server holds.
    pub fn initial(timestamp: DateTime<Utc>) -> Self {
        Self::new(DEFAULT_EMOTION, timestamp)
    }
}

/// Request body for `POST /update-emotion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionUpdateRequest {
    pub emotion: String,
}

/// Response body for a successful `POST /update-emotion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionUpdateResponse {
    pub status: String,
    pub emotion: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&EmotionState> for EmotionUpdateResponse {
    fn from(state: &EmotionState) -> Self {
        Self {
            status: "success".to_string(),
            emotion: state.label.clone(),
            timestamp: state.timestamp,
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_connections: usize,
    pub current_emotion: String,
    pub timestamp: DateTime<Utc>,
}

/// Messages pushed from the server to display clients over `/ws`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "emotion_update")]
    EmotionUpdate {
        emotion: String,
        timestamp: DateTime<Utc>,
    },
}

impl From<&EmotionState> for OutgoingMessage {
    fn from(state: &EmotionState) -> Self {
        Self::EmotionUpdate {
            emotion: state.label.clone(),
            timestamp: state.timestamp,
        }
    }
}
