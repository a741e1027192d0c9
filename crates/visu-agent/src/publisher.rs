//! Pushes the agent's emotion to the display server.

use crate::error::PublishError;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use visu_types::{EmotionUpdateRequest, UPDATE_EMOTION_PATH};

/// A repeat of the same label inside this window is not sent again.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(3);

/// Upper bound on a single update request.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Remembers the last label sent and when.
///
/// Only the immediately previous label is compared; an alternating
/// sequence like happy, sad, happy is never suppressed.
#[derive(Debug)]
pub struct DebounceGuard {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Default for DebounceGuard {
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

impl DebounceGuard {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Returns `true` if `label` should be sent at `now`, recording it as the
    /// new baseline. Returns `false` without touching the baseline otherwise.
    pub fn admit(&mut self, label: &str, now: Instant) -> bool {
        if let Some((last_label, sent_at)) = &self.last {
            if last_label == label && now.saturating_duration_since(*sent_at) < self.window {
                return false;
            }
        }
        self.last = Some((label.to_string(), now));
        true
    }
}

/// What a publish call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The display server accepted the update.
    Sent,
    /// Suppressed by the debounce guard; no request was made.
    Debounced,
    /// The request was attempted and failed. Already logged.
    Failed,
}

/// Best-effort client for the display server's update endpoint.
#[derive(Debug)]
pub struct Publisher {
    client: reqwest::Client,
    endpoint: String,
    guard: Mutex<DebounceGuard>,
}

impl Publisher {
    /// Creates a publisher for the display server at `base_url`
    /// (e.g. `http://localhost:8000`).
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PUBLISH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(client, base_url, DebounceGuard::default())
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, guard: DebounceGuard) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), UPDATE_EMOTION_PATH),
            guard: Mutex::new(guard),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Publishes `label`, swallowing every failure.
    ///
    /// Never returns an error and never waits longer than
    /// [`PUBLISH_TIMEOUT`]. Failures only mean the face did not change.
    pub async fn publish(&self, label: &str) -> PublishOutcome {
        self.publish_at(label, Instant::now()).await
    }

    /// [`Publisher::publish`] with an explicit clock reading.
    pub async fn publish_at(&self, label: &str, now: Instant) -> PublishOutcome {
        match self.try_publish_at(label, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(emotion = %label, endpoint = %self.endpoint, "failed to publish emotion: {}", e);
                PublishOutcome::Failed
            }
        }
    }

    /// Publishes `label`, surfacing failures to the caller.
    pub async fn try_publish(&self, label: &str) -> Result<PublishOutcome, PublishError> {
        self.try_publish_at(label, Instant::now()).await
    }

    async fn try_publish_at(&self, label: &str, now: Instant) -> Result<PublishOutcome, PublishError> {
        let admitted = self
            .guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .admit(label, now);
        if !admitted {
            tracing::debug!(emotion = %label, "skipping duplicate emotion (debounced)");
            return Ok(PublishOutcome::Debounced);
        }

        let body = EmotionUpdateRequest {
            emotion: label.to_string(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(PUBLISH_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PublishError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::info!(emotion = %label, response = %text, "emotion sent to display");
        Ok(PublishOutcome::Sent)
    }

    fn classify(&self, e: reqwest::Error) -> PublishError {
        if e.is_timeout() {
            PublishError::Timeout(PUBLISH_TIMEOUT)
        } else if e.is_connect() {
            PublishError::Connect(self.endpoint.clone())
        } else {
            PublishError::Request(e)
        }
    }
}
