//! Wires the publisher, robot body and search tools into one agent.

use crate::config::AgentConfig;
use crate::motor::MotorController;
use crate::publisher::{PublishOutcome, Publisher};
use crate::search::{ExaSearch, JinaSearch, PageReader, SearchProvider, WebSearch};
use crate::tools::{
    MotorGesture, ReadWebpageTool, ToolRegistry, UpdateEmotionDisplay, WebSearchTool,
};
use serde_json::Value;
use std::sync::Arc;

/// Emotion shown when a session starts.
pub const GREETING_EMOTION: &str = "happy";

/// First line spoken when a session starts.
pub const GREETING: &str = "Hey! I'm VISU. Come say hi, I don't bite... I don't even have teeth.";

/// The agent's side-effecting surface: display, body and web access.
pub struct VisuAgent {
    publisher: Arc<Publisher>,
    motor: MotorController,
    wave_command: String,
    tools: ToolRegistry,
}

impl VisuAgent {
    /// Builds the agent from validated configuration.
    pub fn from_config(config: &AgentConfig) -> Self {
        let publisher = Arc::new(Publisher::new(&config.display.url));
        let motor = MotorController::new(config.serial.port.clone(), config.serial.baud);
        let client = reqwest::Client::new();

        let mut providers: Vec<Box<dyn SearchProvider>> = Vec::new();
        if let Some(key) = &config.search.jina_api_key {
            providers.push(Box::new(JinaSearch::new(
                client.clone(),
                key.clone(),
                config.search.jina_search_url.clone(),
            )));
        }
        if let Some(key) = &config.search.exa_api_key {
            providers.push(Box::new(ExaSearch::new(
                client.clone(),
                key.clone(),
                config.search.exa_url.clone(),
            )));
        }
        if providers.is_empty() {
            tracing::warn!("no search API keys configured, web_search will apologize");
        }

        let reader = PageReader::new(
            client,
            config.search.jina_api_key.clone(),
            config.search.jina_reader_url.clone(),
        );

        Self::new(
            publisher,
            motor,
            &config.serial.wave_command,
            &config.serial.gesture_command,
            WebSearch::new(providers),
            reader,
        )
    }

    /// Assembles an agent from its parts and registers every tool.
    pub fn new(
        publisher: Arc<Publisher>,
        motor: MotorController,
        wave_command: &str,
        gesture_command: &str,
        search: WebSearch,
        reader: PageReader,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(UpdateEmotionDisplay::new(publisher.clone())));
        tools.register(Arc::new(MotorGesture::wave(motor.clone(), wave_command)));
        tools.register(Arc::new(MotorGesture::talk(motor.clone(), gesture_command)));
        tools.register(Arc::new(WebSearchTool::new(Arc::new(search))));
        tools.register(Arc::new(ReadWebpageTool::new(Arc::new(reader))));

        Self {
            publisher,
            motor,
            wave_command: wave_command.to_string(),
            tools,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Session start: smile, wave, and return the greeting line.
    pub async fn on_enter(&self) -> &'static str {
        if self.publisher.publish(GREETING_EMOTION).await == PublishOutcome::Sent {
            tracing::info!("initial emotion shown on display");
        }
        self.motor.send(&self.wave_command).await;
        GREETING
    }

    /// Runs a tool call from the conversation model.
    pub async fn dispatch(&self, tool: &str, args: Value) -> String {
        self.tools.dispatch(tool, args).await
    }
}
