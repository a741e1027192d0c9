//! Tool callbacks exposed to the conversation model.
//!
//! Each tool declares a name, a description the model reads, and typed
//! arguments decoded from JSON. [`ToolRegistry::dispatch`] is the boundary
//! with the conversation framework: it always returns a string.

use crate::error::ToolError;
use crate::motor::MotorController;
use crate::publisher::Publisher;
use crate::search::{PageReader, WebSearch};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Per-call context handed to a tool.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub call_id: Uuid,
    pub tool: String,
}

impl ToolContext {
    pub fn new(tool: &str) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            tool: tool.to_string(),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError>;
}

fn parse_args<T: DeserializeOwned>(tool: &'static str, args: Value) -> Result<T, ToolError> {
    // Tools without arguments may be called with `null`.
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool,
        reason: e.to_string(),
    })
}

/// Dispatch table of registered tools.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool`, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name(), tool);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// `(name, description)` for every tool, sorted by name.
    pub fn describe(&self) -> Vec<(&'static str, &'static str)> {
        self.tools
            .values()
            .map(|tool| (tool.name(), tool.description()))
            .collect()
    }

    /// Invokes the tool named `name`, surfacing failures.
    pub async fn try_dispatch(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let ctx = ToolContext::new(name);
        tracing::debug!(tool = name, call_id = %ctx.call_id, "dispatching tool call");
        tool.call(&ctx, args).await
    }

    /// Invokes the tool named `name`. Failures are logged and returned as a
    /// short message so the conversation carries on.
    pub async fn dispatch(&self, name: &str, args: Value) -> String {
        match self.try_dispatch(name, args).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = name, "tool call failed: {}", e);
                e.to_string()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmotionArgs {
    emotion: String,
}

/// `update_emotion_display(emotion)`.
pub struct UpdateEmotionDisplay {
    publisher: Arc<Publisher>,
}

impl UpdateEmotionDisplay {
    pub fn new(publisher: Arc<Publisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl Tool for UpdateEmotionDisplay {
    fn name(&self) -> &'static str {
        "update_emotion_display"
    }

    fn description(&self) -> &'static str {
        "Update the face display emotion. ONLY call this when your emotion genuinely CHANGES. \
         Do NOT call if you're feeling the same emotion as before. Skip this entirely if unsure. \
         Args: emotion - your current emotion (choose from: happy, sad, angry, focused, confused)"
    }

    async fn call(&self, _ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let args: EmotionArgs = parse_args(self.name(), args)?;
        self.publisher.publish(&args.emotion).await;
        Ok(String::new())
    }
}

/// A motor gesture with no arguments.
pub struct MotorGesture {
    name: &'static str,
    description: &'static str,
    command: String,
    motor: MotorController,
}

impl MotorGesture {
    /// `robot_wave()`: greeting and goodbye wave.
    pub fn wave(motor: MotorController, command: impl Into<String>) -> Self {
        Self {
            name: "robot_wave",
            description: "Make the robot do a wave gesture. Call this when greeting someone \
                          (hi, hello, hey) or saying goodbye (bye, see you, later). \
                          Do NOT call for normal conversation.",
            command: command.into(),
            motor,
        }
    }

    /// `robot_talk_gesture()`: body movement while explaining.
    pub fn talk(motor: MotorController, command: impl Into<String>) -> Self {
        Self {
            name: "robot_talk_gesture",
            description: "Make the robot do a talking body gesture. Call this when you're giving \
                          an explanation, telling a story, or responding with more than a quick \
                          one-liner. It makes the robot look alive while speaking.",
            command: command.into(),
            motor,
        }
    }
}

#[async_trait]
impl Tool for MotorGesture {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    async fn call(&self, _ctx: &ToolContext, _args: Value) -> Result<String, ToolError> {
        self.motor.send(&self.command).await;
        Ok(String::new())
    }
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

/// `web_search(query)`.
pub struct WebSearchTool {
    search: Arc<WebSearch>,
}

impl WebSearchTool {
    pub fn new(search: Arc<WebSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for current information. Use this when the user asks about news, facts, \
         current events, or anything you need to look up. \
         Args: query - a short, focused search query (3-8 words work best)"
    }

    async fn call(&self, _ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let args: QueryArgs = parse_args(self.name(), args)?;
        Ok(self.search.search(&args.query).await)
    }
}

#[derive(Debug, Deserialize)]
struct UrlArgs {
    url: String,
}

/// `read_webpage(url)`.
pub struct ReadWebpageTool {
    reader: Arc<PageReader>,
}

impl ReadWebpageTool {
    pub fn new(reader: Arc<PageReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for ReadWebpageTool {
    fn name(&self) -> &'static str {
        "read_webpage"
    }

    fn description(&self) -> &'static str {
        "Read and extract the main content from a webpage URL. Use this after searching to get \
         more detail from a specific page. Args: url - the full URL of the webpage to read"
    }

    async fn call(&self, _ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let args: UrlArgs = parse_args(self.name(), args)?;
        Ok(self.reader.read(&args.url).await)
    }
}
