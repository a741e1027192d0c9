use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("display server at {0} is unreachable")]
    Connect(String),

    #[error("display server did not answer within {0:?}")]
    Timeout(Duration),

    #[error("display server responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request to display server failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum MotorError {
    #[error("no serial port configured")]
    NotConfigured,

    #[error("failed to open serial port {port}: {reason}")]
    Open { port: String, reason: String },

    #[error("serial write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("serial task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{provider} responded with status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("invalid provider URL: {0}")]
    Url(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
}
