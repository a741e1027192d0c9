//! VISU agent console.
//!
//! Loads the agent configuration, greets, then reads tool calls from stdin as
//! `tool_name [json-args]` lines and prints each result.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use visu_agent::{config, VisuAgent};
use visu_types::startup::resolve_config_path;

/// Splits `tool_name {"arg": ...}` into a name and JSON arguments.
fn parse_line(line: &str) -> Option<(&str, Result<Value, serde_json::Error>)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((name, args)) => Some((name, serde_json::from_str(args.trim()))),
        None => Some((line, Ok(Value::Null))),
    }
}

#[tokio::main]
async fn main() {
    let (config_path, config_source) =
        resolve_config_path("VISU_AGENT_CONFIG_PATH", "visu-agent.toml");

    let config = config::load_config(Some(&config_path))
        .expect("failed to load configuration, the agent cannot start without its credentials");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr; stdout carries tool results.
    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!(source = %config_source, path = %config_path, "resolved startup configuration path");
    tracing::debug!(?config, "loaded agent configuration");

    let agent = VisuAgent::from_config(&config);
    tracing::info!(tools = ?agent.tools().names(), display = %agent.publisher().endpoint(), "agent ready");

    println!("{}", agent.on_enter().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("failed to read stdin: {}", e);
                break;
            }
        };

        let Some((tool, args)) = parse_line(&line) else {
            continue;
        };
        match args {
            Ok(args) => println!("{}", agent.dispatch(tool, args).await),
            Err(e) => println!("invalid JSON arguments for {}: {}", tool, e),
        }
    }

    tracing::info!("agent console closed");
}
