//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/static` (face script and assets). Defaults
    /// to the bundled assets; relative overrides resolve against the working
    /// directory.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Seconds a display connection may stay silent before it is closed.
    /// `0` disables the check.
    #[serde(default)]
    pub ws_idle_timeout_secs: u64,
}

impl ServerConfig {
    /// The idle window, if enabled.
    pub fn ws_idle_timeout(&self) -> Option<Duration> {
        (self.ws_idle_timeout_secs > 0).then(|| Duration::from_secs(self.ws_idle_timeout_secs))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "visu_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

/// The crate's bundled `static/` directory, independent of the working
/// directory the server is started from.
pub(crate) fn default_static_dir() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            ws_idle_timeout_secs: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VISU_HOST` overrides `server.host`
/// - `VISU_PORT` overrides `server.port`
/// - `VISU_STATIC_DIR` overrides `server.static_dir`
/// - `VISU_WS_IDLE_TIMEOUT_SECS` overrides `server.ws_idle_timeout_secs`
/// - `VISU_LOG_LEVEL` overrides `logging.level`
/// - `VISU_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if a numeric or address override is malformed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
pub(crate) fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(host) = lookup("VISU_HOST") {
        config.server.host = parse_env("VISU_HOST", host)?;
    }
    if let Some(port) = lookup("VISU_PORT") {
        config.server.port = parse_env("VISU_PORT", port)?;
    }
    if let Some(dir) = lookup("VISU_STATIC_DIR") {
        config.server.static_dir = dir;
    }
    if let Some(secs) = lookup("VISU_WS_IDLE_TIMEOUT_SECS") {
        config.server.ws_idle_timeout_secs = parse_env("VISU_WS_IDLE_TIMEOUT_SECS", secs)?;
    }
    if let Some(level) = lookup("VISU_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("VISU_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
