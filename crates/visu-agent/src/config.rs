//! Agent configuration loading from file and environment variables.
//!
//! Provider credentials are required and checked at startup. Search keys and
//! the serial port are optional; leaving one out disables that feature.

use crate::motor::DEFAULT_BAUD;
use crate::search::{DEFAULT_EXA_URL, DEFAULT_JINA_READER_URL, DEFAULT_JINA_SEARCH_URL};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub credentials: Credentials,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Speech, language model and room credentials.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    pub deepgram_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub cartesia_api_key: Option<String>,
    pub livekit_api_key: Option<String>,
    pub livekit_api_secret: Option<String>,
    pub livekit_url: Option<String>,
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "[REDACTED]"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("deepgram_api_key", &redact(&self.deepgram_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("cartesia_api_key", &redact(&self.cartesia_api_key))
            .field("livekit_api_key", &redact(&self.livekit_api_key))
            .field("livekit_api_secret", &redact(&self.livekit_api_secret))
            .field("livekit_url", &self.livekit_url)
            .finish()
    }
}

/// Search provider settings.
#[derive(Clone, Deserialize)]
pub struct SearchConfig {
    pub jina_api_key: Option<String>,
    pub exa_api_key: Option<String>,

    #[serde(default = "default_jina_search_url")]
    pub jina_search_url: String,

    #[serde(default = "default_jina_reader_url")]
    pub jina_reader_url: String,

    #[serde(default = "default_exa_url")]
    pub exa_url: String,
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("jina_api_key", &redact(&self.jina_api_key))
            .field("exa_api_key", &redact(&self.exa_api_key))
            .field("jina_search_url", &self.jina_search_url)
            .field("jina_reader_url", &self.jina_reader_url)
            .field("exa_url", &self.exa_url)
            .finish()
    }
}

/// Robot body serial link.
#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    /// e.g. `/dev/ttyUSB0` or `COM6`. Unset disables the robot body.
    pub port: Option<String>,

    #[serde(default = "default_baud")]
    pub baud: u32,

    /// Command string for the wave motion.
    #[serde(default = "default_wave_command")]
    pub wave_command: String,

    /// Command string for the talking gesture.
    #[serde(default = "default_gesture_command")]
    pub gesture_command: String,
}

/// Where the face display server lives.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_url")]
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "visu_agent=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_jina_search_url() -> String {
    DEFAULT_JINA_SEARCH_URL.to_string()
}

fn default_jina_reader_url() -> String {
    DEFAULT_JINA_READER_URL.to_string()
}

fn default_exa_url() -> String {
    DEFAULT_EXA_URL.to_string()
}

fn default_baud() -> u32 {
    DEFAULT_BAUD
}

fn default_wave_command() -> String {
    "WAVE".to_string()
}

fn default_gesture_command() -> String {
    "RANDOM".to_string()
}

fn default_display_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            jina_api_key: None,
            exa_api_key: None,
            jina_search_url: default_jina_search_url(),
            jina_reader_url: default_jina_reader_url(),
            exa_url: default_exa_url(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: default_baud(),
            wave_command: default_wave_command(),
            gesture_command: default_gesture_command(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            url: default_display_url(),
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

    /// A required credential is missing.
    #[error("missing required setting {0} (set it in the environment or the [credentials] table)")]
    MissingCredential(&'static str),
}

impl AgentConfig {
    /// Checks that every required credential is present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] naming the first missing key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.credentials;
        let required = [
            ("DEEPGRAM_API_KEY", &c.deepgram_api_key),
            ("OPENAI_API_KEY", &c.openai_api_key),
            ("CARTESIA_API_KEY", &c.cartesia_api_key),
            ("LIVEKIT_API_KEY", &c.livekit_api_key),
            ("LIVEKIT_API_SECRET", &c.livekit_api_secret),
            ("LIVEKIT_URL", &c.livekit_url),
        ];
        for (key, value) in required {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                return Err(ConfigError::MissingCredential(key));
            }
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file, applies environment overrides and
/// validates it.
///
/// Environment variable overrides use the provider's conventional names:
/// `DEEPGRAM_API_KEY`, `OPENAI_API_KEY`, `CARTESIA_API_KEY`,
/// `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET`, `LIVEKIT_URL`, `JINA_API_KEY`,
/// `EXA_API_KEY`, `SERIAL_PORT`, `SERIAL_BAUD`, `MOTOR_WAVE_CMD`,
/// `MOTOR_GESTURE_CMD`, plus `VISU_DISPLAY_URL`, `VISU_LOG_LEVEL` and
/// `VISU_LOG_JSON`.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, an
/// override is malformed, or a required credential is missing.
pub fn load_config(path: Option<&str>) -> Result<AgentConfig, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AgentConfig::default(),
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => AgentConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Applies overrides from `lookup`. Empty values count as unset.
pub fn apply_env_overrides(
    config: &mut AgentConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let c = &mut config.credentials;
    for (key, slot) in [
        ("DEEPGRAM_API_KEY", &mut c.deepgram_api_key),
        ("OPENAI_API_KEY", &mut c.openai_api_key),
        ("CARTESIA_API_KEY", &mut c.cartesia_api_key),
        ("LIVEKIT_API_KEY", &mut c.livekit_api_key),
        ("LIVEKIT_API_SECRET", &mut c.livekit_api_secret),
        ("LIVEKIT_URL", &mut c.livekit_url),
        ("JINA_API_KEY", &mut config.search.jina_api_key),
        ("EXA_API_KEY", &mut config.search.exa_api_key),
        ("SERIAL_PORT", &mut config.serial.port),
    ] {
        if let Some(value) = get(key) {
            *slot = Some(value);
        }
    }

    if let Some(baud) = get("SERIAL_BAUD") {
        config.serial.baud = baud
            .parse()
            .map_err(|_| ConfigError::InvalidEnv {
                key: "SERIAL_BAUD",
                value: baud,
            })?;
    }
    if let Some(cmd) = get("MOTOR_WAVE_CMD") {
        config.serial.wave_command = cmd;
    }
    if let Some(cmd) = get("MOTOR_GESTURE_CMD") {
        config.serial.gesture_command = cmd;
    }
    if let Some(url) = get("VISU_DISPLAY_URL") {
        config.display.url = url;
    }
    if let Some(level) = get("VISU_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = get("VISU_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    const ALL_REQUIRED: &[(&str, &str)] = &[
        ("DEEPGRAM_API_KEY", "dg"),
        ("OPENAI_API_KEY", "oa"),
        ("CARTESIA_API_KEY", "ca"),
        ("LIVEKIT_API_KEY", "lk"),
        ("LIVEKIT_API_SECRET", "lks"),
        ("LIVEKIT_URL", "wss://example.livekit.cloud"),
    ];

    #[test]
    fn defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.serial.wave_command, "WAVE");
        assert_eq!(config.serial.gesture_command, "RANDOM");
        assert_eq!(config.display.url, "http://localhost:8000");
        assert!(config.search.jina_api_key.is_none());
    }

    #[test]
    fn missing_credential_is_named() {
        let mut config = AgentConfig::default();
        apply_env_overrides(&mut config, env(&ALL_REQUIRED[1..])).unwrap();
        match config.validate() {
            Err(ConfigError::MissingCredential(key)) => assert_eq!(key, "DEEPGRAM_API_KEY"),
            other => panic!("expected missing credential, got {:?}", other),
        }
    }

    #[test]
    fn complete_credentials_validate() {
        let mut config = AgentConfig::default();
        apply_env_overrides(&mut config, env(ALL_REQUIRED)).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn empty_optional_values_stay_disabled() {
        let mut config = AgentConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("JINA_API_KEY", ""), ("SERIAL_PORT", "  "), ("EXA_API_KEY", "exa")]),
        )
        .unwrap();
        assert!(config.search.jina_api_key.is_none());
        assert!(config.serial.port.is_none());
        assert_eq!(config.search.exa_api_key.as_deref(), Some("exa"));
    }

    #[test]
    fn bad_baud_is_rejected() {
        let mut config = AgentConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("SERIAL_BAUD", "fast")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "SERIAL_BAUD", .. }));
    }

    #[test]
    fn file_values_load_and_env_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[credentials]
deepgram_api_key = "file-dg"

[serial]
port = "/dev/ttyUSB0"
baud = 115200

[display]
url = "http://display.local:8000"
"#
        )
        .unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let mut config: AgentConfig = toml::from_str(&contents).unwrap();
        apply_env_overrides(&mut config, env(&[("DEEPGRAM_API_KEY", "env-dg")])).unwrap();

        assert_eq!(config.credentials.deepgram_api_key.as_deref(), Some("env-dg"));
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.serial.baud, 115200);
        assert_eq!(config.serial.wave_command, "WAVE");
        assert_eq!(config.display.url, "http://display.local:8000");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AgentConfig::default();
        apply_env_overrides(&mut config, env(ALL_REQUIRED)).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("\"oa\""));
        assert!(printed.contains("[REDACTED]"));
    }
}
