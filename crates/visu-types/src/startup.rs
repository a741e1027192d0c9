//! Startup helpers shared by the `visu-server` and `visu-agent` binaries.

use std::fmt;

/// Where a binary's configuration path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CliArg,
    EnvVar,
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigSource::CliArg => "cli-arg",
            ConfigSource::EnvVar => "env-var",
            ConfigSource::Default => "default",
        })
    }
}

/// Picks the config file: first CLI argument, then the environment value,
/// then `default`. Blank values are skipped.
pub fn pick_config_path(
    cli_arg: Option<String>,
    env_value: Option<String>,
    default: &str,
) -> (String, ConfigSource) {
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    if let Some(path) = present(cli_arg) {
        return (path, ConfigSource::CliArg);
    }
    if let Some(path) = present(env_value) {
        return (path, ConfigSource::EnvVar);
    }
    (default.to_string(), ConfigSource::Default)
}

/// [`pick_config_path`] over the process arguments and `env_key`.
pub fn resolve_config_path(env_key: &str, default: &str) -> (String, ConfigSource) {
    pick_config_path(std::env::args().nth(1), std::env::var(env_key).ok(), default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_wins() {
        let (path, source) = pick_config_path(
            Some("cli.toml".into()),
            Some("env.toml".into()),
            "default.toml",
        );
        assert_eq!(path, "cli.toml");
        assert_eq!(source, ConfigSource::CliArg);
    }

    #[test]
    fn blank_values_fall_through() {
        let (path, source) =
            pick_config_path(Some("  ".into()), Some("env.toml".into()), "default.toml");
        assert_eq!((path.as_str(), source), ("env.toml", ConfigSource::EnvVar));

        let (path, source) = pick_config_path(None, Some(String::new()), "default.toml");
        assert_eq!((path.as_str(), source), ("default.toml", ConfigSource::Default));
        assert_eq!(source.to_string(), "default");
    }
}
