//! `lectern.toml` configuration.
//!
//! Every section and field is optional; missing values take the defaults
//! below. An explicitly requested file that does not exist, unknown keys, and
//! unknown log levels are all startup errors.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lectern.toml";

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile; every invocation starts from an empty catalog.
    Memory,
    #[default]
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Snapshot file for the `json` backend, relative to the working directory.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Json,
            path: PathBuf::from("lectern.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub allow_quiz_retakes: bool,
}

impl Config {
    /// Loads the configuration.
    ///
    /// With `explicit = None` the default file is read when present and
    /// defaults are used otherwise. An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if explicit.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&content).map_err(|e| match e {
            ParseFailure::Toml(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Invalid(e) => e,
        })
    }

    fn parse(content: &str) -> Result<Self, ParseFailure> {
        let config: Self = toml::from_str(content).map_err(ParseFailure::Toml)?;
        config.validate().map_err(ParseFailure::Invalid)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid {
                field: "logging.level",
                message: format!(
                    "{:?} is not one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        if self.store.backend == Backend::Json && self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "store.path",
                message: "must not be empty for the json backend".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
enum ParseFailure {
    Toml(toml::de::Error),
    Invalid(ConfigError),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").expect("defaults");
        assert_eq!(config, Config::default());
        assert_eq!(config.store.backend, Backend::Json);
        assert!(!config.policy.allow_quiz_retakes);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse(
            r#"
            [store]
            backend = "memory"

            [logging]
            level = "debug"
            format = "json"

            [policy]
            allow_quiz_retakes = true
            "#,
        )
        .expect("valid");

        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.store.path, PathBuf::from("lectern.json"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.policy.allow_quiz_retakes);
    }

    #[test]
    fn unknown_keys_and_levels_are_rejected() {
        assert!(matches!(
            Config::parse("[store]\nbackend = \"sqlite\"\n"),
            Err(ParseFailure::Toml(_))
        ));
        assert!(matches!(
            Config::parse("[policy]\nretakes = true\n"),
            Err(ParseFailure::Toml(_))
        ));
        assert!(matches!(
            Config::parse("[logging]\nlevel = \"loud\"\n"),
            Err(ParseFailure::Invalid(ConfigError::Invalid {
                field: "logging.level",
                ..
            }))
        ));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = TempDir::new().expect("temp dir");
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(missing.as_path())),
            Err(ConfigError::Read { .. })
        ));

        let present = dir.path().join("lectern.toml");
        std::fs::write(&present, "[policy]\nallow_quiz_retakes = true\n").expect("write");
        let config = Config::load(Some(present.as_path())).expect("load");
        assert!(config.policy.allow_quiz_retakes);
    }
}
