//! Configuration for roomcouncil.
//!
//! [`RoomCouncilConfig`] is a plain struct: construct it by hand, start from
//! [`Default`], or read it from the process environment with [`RoomCouncilConfig::from_env`].
//! The binary loads a `.env` file before calling `from_env`, so the same variables work in
//! either place.
//!
//! | Variable               | Default                        |
//! |------------------------|--------------------------------|
//! | `ANTHROPIC_API_KEY`    | *(required)*                   |
//! | `ANTHROPIC_BASE_URL`   | `https://api.anthropic.com`    |
//! | `AGENT_MODEL`          | `claude-3-5-haiku-20241022`    |
//! | `AGENT_MAX_TOKENS`     | `300`                          |
//! | `SYNTHESIS_MODEL`      | `claude-3-5-sonnet-20240620`   |
//! | `SYNTHESIS_MAX_TOKENS` | `1000`                         |
//! | `HOST`                 | `127.0.0.1`                    |
//! | `PORT`                 | `3001`                         |

use crate::clients::claude::DEFAULT_BASE_URL;
use crate::pipeline::PipelineConfig;
use std::error::Error;
use std::fmt;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "Missing configuration: {}", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl Error for ConfigError {}

/// Global configuration for the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCouncilConfig {
    /// Anthropic API key. Empty in [`Default`]; `from_env` requires it.
    pub api_key: String,
    /// Base URL of the Messages API.
    pub base_url: String,
    /// Call profiles handed to the [`Pipeline`](crate::pipeline::Pipeline).
    pub pipeline: PipelineConfig,
    /// Interface the HTTP server binds to.
    pub host: String,
    /// Port the HTTP server binds to.
    pub port: u16,
}

impl Default for RoomCouncilConfig {
    fn default() -> Self {
        RoomCouncilConfig {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            pipeline: PipelineConfig::default(),
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl RoomCouncilConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use roomcouncil::config::RoomCouncilConfig;
    ///
    /// let vars = HashMap::from([("ANTHROPIC_API_KEY", "sk-test"), ("PORT", "8080")]);
    /// let config = RoomCouncilConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    /// assert_eq!(config.port, 8080);
    /// assert_eq!(config.pipeline.agent_max_tokens, 300);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = RoomCouncilConfig::default();

        let api_key = get("ANTHROPIC_API_KEY").ok_or(ConfigError::Missing("ANTHROPIC_API_KEY"))?;

        Ok(RoomCouncilConfig {
            api_key,
            base_url: get("ANTHROPIC_BASE_URL").unwrap_or(defaults.base_url),
            pipeline: PipelineConfig {
                agent_model: get("AGENT_MODEL").unwrap_or(defaults.pipeline.agent_model),
                agent_max_tokens: parse_or(
                    "AGENT_MAX_TOKENS",
                    get("AGENT_MAX_TOKENS"),
                    defaults.pipeline.agent_max_tokens,
                )?,
                synthesis_model: get("SYNTHESIS_MODEL")
                    .unwrap_or(defaults.pipeline.synthesis_model),
                synthesis_max_tokens: parse_or(
                    "SYNTHESIS_MAX_TOKENS",
                    get("SYNTHESIS_MAX_TOKENS"),
                    defaults.pipeline.synthesis_max_tokens,
                )?,
            },
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
