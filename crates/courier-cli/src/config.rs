//! Binary configuration: TOML file, then `COURIER_*` environment overrides.

use courier_core::config::{EngineConfig, EngineConfigError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable error: {0}")]
    Env(String),

    #[error("Invalid engine configuration: {0}")]
    Engine(#[from] EngineConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub engine: EngineConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub example_task: ExampleTaskConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExampleTaskConfig {
    /// Simulated latency of `example_task`, in milliseconds.
    pub delay_ms: u64,
}

impl ExampleTaskConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl CourierConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.engine.validate()?;
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "server.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Loads [`CourierConfig`] from an optional file plus prefixed environment
/// variables.
pub struct ConfigLoader {
    prefix: String,
    env: EnvLookup,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::with_env(|name| std::env::var(name).ok())
    }

    /// Read variables through `env` instead of the process environment.
    pub fn with_env(env: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            prefix: "COURIER".to_string(),
            env: Box::new(env),
        }
    }

    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<CourierConfig> {
        let content = std::fs::read_to_string(path)?;
        self.from_toml(&content)
    }

    pub fn from_toml(&self, content: &str) -> ConfigResult<CourierConfig> {
        let mut config: CourierConfig = toml::from_str(content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env(&self) -> ConfigResult<CourierConfig> {
        let mut config = CourierConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<CourierConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut CourierConfig) -> ConfigResult<()> {
        if let Some(capacity) = self.parse_var("QUEUE_CAPACITY")? {
            config.engine.queue_capacity = capacity;
        }
        if let Some(limit) = self.get_env_var("MAX_CONCURRENCY") {
            // empty clears the limit
            config.engine.max_concurrency = if limit.trim().is_empty() {
                None
            } else {
                Some(parse_value("MAX_CONCURRENCY", &limit)?)
            };
        }

        if let Some(bind) = self.parse_var("BIND")? {
            config.server.bind = bind;
        }
        if let Some(secs) = self.parse_var("REQUEST_TIMEOUT_SECS")? {
            config.server.request_timeout_secs = secs;
        }

        if let Some(level) = self.get_env_var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = self.get_env_var("LOG_FORMAT") {
            config.logging.format = format
                .parse()
                .map_err(|e| ConfigError::Env(format!("Invalid LOG_FORMAT: {e}")))?;
        }

        if let Some(delay) = self.parse_var("EXAMPLE_TASK_DELAY_MS")? {
            config.example_task.delay_ms = delay;
        }

        Ok(())
    }

    fn parse_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_env_var(name)
            .map(|raw| parse_value(name, &raw))
            .transpose()
    }

    fn get_env_var(&self, name: &str) -> Option<String> {
        (self.env)(&format!("{}_{}", self.prefix, name))
    }
}

fn parse_value<T>(name: &str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::Env(format!("Invalid {name}: {e}")))
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
