//! # configs
//!
//! Layered settings for the agora server. Later layers win:
//!
//! 1. built-in defaults;
//! 2. an optional file (`config/agora.toml` unless `AGORA_CONFIG` points elsewhere);
//! 3. environment variables prefixed `AGORA__`, with `__` between levels,
//!    e.g. `AGORA__SERVER__PORT=9000` or `AGORA__DATABASE__URL=postgres://…`.
//!
//! A `.env` file is read into the environment first, if present.

use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "config/agora";
pub const ENV_PREFIX: &str = "AGORA";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub notifications: NotificationSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, multipart uploads included
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, max_body_bytes: 8 * 1024 * 1024 }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Without a URL the server runs on the in-memory store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "optional_secret")]
    pub url: Option<SecretString>,
    pub max_connections: u32,
    /// Deadline for every single store call
    pub timeout_ms: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { url: None, max_connections: 10, timeout_ms: 20_000, run_migrations: true }
    }
}

impl DatabaseSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    #[default]
    Memory,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    pub backend: MediaBackend,
    /// Root directory for the `local` backend
    pub root: String,
    pub url_prefix: String,
    pub timeout_ms: u64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            backend: MediaBackend::Memory,
            root: "./data/uploads".into(),
            url_prefix: "/static/uploads".into(),
            timeout_ms: 20_000,
        }
    }
}

impl MediaSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// When set, a commenter's own follow counter is not bumped by their comment
    pub exclude_commenter: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { exclude_commenter: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set
    pub filter: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { filter: "info,sqlx=warn".into(), json: false }
    }
}

fn optional_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|url| !url.trim().is_empty()).map(SecretString::from))
}

impl Settings {
    /// Reads `.env`, then the file named by `AGORA_CONFIG` (or the default), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => return Err(ConfigError::Invalid(format!(".env: {err}"))),
        }
        let file = std::env::var("AGORA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_sources(File::with_name(&file).required(false), Environment::with_prefix(ENV_PREFIX))
    }

    /// Builds settings from an explicit file source and environment source.
    pub fn from_sources<F>(file: F, env: Environment) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(env.prefix_separator("__").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        if self.database.timeout_ms == 0 || self.media.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1ms".into()));
        }
        if self.media.backend == MediaBackend::Local && self.media.root.trim().is_empty() {
            return Err(ConfigError::Invalid("media.root is required for the local backend".into()));
        }
        Ok(())
    }
}
