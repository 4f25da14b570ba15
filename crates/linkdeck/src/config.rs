//! Client configuration loaded from `linkdeck.toml`.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use linkdeck_core::LinkScope;
use serde::Deserialize;
use smol_str::SmolStr;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "linkdeck.toml";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 500;
const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("{0}")]
    Read(SmolStr),

    /// Configuration value is malformed or out of range.
    #[error("invalid configuration: {0}")]
    Invalid(SmolStr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub base_url: SmolStr,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: SmolStr::new(DEFAULT_BASE_URL),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub log_level: tracing::Level,
    /// Page location used when a command names no scope. A location without
    /// a group is resolved against the catalog.
    pub default_scope: Option<SmolStr>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            log_level: tracing::Level::INFO,
            default_scope: None,
        }
    }
}

impl ClientConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Read(format!("{}: {err}", path.display()).into()))?;
        Self::from_toml_str(&text).map_err(|err| match err {
            ConfigError::Invalid(message) => {
                ConfigError::Invalid(format!("{}: {message}", path.display()).into())
            }
            other => other,
        })
    }

    /// Loads `path`, or `linkdeck.toml` from the working directory when it
    /// exists, or the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return Self::load(fallback);
        }
        Ok(Self::default())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: ClientToml =
            toml::from_str(text).map_err(|err| ConfigError::Invalid(err.to_string().into()))?;
        raw.into_config()
    }

    /// Replaces the server URL, e.g. from `--server`.
    pub fn override_base_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.server.base_url = parse_base_url(url)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ClientToml {
    log_level: Option<String>,
    default_scope: Option<String>,
    server: Option<ServerSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    base_url: Option<String>,
    connect_timeout_ms: Option<u64>,
    read_timeout_ms: Option<u64>,
}

impl ClientToml {
    fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let server = self.server.unwrap_or_default();
        let base_url = parse_base_url(server.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let connect_timeout = timeout(
            "server.connect_timeout_ms",
            server.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        )?;
        let read_timeout = timeout(
            "server.read_timeout_ms",
            server.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS),
        )?;
        let log_level = match self.log_level.as_deref() {
            Some(text) => parse_level(text)?,
            None => tracing::Level::INFO,
        };
        let default_scope = self
            .default_scope
            .as_deref()
            .map(parse_location)
            .transpose()?;
        Ok(ClientConfig {
            server: ServerConfig {
                base_url,
                connect_timeout,
                read_timeout,
            },
            log_level,
            default_scope,
        })
    }
}

fn parse_base_url(text: &str) -> Result<SmolStr, ConfigError> {
    let trimmed = text.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::Invalid(
            format!("server.base_url '{trimmed}' must start with http:// or https://").into(),
        ));
    }
    Ok(SmolStr::new(trimmed.trim_end_matches('/')))
}

fn parse_level(text: &str) -> Result<tracing::Level, ConfigError> {
    tracing::Level::from_str(text.trim())
        .map_err(|_| ConfigError::Invalid(format!("unknown log_level '{text}'").into()))
}

// Kept as written; only its shape is checked here.
fn parse_location(location: &str) -> Result<SmolStr, ConfigError> {
    let location = location.trim();
    match LinkScope::from_location(location) {
        Ok(_) => Ok(SmolStr::new(location)),
        Err(err) => Err(ConfigError::Invalid(format!("default_scope: {err}").into())),
    }
}

fn timeout(key: &str, millis: u64) -> Result<Duration, ConfigError> {
    if millis == 0 {
        return Err(ConfigError::Invalid(format!("{key} must be greater than 0").into()));
    }
    Ok(Duration::from_millis(millis))
}
