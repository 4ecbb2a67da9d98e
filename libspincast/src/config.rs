//! Configuration management for Spincast

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub access: AccessConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub bluesky: BlueskyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the relay, e.g. "0.0.0.0:19030".
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Inbound access control knobs.
///
/// An empty `allowed_prefixes` list rejects every request; the relay only
/// serves sources it has been told about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Source addresses allowed to submit, matched exactly or by prefix.
    pub allowed_prefixes: Vec<String>,

    /// Steady refill rate of the process-wide limiter.
    #[serde(default = "default_global_per_second")]
    pub global_per_second: f64,

    /// Ceiling for the submit endpoint per rolling minute.
    #[serde(default = "default_submit_per_minute")]
    pub submit_per_minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// File holding the exported session token between restarts.
    pub cache_file: String,

    /// JSON file with `account_identifier` and `secret`. Read-only.
    pub credentials_file: String,
}

impl SessionConfig {
    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.cache_file).to_string())
    }

    pub fn credentials_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.credentials_file).to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    /// Base URL of the PDS, without the /xrpc suffix.
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Deadline applied to every outbound call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:19030".to_string()
}

fn default_global_per_second() -> f64 {
    1.0
}

fn default_submit_per_minute() -> u32 {
    5
}

fn default_service_url() -> String {
    "https://bsky.social".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            access: AccessConfig {
                allowed_prefixes: vec![],
                global_per_second: default_global_per_second(),
                submit_per_minute: default_submit_per_minute(),
            },
            session: SessionConfig {
                cache_file: "~/.local/share/spincast/session.txt".to_string(),
                credentials_file: "~/.config/spincast/credentials.json".to_string(),
            },
            bluesky: BlueskyConfig::default(),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SPINCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("spincast").join("config.toml"))
}
