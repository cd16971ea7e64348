use crate::error::ExporterError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Bounds accepted for the refresh interval, in seconds
pub const MIN_UPDATE_INTERVAL: u64 = 5;
pub const MAX_UPDATE_INTERVAL: u64 = 300;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub unraid: UnraidConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnraidConfig {
    pub host: String,
    #[serde(default = "default_agent_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub enable_websocket: bool,
    /// Prefix for sensor unique IDs. Falls back to the sanitised `host:port`.
    #[serde(default)]
    pub entry_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CoordinatorConfig {
    #[serde(default = "default_update_interval")]
    pub update_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval_seconds: default_update_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

fn default_agent_port() -> u16 {
    8043
}

fn default_timeout() -> u64 {
    10
}

fn default_update_interval() -> u64 {
    30
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9102
}

fn default_true() -> bool {
    true
}

impl UnraidConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout_seconds: default_timeout(),
            enable_websocket: default_true(),
            entry_id: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Identifier used as the prefix of every sensor unique ID
    pub fn entry_id(&self) -> String {
        match &self.entry_id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => format!("{}_{}", self.host, self.port)
                .to_lowercase()
                .replace(['.', ':', ' ', '/'], "_"),
        }
    }
}

impl CoordinatorConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_seconds)
    }
}

/// Values supplied on the command line; they win over file and environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub unraid_host: Option<String>,
    pub unraid_port: Option<u16>,
    pub server_addr: Option<String>,
    pub server_port: Option<u16>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with(path, &Overrides::default())
    }

    /// Load file and environment sources, then apply `overrides` before
    /// deserializing, so a file without `[unraid] host` is fine when the host
    /// comes from the command line.
    pub fn load_with(path: &str, overrides: &Overrides) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("UNRAID_EXPORTER").separator("__"))
            .set_override_option("unraid.host", overrides.unraid_host.clone())?
            .set_override_option("unraid.port", overrides.unraid_port.map(u64::from))?
            .set_override_option("server.addr", overrides.server_addr.clone())?
            .set_override_option("server.port", overrides.server_port.map(u64::from))?
            .build()
            .context("Failed to build configuration")?;

        let config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Check the value ranges serde cannot express
    pub fn validate(&self) -> std::result::Result<(), ExporterError> {
        if self.unraid.host.trim().is_empty() {
            return Err(ExporterError::Config(
                "unraid.host must not be empty".to_string(),
            ));
        }
        if self.unraid.port == 0 {
            return Err(ExporterError::Config(
                "unraid.port must be between 1 and 65535".to_string(),
            ));
        }
        if self.unraid.timeout_seconds == 0 {
            return Err(ExporterError::Config(
                "unraid.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        let interval = self.coordinator.update_interval_seconds;
        if !(MIN_UPDATE_INTERVAL..=MAX_UPDATE_INTERVAL).contains(&interval) {
            return Err(ExporterError::Config(format!(
                "coordinator.update_interval_seconds must be between {} and {}, got {}",
                MIN_UPDATE_INTERVAL, MAX_UPDATE_INTERVAL, interval
            )));
        }
        Ok(())
    }
}
