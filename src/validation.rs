//! One-shot connection validation.
//!
//! Run once at setup (`--validate`) to confirm the agent is reachable and to
//! derive the entry title from the reported hostname.

use crate::config::UnraidConfig;
use crate::error::ClientError;
use crate::unraid::UnraidClient;
use std::fmt;
use tracing::{error, info};

/// Categorised setup failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    CannotConnect,
    Timeout,
    Unknown,
}

impl ValidationError {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CannotConnect => "cannot_connect",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ValidationError {}

impl From<&ClientError> for ValidationError {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Connection { .. } => Self::CannotConnect,
            ClientError::Timeout { .. } => Self::Timeout,
            ClientError::InvalidResponse { .. } => Self::Unknown,
        }
    }
}

/// What a successful validation yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntry {
    pub title: String,
    pub hostname: String,
    /// `host:port`; one entry per agent
    pub unique_id: String,
}

pub async fn validate_connection(config: &UnraidConfig) -> Result<ValidatedEntry, ValidationError> {
    let client = UnraidClient::new(config);

    let system = client.get_system_info().await.map_err(|e| {
        error!("Validation against {}:{} failed: {}", config.host, config.port, e);
        ValidationError::from(&e)
    })?;

    let hostname = system
        .hostname
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    info!("Validated connection to Unraid server {}", hostname);

    Ok(ValidatedEntry {
        title: format!("Unraid ({})", hostname),
        hostname,
        unique_id: format!("{}:{}", config.host, config.port),
    })
}
