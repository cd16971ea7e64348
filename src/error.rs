use thiserror::Error;

/// Failures surfaced by the agent transport client.
///
/// These three kinds are the only ones the client produces. Non-2xx HTTP
/// status codes are folded into [`ClientError::Connection`] together with
/// refused connections, DNS and TLS failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Timeout connecting to {url}")]
    Timeout { url: String },

    #[error("Error connecting to {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse { .. })
    }

    /// URL of the request that failed
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Connection { url, .. }
            | Self::InvalidResponse { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Unraid API error: {0}")]
    Client(#[from] ClientError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Refresh failed: {0}")]
    Refresh(String),

    #[error("Invalid control action: {0}")]
    InvalidAction(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
