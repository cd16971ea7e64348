//! Unraid Management Agent REST Client
//!
//! Thin wrapper over `reqwest` that issues single-attempt requests against
//! `http://{host}:{port}/api/v1/{path}` and folds every failure into the
//! three [`ClientError`] kinds:
//!
//! - network-level timeout → [`ClientError::Timeout`]
//! - refused connection, DNS, TLS, any other transport error, or a non-2xx
//!   status → [`ClientError::Connection`]
//! - empty body, `null`, unparseable JSON, or JSON of the wrong shape →
//!   [`ClientError::InvalidResponse`]
//!
//! No retries happen here. Control actions are not idempotent on the agent
//! side, so callers that retry must tolerate at-least-once semantics.
//!
//! # Example
//!
//! ```no_run
//! use unraid_exporter::config::UnraidConfig;
//! use unraid_exporter::unraid::UnraidClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = UnraidClient::new(&UnraidConfig::new("tower.local", 8043));
//! let system = client.get_system_info().await?;
//! println!("{:?}", system.hostname);
//! # Ok(())
//! # }
//! ```

use crate::config::UnraidConfig;
use crate::error::ClientError;
use crate::unraid::types::*;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

pub const API_BASE: &str = "/api/v1";

pub const API_HEALTH: &str = "health";
pub const API_SYSTEM: &str = "system";
pub const API_ARRAY: &str = "array";
pub const API_DISKS: &str = "disks";
pub const API_DOCKER: &str = "docker";
pub const API_VM: &str = "vm";
pub const API_UPS: &str = "ups";
pub const API_GPU: &str = "gpu";
pub const API_NETWORK: &str = "network";
pub const API_PARITY: &str = "parity";
pub const API_WEBSOCKET: &str = "ws";

/// Client for the agent REST API.
///
/// The underlying `reqwest::Client` is a pooled, cheaply cloneable handle that
/// supports many in-flight requests, so one client serves all concurrent
/// category fetches of a refresh cycle.
#[derive(Clone)]
pub struct UnraidClient {
    http: reqwest::Client,
    host: String,
    port: u16,
    base_url: String,
    timeout: Duration,
}

impl UnraidClient {
    pub fn new(config: &UnraidConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client on top of a caller-owned `reqwest::Client`
    pub fn with_client(http: reqwest::Client, config: &UnraidConfig) -> Self {
        Self {
            http,
            host: config.host.clone(),
            port: config.port,
            base_url: format!("http://{}:{}{}", config.host, config.port, API_BASE),
            timeout: config.timeout(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path relative to `/api/v1`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn health_check(&self) -> Result<HealthStatus, ClientError> {
        self.get(API_HEALTH).await
    }

    pub async fn get_system_info(&self) -> Result<SystemInfo, ClientError> {
        self.get(API_SYSTEM).await
    }

    pub async fn get_array_status(&self) -> Result<ArrayStatus, ClientError> {
        self.get(API_ARRAY).await
    }

    pub async fn get_disks(&self) -> Result<Vec<Disk>, ClientError> {
        self.get(API_DISKS).await
    }

    pub async fn get_containers(&self) -> Result<Vec<Container>, ClientError> {
        self.get(API_DOCKER).await
    }

    pub async fn get_vms(&self) -> Result<Vec<VirtualMachine>, ClientError> {
        self.get(API_VM).await
    }

    pub async fn get_ups_status(&self) -> Result<UpsStatus, ClientError> {
        self.get(API_UPS).await
    }

    pub async fn get_gpu_metrics(&self) -> Result<Vec<Gpu>, ClientError> {
        self.get(API_GPU).await
    }

    pub async fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>, ClientError> {
        self.get(API_NETWORK).await
    }

    // ── Array and parity control ─────────────────────────────────────

    pub async fn start_array(&self) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_ARRAY}/start")).await
    }

    pub async fn stop_array(&self) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_ARRAY}/stop")).await
    }

    pub async fn start_parity_check(&self) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_PARITY}/start")).await
    }

    pub async fn stop_parity_check(&self) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_PARITY}/stop")).await
    }

    pub async fn pause_parity_check(&self) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_PARITY}/pause")).await
    }

    pub async fn resume_parity_check(&self) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_PARITY}/resume")).await
    }

    // ── Container control ────────────────────────────────────────────

    pub async fn start_container(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_DOCKER}/{id}/start")).await
    }

    pub async fn stop_container(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_DOCKER}/{id}/stop")).await
    }

    pub async fn restart_container(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_DOCKER}/{id}/restart")).await
    }

    pub async fn pause_container(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_DOCKER}/{id}/pause")).await
    }

    pub async fn unpause_container(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_DOCKER}/{id}/unpause")).await
    }

    // ── VM control ───────────────────────────────────────────────────

    pub async fn start_vm(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_VM}/{id}/start")).await
    }

    pub async fn stop_vm(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_VM}/{id}/stop")).await
    }

    pub async fn restart_vm(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_VM}/{id}/restart")).await
    }

    pub async fn pause_vm(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_VM}/{id}/pause")).await
    }

    pub async fn resume_vm(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_VM}/{id}/resume")).await
    }

    pub async fn hibernate_vm(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_VM}/{id}/hibernate")).await
    }

    pub async fn force_stop_vm(&self, id: &str) -> Result<ActionResponse, ClientError> {
        self.post(&format!("{API_VM}/{id}/force-stop")).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::POST, path).await
    }

    /// Issue one request and decode its JSON body
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let response = self
            .http
            .request(method, &url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            error!("Error connecting to {}: HTTP {}", url, status);
            return Err(ClientError::Connection {
                url,
                reason: format!("HTTP status {}", status),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&url, e))?;

        debug!(
            "API response from {}: status={}, body_length={}",
            url,
            status.as_u16(),
            body.len()
        );

        decode_body(&url, &body)
    }
}

/// Map a `reqwest` failure onto the client taxonomy
fn transport_error(url: &str, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        error!("Timeout connecting to {}", url);
        ClientError::Timeout {
            url: url.to_string(),
        }
    } else {
        error!("Error connecting to {}: {}", url, err);
        ClientError::Connection {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Decode a response body, rejecting empty bodies and JSON `null`
pub fn decode_body<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ClientError> {
    let invalid = |reason: String| {
        error!("Invalid response from {}: {}", url, reason);
        ClientError::InvalidResponse {
            url: url.to_string(),
            reason,
        }
    };

    if body.trim().is_empty() {
        return Err(invalid("empty response body".to_string()));
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(500).collect();
        invalid(format!("{} (body: {})", e, preview))
    })?;

    if value.is_null() {
        return Err(invalid("API returned null".to_string()));
    }

    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}
