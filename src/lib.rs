//! Unraid Management Agent Exporter
//!
//! Polls the Unraid Management Agent REST API (and optionally its WebSocket
//! push channel), keeps a merged snapshot of every data category, and exposes
//! derived sensors, health issues and Prometheus metrics over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   REST /api/v1/*    ┌───────────────────────────┐
//! │   Unraid    │ ◄─────────────────► │ Client ─► Coordinator     │
//! │ Mgmt Agent  │   WebSocket /ws     │              │            │      HTTP      ┌────────────┐
//! └─────────────┘ ──────────────────► │ Push ────────┘            │ ◄────────────► │ Prometheus │
//!                                     │ Sensors · Issues · Metrics│  /metrics      │  / clients │
//!                                     └───────────────────────────┘  /api/*        └────────────┘
//! ```
//!
//! # Modules
//!
//! - [`unraid`] - REST client, payload types and push listener
//! - [`coordinator`] - Snapshot and the concurrent refresh cycle
//! - [`sensors`] - Sensor registry and derived values
//! - [`issues`] - Health issue detection
//! - [`control`] - Array, parity, container and VM actions
//! - [`validation`] - One-shot connection check
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server and refresh loop
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use unraid_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod control;
pub mod coordinator;
pub mod error;
pub mod issues;
pub mod metrics;
pub mod sensors;
pub mod server;
pub mod unraid;
pub mod validation;
