//! HTTP Server and Refresh Loop
//!
//! This module implements the exporter HTTP server and the background loop
//! that drives the coordinator.
//!
//! # Architecture
//!
//! - **Refresh Loop**: Single task that owns the [`Coordinator`] and the
//!   [`SensorRegistry`]. It refreshes on every tick, on control-triggered
//!   requests, and applies push updates as they arrive. After each merge it
//!   evaluates sensors and issues and publishes the result.
//! - **Push Listener**: Optional task forwarding WebSocket updates to the loop
//! - **HTTP Server**: Axum router reading the latest published view
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - 200 when the last refresh succeeded, 503 otherwise
//! - `GET /api/sensors` - Device info and every sensor reading as JSON
//! - `GET /api/issues` - Active health issues as JSON
//! - `POST /api/control/{target}/{action}` - Array and parity actions
//! - `POST /api/control/{target}/{id}/{action}` - Container and VM actions
//!
//! # Error Handling
//!
//! Per-category fetch failures keep the previous data and are logged by the
//! coordinator. A failed refresh marks the exporter unavailable but the loop
//! keeps running.

use crate::config::{Config, UnraidConfig};
use crate::control::ControlAction;
use crate::coordinator::{Coordinator, CoordinatorState};
use crate::error::ExporterError;
use crate::issues::{detect_issues, Issue};
use crate::metrics::MetricsCollector;
use crate::sensors::{device_info, DeviceInfo, SensorReading, SensorRegistry};
use crate::unraid::types::CategoryUpdate;
use crate::unraid::{PushListener, UnraidClient};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::interval;
use tracing::{error, info, warn};

/// Capacity of the push update channel
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Everything the HTTP surface serves, rebuilt after every merge
#[derive(Debug, Clone, Default, Serialize)]
pub struct Published {
    pub available: bool,
    pub device: Option<DeviceInfo>,
    pub sensors: Vec<SensorReading>,
    pub issues: Vec<Issue>,
}

/// Owner of the coordinator and sensor registry
pub struct RefreshLoop {
    coordinator: Coordinator,
    registry: SensorRegistry,
    unraid: UnraidConfig,
    metrics: MetricsCollector,
    published: watch::Sender<Arc<Published>>,
}

impl RefreshLoop {
    pub fn new(unraid: UnraidConfig, client: UnraidClient, metrics: MetricsCollector) -> Self {
        let (published, _) = watch::channel(Arc::new(Published::default()));
        Self {
            coordinator: Coordinator::new(client),
            registry: SensorRegistry::new(unraid.entry_id()),
            unraid,
            metrics,
            published,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Published>> {
        self.published.subscribe()
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Run one refresh cycle and publish the outcome
    pub async fn refresh_once(&mut self) {
        if let Err(e) = self.coordinator.refresh().await {
            error!("Failed to refresh data: {}", e);
        }
        self.publish();
    }

    /// Apply one push update and publish when it was accepted
    pub fn apply_update(&mut self, update: CategoryUpdate) {
        if self.coordinator.apply_update(update) {
            self.publish();
        }
    }

    fn publish(&mut self) {
        let state: Arc<CoordinatorState> = self.coordinator.current();

        if state.available {
            self.registry.sync(&state.snapshot);
        }

        let sensors = self.registry.evaluate(&state.snapshot);
        let issues = detect_issues(self.registry.entry_id(), &self.unraid, &state);
        for issue in &issues {
            warn!("Health issue active: {} ({})", issue.id, issue.kind.as_str());
        }

        self.metrics.publish(&state, &sensors, &issues);

        let device = state
            .last_refresh
            .map(|_| device_info(self.registry.entry_id(), &state.snapshot));

        self.published.send_replace(Arc::new(Published {
            available: state.available,
            device,
            sensors,
            issues,
        }));
    }

    /// Drive the loop until the process exits
    pub async fn run(
        mut self,
        period: std::time::Duration,
        mut updates: mpsc::Receiver<CategoryUpdate>,
        refresh_requested: Arc<Notify>,
    ) {
        let mut ticker = interval(period);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.refresh_once().await,
                _ = refresh_requested.notified() => {
                    self.refresh_once().await;
                    ticker.reset();
                }
                Some(update) = updates.recv() => self.apply_update(update),
            }
        }
    }
}

#[derive(Clone)]
struct AppState {
    metrics: MetricsCollector,
    client: UnraidClient,
    published: watch::Receiver<Arc<Published>>,
    refresh_requested: Arc<Notify>,
}

impl AppState {
    fn current(&self) -> Arc<Published> {
        self.published.borrow().clone()
    }
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = MetricsCollector::new()?;
    let client = UnraidClient::new(&config.unraid);
    let refresh_requested = Arc::new(Notify::new());

    let refresh_loop = RefreshLoop::new(config.unraid.clone(), client.clone(), metrics.clone());
    let published = refresh_loop.subscribe();

    let (update_tx, update_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
    if config.unraid.enable_websocket {
        let listener = PushListener::new(&config.unraid, update_tx);
        tokio::spawn(listener.run());
    } else {
        info!("WebSocket push channel disabled, polling only");
        drop(update_tx);
    }

    // Start background refresh loop
    tokio::spawn(refresh_loop.run(
        config.coordinator.update_interval(),
        update_rx,
        refresh_requested.clone(),
    ));

    let state = AppState {
        metrics,
        client,
        published,
        refresh_requested,
    };

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/api/sensors", get(sensors_handler))
        .route("/api/issues", get(issues_handler))
        .route("/api/control/{target}/{action}", post(control_handler))
        .route("/api/control/{target}/{id}/{action}", post(control_target_handler))
        .with_state(state);

    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(ExporterError::Io)
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Exporter listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ExporterError::Server(e.to_string()))?;

    Ok(())
}

async fn root_handler() -> impl IntoResponse {
    axum::response::Html(
        r#"<html>
<head><title>Unraid Exporter</title></head>
<body>
<h1>Unraid Management Agent Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/api/sensors">Sensors</a></p>
<p><a href="/api/issues">Issues</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#,
    )
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.current().available {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Unraid agent unreachable")
    }
}

async fn sensors_handler(State(state): State<AppState>) -> Response {
    let published = state.current();
    Json(serde_json::json!({
        "available": published.available,
        "device": published.device,
        "sensors": published.sensors,
    }))
    .into_response()
}

async fn issues_handler(State(state): State<AppState>) -> Response {
    Json(state.current().issues.clone()).into_response()
}

async fn control_handler(
    State(state): State<AppState>,
    Path((target, action)): Path<(String, String)>,
) -> Response {
    run_control(&state, ControlAction::parse(&target, None, &action)).await
}

async fn control_target_handler(
    State(state): State<AppState>,
    Path((target, id, action)): Path<(String, String, String)>,
) -> Response {
    run_control(&state, ControlAction::parse(&target, Some(&id), &action)).await
}

async fn run_control(
    state: &AppState,
    action: Result<ControlAction, ExporterError>,
) -> Response {
    let action = match action {
        Ok(action) => action,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match action.execute(&state.client).await {
        Ok(response) => {
            state.refresh_requested.notify_one();
            Json(response).into_response()
        }
        Err(e) => {
            error!("Control action {} failed: {}", action, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}
