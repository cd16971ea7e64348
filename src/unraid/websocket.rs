//! Push Channel
//!
//! The agent streams unsolicited updates over `ws://{host}:{port}/api/v1/ws`.
//! Each text frame is a JSON object whose `data` field carries one category's
//! full payload. Frames have no type tag, so the category is recognised from
//! the payload's shape (see [`identify_event`]).
//!
//! Decoded updates are forwarded over an mpsc channel to the refresh loop,
//! which is the only writer of the snapshot.

use crate::config::UnraidConfig;
use crate::error::{ExporterError, Result};
use crate::unraid::client::{API_BASE, API_WEBSOCKET};
use crate::unraid::types::{Category, CategoryUpdate};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

/// Backoff schedule between reconnect attempts, in seconds
pub const RECONNECT_DELAYS: [u64; 7] = [1, 2, 4, 8, 16, 32, 60];

/// Consecutive failed attempts after which the listener gives up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Handshake deadline for one connect attempt
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ping period on an open connection
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Result of inspecting a push payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEvent {
    Update(Category),
    /// An empty list; could belong to any list category
    EmptyList,
    Unknown,
}

fn has_all(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().all(|k| obj.contains_key(*k))
}

/// Recognise the category of a push payload from its structure
pub fn identify_event(data: &Value) -> PushEvent {
    match data {
        Value::Array(items) => {
            let Some(first) = items.first() else {
                return PushEvent::EmptyList;
            };
            let Value::Object(item) = first else {
                return PushEvent::Unknown;
            };

            if has_all(item, &["device", "mount_point"]) {
                PushEvent::Update(Category::Disks)
            } else if has_all(item, &["image", "ports"])
                && (item.contains_key("id") || item.contains_key("container_id"))
            {
                PushEvent::Update(Category::Containers)
            } else if has_all(item, &["state", "vcpus"]) {
                PushEvent::Update(Category::Vms)
            } else if has_all(item, &["mac_address", "bytes_received"]) {
                PushEvent::Update(Category::Network)
            } else {
                PushEvent::Unknown
            }
        }
        Value::Object(obj) => {
            if has_all(obj, &["hostname", "cpu_usage_percent"]) {
                PushEvent::Update(Category::System)
            } else if has_all(obj, &["state", "parity_check_status", "num_disks"]) {
                PushEvent::Update(Category::Array)
            } else if has_all(obj, &["connected", "battery_charge_percent"]) {
                PushEvent::Update(Category::Ups)
            } else if has_all(
                obj,
                &["available", "driver_version", "utilization_gpu_percent"],
            ) {
                PushEvent::Update(Category::Gpu)
            } else {
                PushEvent::Unknown
            }
        }
        _ => PushEvent::Unknown,
    }
}

/// Decode one text frame into a category update.
///
/// Returns `Ok(None)` for frames that carry nothing applicable: no `data`
/// field, an empty list, or an unrecognised shape.
pub fn decode_message(text: &str) -> Result<Option<CategoryUpdate>> {
    let mut message: Value = serde_json::from_str(text)?;

    let Some(data) = message.get_mut("data").map(Value::take) else {
        debug!("Received message without data field");
        return Ok(None);
    };

    match identify_event(&data) {
        PushEvent::Update(category) => Ok(Some(CategoryUpdate::from_value(category, data)?)),
        PushEvent::EmptyList => Ok(None),
        PushEvent::Unknown => {
            match &data {
                Value::Object(obj) => debug!(
                    "Received unknown event type with keys: {:?}",
                    obj.keys().collect::<Vec<_>>()
                ),
                other => debug!("Received unknown event: {}", type_name(other)),
            }
            Ok(None)
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Delay before reconnect attempt number `attempt` (zero-based)
pub fn reconnect_delay(attempt: u32) -> Duration {
    let index = (attempt as usize).min(RECONNECT_DELAYS.len() - 1);
    Duration::from_secs(RECONNECT_DELAYS[index])
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Long-running listener for the agent push channel
pub struct PushListener {
    url: String,
    updates: mpsc::Sender<CategoryUpdate>,
    heartbeat: Duration,
    max_attempts: u32,
}

impl PushListener {
    pub fn new(config: &UnraidConfig, updates: mpsc::Sender<CategoryUpdate>) -> Self {
        Self {
            url: format!(
                "ws://{}:{}{}/{}",
                config.host, config.port, API_BASE, API_WEBSOCKET
            ),
            updates,
            heartbeat: HEARTBEAT_INTERVAL,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }

    /// Ping period; a connection silent for two periods is dropped
    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Consecutive failed connects tolerated before giving up
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Listen until the receiving side goes away or reconnects are exhausted.
    ///
    /// The attempt counter restarts on every successful connect, so only
    /// back-to-back connect failures count towards the limit.
    ///
    /// Dropping the future (task abort) closes the socket.
    pub async fn run(self) {
        let mut attempts: u32 = 0;

        loop {
            match self.connect().await {
                Ok(stream) => {
                    attempts = 0;
                    match self.listen(stream).await {
                        Ok(Flow::ReceiverClosed) => {
                            debug!("Update receiver closed, stopping push listener");
                            return;
                        }
                        Ok(Flow::Disconnected) => warn!("WebSocket closed by server"),
                        Err(e) => warn!("WebSocket connection lost: {}", e),
                    }
                }
                Err(e) => error!("WebSocket connection failed: {}", e),
            }

            if attempts >= self.max_attempts {
                error!(
                    "Max reconnection attempts ({}) reached, giving up",
                    self.max_attempts
                );
                return;
            }

            let delay = reconnect_delay(attempts);
            attempts += 1;
            info!(
                "Reconnecting in {} seconds (attempt {}/{})",
                delay.as_secs(),
                attempts,
                self.max_attempts
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect(&self) -> Result<WsStream> {
        info!("Connecting to WebSocket: {}", self.url);
        let (stream, _) = timeout(CONNECT_TIMEOUT, connect_async(self.url.as_str()))
            .await
            .map_err(|_| {
                ExporterError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no handshake within {}s", CONNECT_TIMEOUT.as_secs()),
                ))
            })?
            .map_err(ExporterError::WebSocket)?;
        info!("WebSocket connected successfully");
        Ok(stream)
    }

    /// One connection lifetime
    async fn listen(&self, stream: WsStream) -> Result<Flow> {
        let (mut sink, mut source) = stream.split();
        let mut heartbeat = interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                frame = source.next() => {
                    let Some(frame) = frame else {
                        return Ok(Flow::Disconnected);
                    };
                    last_seen = Instant::now();

                    match frame.map_err(ExporterError::WebSocket)? {
                        Message::Text(text) => {
                            if let Some(update) = self.decode(text.as_str()) {
                                debug!("Push update for {}", update.category());
                                if self.updates.send(update).await.is_err() {
                                    return Ok(Flow::ReceiverClosed);
                                }
                            }
                        }
                        Message::Close(_) => return Ok(Flow::Disconnected),
                        _ => {}
                    }
                }
                _ = heartbeat.tick() => {
                    if last_seen.elapsed() >= self.heartbeat * 2 {
                        return Err(ExporterError::Io(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("no frames for {}s", last_seen.elapsed().as_secs()),
                        )));
                    }
                    sink.send(Message::Ping(Default::default()))
                        .await
                        .map_err(ExporterError::WebSocket)?;
                }
            }
        }
    }

    fn decode(&self, text: &str) -> Option<CategoryUpdate> {
        match decode_message(text) {
            Ok(update) => update,
            Err(e) => {
                error!("Failed to decode WebSocket message: {}", e);
                None
            }
        }
    }
}

enum Flow {
    Disconnected,
    ReceiverClosed,
}
