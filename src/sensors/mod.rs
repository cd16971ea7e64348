//! Sensor Registry
//!
//! Every sensor is a [`Sensor`] record: a deterministic unique ID, a display
//! name, and a [`SensorKind`] that selects the projection applied to the
//! current [`Snapshot`]. Projections are pure except for the two kinds that
//! carry their own small state (disk usage freeze cell, network rate tracker).
//!
//! # Discovery
//!
//! Sensors are created from the first successful snapshot. On later cycles
//! [`SensorRegistry::sync`] adds entities for newly appearing disks, fans,
//! containers, VMs and interfaces while keeping existing instances (and their
//! state) untouched. Entities are never removed; a sensor whose subject has
//! disappeared projects `None` (or its frozen value).
//!
//! # Unique IDs
//!
//! IDs are `{entry_id}_{suffix}`, e.g. `{entry}_cpu_usage`,
//! `{entry}_disk_{sanitized-id}_usage`, `{entry}_network_{iface}_rx`.

pub mod array;
pub mod derive;
pub mod disk;
pub mod docker;
pub mod gpu;
pub mod network;
pub mod system;
pub mod ups;

use crate::coordinator::Snapshot;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

pub use derive::{DiskUsageCell, RateTracker};

pub const MANUFACTURER: &str = "Lime Technology";
pub const MODEL: &str = "Unraid Server";

pub type Attributes = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Sensor,
    BinarySensor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Float(f64),
    Integer(u64),
    Text(String),
    Bool(bool),
}

impl SensorValue {
    /// Numeric view used for metrics; text values have none
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Text(_) => None,
        }
    }
}

impl From<f64> for SensorValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<u64> for SensorValue {
    fn from(v: u64) -> Self {
        Self::Integer(v)
    }
}

impl From<String> for SensorValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for SensorValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Projection result: display value plus extra attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorState {
    pub value: Option<SensorValue>,
    pub attributes: Attributes,
}

impl SensorState {
    pub fn new<V: Into<SensorValue>>(value: Option<V>) -> Self {
        Self {
            value: value.map(Into::into),
            attributes: Attributes::new(),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Add an attribute; `None` values are recorded as JSON null
    pub fn attr<V: Serialize>(mut self, key: &str, value: V) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.attributes.insert(key.to_string(), value);
        self
    }

    /// Add an attribute only when a value is present
    pub fn attr_opt<V: Serialize>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attr(key, v),
            None => self,
        }
    }
}

/// What a sensor projects, with any state it owns
#[derive(Debug, Clone)]
pub enum SensorKind {
    CpuUsage,
    RamUsage,
    CpuTemperature,
    MotherboardTemperature,
    Fan { name: String },
    Uptime,
    ArrayUsage,
    ParityProgress,
    DiskUsage { disk_id: String, cell: DiskUsageCell },
    GpuName,
    GpuUtilization,
    GpuCpuTemperature,
    GpuPower,
    UpsBattery,
    UpsLoad,
    UpsRuntime,
    UpsPower,
    NetworkRx { interface: String, tracker: RateTracker },
    NetworkTx { interface: String, tracker: RateTracker },

    ArrayStarted,
    ParityCheckRunning,
    ParityValid,
    UpsConnected,
    Container { id: String },
    Vm { id: String },
    NetworkLink { interface: String },
}

impl SensorKind {
    pub fn platform(&self) -> Platform {
        match self {
            Self::ArrayStarted
            | Self::ParityCheckRunning
            | Self::ParityValid
            | Self::UpsConnected
            | Self::Container { .. }
            | Self::Vm { .. }
            | Self::NetworkLink { .. } => Platform::BinarySensor,
            _ => Platform::Sensor,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sensor {
    pub unique_id: String,
    pub name: String,
    pub unit: Option<&'static str>,
    pub kind: SensorKind,
}

impl Sensor {
    pub fn new(entry_id: &str, suffix: &str, name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            unique_id: format!("{}_{}", entry_id, suffix),
            name: name.into(),
            unit: None,
            kind,
        }
    }

    pub fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn platform(&self) -> Platform {
        self.kind.platform()
    }

    /// Evaluate against the snapshot, updating any state the sensor owns
    pub fn project(&mut self, snapshot: &Snapshot) -> SensorState {
        match &mut self.kind {
            SensorKind::CpuUsage => system::cpu_usage(snapshot),
            SensorKind::RamUsage => system::ram_usage(snapshot),
            SensorKind::CpuTemperature => system::cpu_temperature(snapshot),
            SensorKind::MotherboardTemperature => system::motherboard_temperature(snapshot),
            SensorKind::Fan { name } => system::fan(snapshot, name),
            SensorKind::Uptime => system::uptime(snapshot),
            SensorKind::ArrayUsage => array::array_usage(snapshot),
            SensorKind::ParityProgress => array::parity_progress(snapshot),
            SensorKind::DiskUsage { disk_id, cell } => disk::disk_usage(snapshot, disk_id, cell),
            SensorKind::GpuName => gpu::gpu_name(snapshot),
            SensorKind::GpuUtilization => gpu::gpu_utilization(snapshot),
            SensorKind::GpuCpuTemperature => gpu::gpu_cpu_temperature(snapshot),
            SensorKind::GpuPower => gpu::gpu_power(snapshot),
            SensorKind::UpsBattery => ups::ups_battery(snapshot),
            SensorKind::UpsLoad => ups::ups_load(snapshot),
            SensorKind::UpsRuntime => ups::ups_runtime(snapshot),
            SensorKind::UpsPower => ups::ups_power(snapshot),
            SensorKind::NetworkRx { interface, tracker } => {
                network::traffic(snapshot, interface, network::Direction::Inbound, tracker)
            }
            SensorKind::NetworkTx { interface, tracker } => {
                network::traffic(snapshot, interface, network::Direction::Outbound, tracker)
            }
            SensorKind::ArrayStarted => array::array_started(snapshot),
            SensorKind::ParityCheckRunning => array::parity_check_running(snapshot),
            SensorKind::ParityValid => array::parity_problem(snapshot),
            SensorKind::UpsConnected => ups::ups_connected(snapshot),
            SensorKind::Container { id } => docker::container_running(snapshot, id),
            SensorKind::Vm { id } => docker::vm_running(snapshot, id),
            SensorKind::NetworkLink { interface } => network::link_up(snapshot, interface),
        }
    }
}

/// One evaluated sensor, as published over HTTP and metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub unique_id: String,
    pub name: String,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub value: Option<SensorValue>,
    pub attributes: Attributes,
}

/// Device record all sensors of one server belong to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub sw_version: String,
}

pub fn device_info(entry_id: &str, snapshot: &Snapshot) -> DeviceInfo {
    let system = snapshot.system.as_ref();
    DeviceInfo {
        identifier: entry_id.to_string(),
        name: format!("Unraid ({})", snapshot.hostname().unwrap_or("Unraid")),
        manufacturer: MANUFACTURER,
        model: MODEL,
        sw_version: system
            .and_then(|s| s.version.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

/// Lowercase and replace spaces and slashes with underscores
pub fn sanitize_id(raw: &str) -> String {
    raw.replace([' ', '/'], "_").to_lowercase()
}

/// Every sensor the snapshot currently supports
pub fn discover(entry_id: &str, snapshot: &Snapshot) -> Vec<Sensor> {
    let mut sensors = Vec::new();
    sensors.extend(system::discover(entry_id, snapshot));
    sensors.extend(array::discover(entry_id, snapshot));
    sensors.extend(disk::discover(entry_id, snapshot));
    sensors.extend(gpu::discover(entry_id, snapshot));
    sensors.extend(ups::discover(entry_id, snapshot));
    sensors.extend(network::discover(entry_id, snapshot));
    sensors.extend(docker::discover(entry_id, snapshot));
    sensors
}

pub struct SensorRegistry {
    entry_id: String,
    sensors: Vec<Sensor>,
    known: HashSet<String>,
}

impl SensorRegistry {
    pub fn new(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            sensors: Vec::new(),
            known: HashSet::new(),
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    /// Register sensors for entities not seen before; returns how many were added
    pub fn sync(&mut self, snapshot: &Snapshot) -> usize {
        let mut added = 0;
        for sensor in discover(&self.entry_id, snapshot) {
            if self.known.insert(sensor.unique_id.clone()) {
                self.sensors.push(sensor);
                added += 1;
            }
        }
        if added > 0 {
            info!("Registered {} new sensors ({} total)", added, self.sensors.len());
        }
        added
    }

    /// Project every registered sensor against the snapshot
    pub fn evaluate(&mut self, snapshot: &Snapshot) -> Vec<SensorReading> {
        self.sensors
            .iter_mut()
            .map(|sensor| {
                let state = sensor.project(snapshot);
                SensorReading {
                    unique_id: sensor.unique_id.clone(),
                    name: sensor.name.clone(),
                    platform: sensor.platform(),
                    unit: sensor.unit,
                    value: state.value,
                    attributes: state.attributes,
                }
            })
            .collect()
    }

    pub fn get(&self, unique_id: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.unique_id == unique_id)
    }

    pub fn get_mut(&mut self, unique_id: &str) -> Option<&mut Sensor> {
        self.sensors.iter_mut().find(|s| s.unique_id == unique_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.iter()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}
