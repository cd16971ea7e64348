//! Unraid Management Agent Payload Types
//!
//! Rust structs for the JSON bodies served under `/api/v1`. Every field the
//! sensors read is optional or defaulted: the agent omits fields depending on
//! hardware (no GPU, no UPS, spun-down disks) and agent version.
//!
//! # Endpoints Covered
//!
//! - `/health` → [`HealthStatus`]
//! - `/system` → [`SystemInfo`], [`Fan`]
//! - `/array` → [`ArrayStatus`]
//! - `/disks` → [`Disk`]
//! - `/docker` → [`Container`]
//! - `/vm` → [`VirtualMachine`]
//! - `/ups` → [`UpsStatus`]
//! - `/gpu` → [`Gpu`]
//! - `/network` → [`NetworkInterface`]
//! - control endpoints → [`ActionResponse`]
//!
//! [`Category`] and [`CategoryUpdate`] tie the payloads to the snapshot keys.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Treat an explicit `null` like a missing key.
///
/// The agent serialises empty slices and strings as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// System information from `/system`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub cpu_usage_percent: Option<f64>,
    #[serde(default)]
    pub cpu_model: Option<String>,
    #[serde(default)]
    pub cpu_cores: Option<u32>,
    #[serde(default)]
    pub cpu_threads: Option<u32>,
    #[serde(default)]
    pub cpu_temp_celsius: Option<f64>,
    #[serde(default)]
    pub motherboard_temp_celsius: Option<f64>,
    #[serde(default)]
    pub ram_usage_percent: Option<f64>,
    #[serde(default)]
    pub ram_total_bytes: Option<u64>,
    #[serde(default)]
    pub uptime_seconds: Option<u64>,
    #[serde(default)]
    pub server_model: Option<String>,
    #[serde(default)]
    pub bios_version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fans: Vec<Fan>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Fan {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub rpm: Option<u64>,
}

/// Array status from `/array`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ArrayStatus {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub used_percent: Option<f64>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub used_bytes: Option<u64>,
    #[serde(default)]
    pub free_bytes: Option<u64>,
    #[serde(default)]
    pub num_disks: Option<u32>,
    #[serde(default)]
    pub num_data_disks: Option<u32>,
    #[serde(default)]
    pub num_parity_disks: Option<u32>,
    #[serde(default)]
    pub parity_check_status: Option<String>,
    #[serde(default)]
    pub parity_check_progress: Option<f64>,
    #[serde(default)]
    pub parity_check_running: Option<bool>,
    #[serde(default)]
    pub parity_valid: Option<bool>,
    #[serde(default)]
    pub sync_percent: Option<f64>,
}

/// Disk power state reported by the agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinState {
    #[default]
    Active,
    Standby,
    Idle,
    #[serde(other)]
    Unknown,
}

impl SpinState {
    /// Standby and idle disks report stale or zeroed usage figures
    pub fn is_spun_down(self) -> bool {
        matches!(self, Self::Standby | Self::Idle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Standby => "standby",
            Self::Idle => "idle",
            Self::Unknown => "unknown",
        }
    }
}

/// Disk record from `/disks`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Disk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub used_bytes: Option<u64>,
    #[serde(default)]
    pub free_bytes: Option<u64>,
    #[serde(default)]
    pub usage_percent: Option<f64>,
    #[serde(default)]
    pub temperature_celsius: Option<f64>,
    #[serde(default)]
    pub spin_state: Option<SpinState>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub filesystem: Option<String>,
    #[serde(default)]
    pub mount_point: Option<String>,
    #[serde(default)]
    pub smart_status: Option<String>,
    #[serde(default)]
    pub smart_errors: Option<u64>,
}

impl Disk {
    /// Stable identifier: the agent `id`, falling back to the disk name
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().or(self.name.as_deref())
    }

    /// Reported spin state; disks without one are treated as active
    pub fn spin_state(&self) -> SpinState {
        self.spin_state.unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("unknown")
    }
}

/// Docker container from `/docker`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Container {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ports: serde_json::Value,
}

impl Container {
    pub fn key(&self) -> Option<&str> {
        non_empty(self.id.as_deref()).or(non_empty(self.container_id.as_deref()))
    }

    pub fn is_running(&self) -> bool {
        is_running(self.state.as_deref())
    }
}

/// Virtual machine from `/vm`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct VirtualMachine {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub vcpus: Option<u32>,
    #[serde(default)]
    pub memory_mb: Option<u64>,
}

impl VirtualMachine {
    pub fn key(&self) -> Option<&str> {
        non_empty(self.id.as_deref()).or(non_empty(self.name.as_deref()))
    }

    pub fn is_running(&self) -> bool {
        is_running(self.state.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn is_running(state: Option<&str>) -> bool {
    state.is_some_and(|s| s.eq_ignore_ascii_case("running"))
}

/// UPS status from `/ups`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct UpsStatus {
    #[serde(default)]
    pub connected: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub battery_charge_percent: Option<f64>,
    #[serde(default)]
    pub load_percent: Option<f64>,
    #[serde(default)]
    pub runtime_left_seconds: Option<u64>,
    #[serde(default)]
    pub power_watts: Option<f64>,
    #[serde(default)]
    pub input_voltage: Option<f64>,
    #[serde(default)]
    pub output_voltage: Option<f64>,
}

impl UpsStatus {
    pub fn is_connected(&self) -> bool {
        self.connected.unwrap_or(false)
    }
}

/// GPU metrics from `/gpu` (list; the first entry drives the sensors)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Gpu {
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub driver_version: Option<String>,
    #[serde(default)]
    pub utilization_gpu_percent: Option<f64>,
    #[serde(default)]
    pub temperature_celsius: Option<f64>,
    #[serde(default)]
    pub cpu_temperature_celsius: Option<f64>,
    #[serde(default)]
    pub power_draw_watts: Option<f64>,
}

/// Network interface from `/network`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NetworkInterface {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub speed: Option<serde_json::Value>,
    #[serde(default)]
    pub bytes_received: Option<u64>,
    #[serde(default)]
    pub bytes_sent: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub up: Option<bool>,
}

/// Acknowledgement returned by control endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ActionResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// One named group of remote metrics; a key of the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    System,
    Array,
    Disks,
    Containers,
    Vms,
    Ups,
    Gpu,
    Network,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::System,
        Category::Array,
        Category::Disks,
        Category::Containers,
        Category::Vms,
        Category::Ups,
        Category::Gpu,
        Category::Network,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Array => "array",
            Self::Disks => "disks",
            Self::Containers => "containers",
            Self::Vms => "vms",
            Self::Ups => "ups",
            Self::Gpu => "gpu",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly decoded payload for exactly one category
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryUpdate {
    System(SystemInfo),
    Array(ArrayStatus),
    Disks(Vec<Disk>),
    Containers(Vec<Container>),
    Vms(Vec<VirtualMachine>),
    Ups(UpsStatus),
    Gpu(Vec<Gpu>),
    Network(Vec<NetworkInterface>),
}

impl CategoryUpdate {
    pub fn category(&self) -> Category {
        match self {
            Self::System(_) => Category::System,
            Self::Array(_) => Category::Array,
            Self::Disks(_) => Category::Disks,
            Self::Containers(_) => Category::Containers,
            Self::Vms(_) => Category::Vms,
            Self::Ups(_) => Category::Ups,
            Self::Gpu(_) => Category::Gpu,
            Self::Network(_) => Category::Network,
        }
    }

    /// Decode a raw JSON payload as the given category.
    ///
    /// List categories accept a single object and wrap it into a one-element list.
    pub fn from_value(
        category: Category,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        use serde_json::{from_value, Value};

        let list = |value: Value| match value {
            Value::Array(_) => value,
            other => Value::Array(vec![other]),
        };

        Ok(match category {
            Category::System => Self::System(from_value(value)?),
            Category::Array => Self::Array(from_value(value)?),
            Category::Disks => Self::Disks(from_value(list(value))?),
            Category::Containers => Self::Containers(from_value(list(value))?),
            Category::Vms => Self::Vms(from_value(list(value))?),
            Category::Ups => Self::Ups(from_value(value)?),
            Category::Gpu => Self::Gpu(from_value(list(value))?),
            Category::Network => Self::Network(from_value(list(value))?),
        })
    }
}
