//! System sensors: CPU, RAM, temperatures, fans, uptime

use super::derive::{format_gib, format_uptime, round1};
use super::{sanitize_id, Sensor, SensorKind, SensorState};
use crate::coordinator::Snapshot;
use crate::unraid::types::SystemInfo;

pub const UNIT_PERCENT: &str = "%";
pub const UNIT_CELSIUS: &str = "°C";
pub const UNIT_RPM: &str = "RPM";

pub fn discover(entry_id: &str, snapshot: &Snapshot) -> Vec<Sensor> {
    let mut sensors = vec![
        Sensor::new(entry_id, "cpu_usage", "CPU Usage", SensorKind::CpuUsage)
            .with_unit(UNIT_PERCENT),
        Sensor::new(entry_id, "ram_usage", "RAM Usage", SensorKind::RamUsage)
            .with_unit(UNIT_PERCENT),
        Sensor::new(
            entry_id,
            "cpu_temperature",
            "CPU Temperature",
            SensorKind::CpuTemperature,
        )
        .with_unit(UNIT_CELSIUS),
        Sensor::new(entry_id, "uptime", "Uptime", SensorKind::Uptime),
    ];

    let Some(system) = snapshot.system.as_ref() else {
        return sensors;
    };

    if system.motherboard_temp_celsius.is_some_and(|t| t != 0.0) {
        sensors.push(
            Sensor::new(
                entry_id,
                "motherboard_temperature",
                "Motherboard Temperature",
                SensorKind::MotherboardTemperature,
            )
            .with_unit(UNIT_CELSIUS),
        );
    }

    for fan in &system.fans {
        let name = if fan.name.is_empty() {
            "unknown"
        } else {
            fan.name.as_str()
        };
        sensors.push(
            Sensor::new(
                entry_id,
                &format!("fan_{}", sanitize_id(name)),
                format!("Fan {}", name),
                SensorKind::Fan {
                    name: name.to_string(),
                },
            )
            .with_unit(UNIT_RPM),
        );
    }

    sensors
}

fn system(snapshot: &Snapshot) -> Option<&SystemInfo> {
    snapshot.system.as_ref()
}

pub fn cpu_usage(snapshot: &Snapshot) -> SensorState {
    let system = system(snapshot);
    SensorState::new(system.and_then(|s| s.cpu_usage_percent).map(round1))
        .attr("cpu_model", system.and_then(|s| s.cpu_model.as_deref()))
        .attr("cpu_cores", system.and_then(|s| s.cpu_cores))
        .attr("cpu_threads", system.and_then(|s| s.cpu_threads))
}

pub fn ram_usage(snapshot: &Snapshot) -> SensorState {
    let system = system(snapshot);
    let ram_total = match system.and_then(|s| s.ram_total_bytes) {
        Some(bytes) if bytes > 0 => format_gib(bytes),
        _ => "Unknown".to_string(),
    };
    SensorState::new(system.and_then(|s| s.ram_usage_percent).map(round1))
        .attr("ram_total", ram_total)
        .attr("server_model", system.and_then(|s| s.server_model.as_deref()))
}

pub fn cpu_temperature(snapshot: &Snapshot) -> SensorState {
    SensorState::new(system(snapshot).and_then(|s| s.cpu_temp_celsius))
}

pub fn motherboard_temperature(snapshot: &Snapshot) -> SensorState {
    SensorState::new(system(snapshot).and_then(|s| s.motherboard_temp_celsius))
}

pub fn fan(snapshot: &Snapshot, name: &str) -> SensorState {
    let rpm = snapshot
        .fans()
        .iter()
        .find(|f| f.name == name)
        .and_then(|f| f.rpm);
    SensorState::new(rpm)
}

pub fn uptime(snapshot: &Snapshot) -> SensorState {
    let system = system(snapshot);
    let seconds = system.and_then(|s| s.uptime_seconds);
    SensorState::new(seconds.map(|s| format_uptime(Some(s))))
        .attr("hostname", system.and_then(|s| s.hostname.as_deref()))
        .attr_opt("uptime_seconds", seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SensorValue;
    use crate::unraid::types::{CategoryUpdate, Fan};
    use serde_json::json;

    fn snapshot(system: SystemInfo) -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.apply(CategoryUpdate::System(system));
        snapshot
    }

    #[test]
    fn test_optional_system_sensors_follow_payload() {
        let bare = discover("e", &snapshot(SystemInfo::default()));
        assert_eq!(bare.len(), 4);

        let full = discover(
            "e",
            &snapshot(SystemInfo {
                motherboard_temp_celsius: Some(38.0),
                fans: vec![Fan {
                    name: "CPU Fan".to_string(),
                    rpm: Some(1200),
                }],
                ..Default::default()
            }),
        );
        let ids: Vec<_> = full.iter().map(|s| s.unique_id.as_str()).collect();
        assert!(ids.contains(&"e_motherboard_temperature"));
        assert!(ids.contains(&"e_fan_cpu_fan"));
    }

    #[test]
    fn test_ram_usage_attributes() {
        let state = ram_usage(&snapshot(SystemInfo {
            ram_usage_percent: Some(55.55),
            ram_total_bytes: Some(34_359_738_368),
            ..Default::default()
        }));
        assert_eq!(state.value, Some(SensorValue::Float(55.6)));
        assert_eq!(state.attributes["ram_total"], json!("32.00 GB"));
        assert_eq!(state.attributes["server_model"], json!(null));
    }

    #[test]
    fn test_uptime_value_and_attributes() {
        let state = uptime(&snapshot(SystemInfo {
            hostname: Some("tower".to_string()),
            uptime_seconds: Some(90061),
            ..Default::default()
        }));
        assert_eq!(
            state.value,
            Some(SensorValue::Text(
                "1 day, 1 hour, 1 minute, 1 second".to_string()
            ))
        );
        assert_eq!(state.attributes["uptime_seconds"], json!(90061));

        let missing = uptime(&Snapshot::default());
        assert_eq!(missing.value, None);
        assert!(!missing.attributes.contains_key("uptime_seconds"));
    }

    #[test]
    fn test_fan_lookup_by_name() {
        let snapshot = snapshot(SystemInfo {
            fans: vec![Fan {
                name: "Rear".to_string(),
                rpm: Some(900),
            }],
            ..Default::default()
        });
        assert_eq!(fan(&snapshot, "Rear").value, Some(SensorValue::Integer(900)));
        assert_eq!(fan(&snapshot, "Front").value, None);
    }
}
