//! Sensor registry tests over realistic snapshots

mod common;

use common::*;
use serde_json::{json, Value};
use unraid_exporter::coordinator::Snapshot;
use unraid_exporter::sensors::{Platform, SensorKind, SensorReading, SensorRegistry, SensorValue};
use unraid_exporter::unraid::types::{Category, CategoryUpdate};

fn update(category: Category, body: Value) -> CategoryUpdate {
    CategoryUpdate::from_value(category, body).expect("fixture decodes")
}

fn full_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::default();
    snapshot.apply(update(Category::System, system_json()));
    snapshot.apply(update(Category::Array, array_json()));
    snapshot.apply(update(Category::Disks, disks_json()));
    snapshot.apply(update(Category::Containers, containers_json()));
    snapshot.apply(update(Category::Vms, vms_json()));
    snapshot.apply(update(Category::Ups, ups_json()));
    snapshot.apply(update(Category::Gpu, gpu_json()));
    snapshot.apply(update(Category::Network, network_json()));
    snapshot
}

fn reading<'a>(readings: &'a [SensorReading], unique_id: &str) -> &'a SensorReading {
    readings
        .iter()
        .find(|r| r.unique_id == unique_id)
        .unwrap_or_else(|| panic!("no reading for {}", unique_id))
}

#[test]
fn test_full_snapshot_registers_expected_entities() {
    // Given: A snapshot with every category populated
    let snapshot = full_snapshot();
    let mut registry = SensorRegistry::new("tower");

    // When: Discovering sensors
    registry.sync(&snapshot);

    // Then: Static, optional and dynamic entities are all present
    for id in [
        "tower_cpu_usage",
        "tower_ram_usage",
        "tower_cpu_temperature",
        "tower_motherboard_temperature",
        "tower_fan_cpu_fan",
        "tower_uptime",
        "tower_array_usage",
        "tower_parity_progress",
        "tower_disk_disk1_usage",
        "tower_disk_disk2_usage",
        "tower_gpu_name",
        "tower_gpu_power",
        "tower_ups_battery",
        "tower_ups_runtime",
        "tower_network_eth0_rx",
        "tower_network_eth0_tx",
        "tower_array_started",
        "tower_parity_valid",
        "tower_ups_connected",
        "tower_container_abc123",
        "tower_vm_vm-1",
        "tower_network_eth0",
    ] {
        assert!(registry.get(id).is_some(), "missing {}", id);
    }

    // Virtual interfaces get nothing
    assert!(registry.get("tower_network_docker0_rx").is_none());
    assert!(registry.get("tower_network_docker0").is_none());
}

#[test]
fn test_readings_carry_derived_values() {
    // Given
    let snapshot = full_snapshot();
    let mut registry = SensorRegistry::new("tower");
    registry.sync(&snapshot);

    // When
    let readings = registry.evaluate(&snapshot);

    // Then
    assert_eq!(
        reading(&readings, "tower_uptime").value,
        Some(SensorValue::Text("1 day, 1 hour, 1 minute, 1 second".to_string()))
    );
    assert_eq!(
        reading(&readings, "tower_cpu_usage").value,
        Some(SensorValue::Float(23.5))
    );
    // Derived from used/size: 1 TB of 4 TB
    assert_eq!(
        reading(&readings, "tower_disk_disk1_usage").value,
        Some(SensorValue::Float(25.0))
    );
    // Standby disk with no prior value
    let disk2 = reading(&readings, "tower_disk_disk2_usage");
    assert_eq!(disk2.value, None);
    // Unreported byte figures are not shown as zero
    assert_eq!(disk2.attributes["size"], json!("Unknown"));
    assert_eq!(
        reading(&readings, "tower_disk_disk1_usage").attributes["size"],
        json!("3725.29 GB")
    );
    assert_eq!(
        reading(&readings, "tower_network_eth0_rx").value,
        Some(SensorValue::Float(8000.0))
    );
    assert_eq!(
        reading(&readings, "tower_network_eth0_tx").attributes["bytes_sent"],
        json!(500)
    );

    let array_started = reading(&readings, "tower_array_started");
    assert_eq!(array_started.platform, Platform::BinarySensor);
    assert_eq!(array_started.value, Some(SensorValue::Bool(true)));
}

#[test]
fn test_disk_usage_freeze_across_cycles() {
    // Given: An active disk at 42%
    let mut registry = SensorRegistry::new("tower");
    let mut snapshot = Snapshot::default();
    snapshot.apply(update(
        Category::Disks,
        json!([{"id": "disk1", "usage_percent": 42.0, "spin_state": "active"}]),
    ));
    registry.sync(&snapshot);
    let readings = registry.evaluate(&snapshot);
    assert_eq!(
        reading(&readings, "tower_disk_disk1_usage").value,
        Some(SensorValue::Float(42.0))
    );

    // When: The disk spins down and reports a different figure
    snapshot.apply(update(
        Category::Disks,
        json!([{"id": "disk1", "usage_percent": 0.0, "spin_state": "standby"}]),
    ));
    let readings = registry.evaluate(&snapshot);

    // Then: The frozen value is shown
    assert_eq!(
        reading(&readings, "tower_disk_disk1_usage").value,
        Some(SensorValue::Float(42.0))
    );

    // When: The disk disappears entirely
    snapshot.apply(update(Category::Disks, json!([])));
    let readings = registry.evaluate(&snapshot);

    // Then: Still frozen, and the cell is inspectable
    assert_eq!(
        reading(&readings, "tower_disk_disk1_usage").value,
        Some(SensorValue::Float(42.0))
    );
    match &registry.get("tower_disk_disk1_usage").unwrap().kind {
        SensorKind::DiskUsage { cell, .. } => assert_eq!(cell.value(), Some(42.0)),
        other => panic!("unexpected kind {:?}", other),
    }
}

#[test]
fn test_new_entities_discovered_on_later_cycles() {
    // Given: A registry built from a snapshot with one container
    let mut snapshot = full_snapshot();
    let mut registry = SensorRegistry::new("tower");
    registry.sync(&snapshot);
    let before = registry.len();

    // When: A second container appears
    snapshot.apply(update(
        Category::Containers,
        json!([
            {"id": "abc123", "name": "plex", "image": "plex", "state": "running", "ports": []},
            {"id": "def456", "name": "sonarr", "image": "sonarr", "state": "exited", "ports": []}
        ]),
    ));
    let added = registry.sync(&snapshot);

    // Then: Only the new container is added
    assert_eq!(added, 1);
    assert_eq!(registry.len(), before + 1);
    let readings = registry.evaluate(&snapshot);
    assert_eq!(
        reading(&readings, "tower_container_def456").value,
        Some(SensorValue::Bool(false))
    );
}

#[test]
fn test_readings_serialize_for_api() {
    // Given
    let snapshot = full_snapshot();
    let mut registry = SensorRegistry::new("tower");
    registry.sync(&snapshot);
    let readings = registry.evaluate(&snapshot);

    // When
    let value = serde_json::to_value(reading(&readings, "tower_cpu_usage")).unwrap();

    // Then: Untagged value and snake_case platform
    assert_eq!(value["value"], json!(23.5));
    assert_eq!(value["platform"], json!("sensor"));
    assert_eq!(value["unit"], json!("%"));
    assert_eq!(value["attributes"]["cpu_cores"], json!(10));
}
