use serde_json::json;
use unraid_exporter::unraid::types::*;

#[test]
fn test_deserialize_system_info() {
    let json = json!({
        "hostname": "tower",
        "version": "6.12.6",
        "cpu_usage_percent": 12.5,
        "cpu_cores": 8,
        "ram_total_bytes": 17179869184u64,
        "uptime_seconds": 3600,
        "fans": [{"name": "CPU", "rpm": 900}, {"name": "Rear"}],
        "unexpected_field": "ignored"
    });

    let system: SystemInfo = serde_json::from_value(json).expect("Failed to parse SystemInfo");
    assert_eq!(system.hostname.as_deref(), Some("tower"));
    assert_eq!(system.cpu_cores, Some(8));
    assert_eq!(system.fans[1].rpm, None);
    assert_eq!(system.motherboard_temp_celsius, None);
}

#[test]
fn test_deserialize_disk_spin_states() {
    let json = json!([
        {"id": "disk1", "spin_state": "active"},
        {"id": "disk2", "spin_state": "standby"},
        {"id": "disk3", "spin_state": "idle"},
        {"id": "disk4", "spin_state": "sleeping"},
        {"name": "cache"}
    ]);

    let disks: Vec<Disk> = serde_json::from_value(json).expect("Failed to parse disks");
    assert_eq!(disks[0].spin_state(), SpinState::Active);
    assert!(disks[1].spin_state().is_spun_down());
    assert!(disks[2].spin_state().is_spun_down());
    assert_eq!(disks[3].spin_state(), SpinState::Unknown);
    // Missing spin state counts as active; key falls back to the name
    assert_eq!(disks[4].spin_state(), SpinState::Active);
    assert_eq!(disks[4].key(), Some("cache"));
}

#[test]
fn test_deserialize_nullable_disk_fields() {
    let json = json!({
        "id": "disk1",
        "size_bytes": null,
        "temperature_celsius": null,
        "smart_errors": null,
        "spin_state": null
    });

    let disk: Disk = serde_json::from_value(json).expect("Failed to parse Disk");
    assert_eq!(disk.size_bytes, None);
    assert_eq!(disk.spin_state(), SpinState::Active);
}

#[test]
fn test_container_key_prefers_id() {
    let containers: Vec<Container> = serde_json::from_value(json!([
        {"id": "abc", "container_id": "zzz", "state": "RUNNING"},
        {"id": "", "container_id": "def", "state": "exited"},
        {"name": "orphan"}
    ]))
    .unwrap();

    assert_eq!(containers[0].key(), Some("abc"));
    assert!(containers[0].is_running());
    assert_eq!(containers[1].key(), Some("def"));
    assert!(!containers[1].is_running());
    assert_eq!(containers[2].key(), None);
}

#[test]
fn test_deserialize_ups_and_network() {
    let ups: UpsStatus = serde_json::from_value(json!({
        "connected": true,
        "battery_charge_percent": 98.0,
        "runtime_left_seconds": 2400
    }))
    .unwrap();
    assert!(ups.is_connected());
    assert_eq!(ups.runtime_left_seconds, Some(2400));

    let interfaces: Vec<NetworkInterface> = serde_json::from_value(json!([
        {"name": "eth0", "speed": 1000, "bytes_received": 10, "up": true},
        {"name": "bond0", "speed": "10Gb/s"}
    ]))
    .unwrap();
    assert_eq!(interfaces[0].speed, Some(json!(1000)));
    assert_eq!(interfaces[1].speed, Some(json!("10Gb/s")));
}

#[test]
fn test_category_update_wraps_single_objects_for_list_categories() {
    let update = CategoryUpdate::from_value(
        Category::Vms,
        json!({"id": "vm-1", "state": "running", "vcpus": 2}),
    )
    .unwrap();

    match update {
        CategoryUpdate::Vms(vms) => {
            assert_eq!(vms.len(), 1);
            assert_eq!(vms[0].vcpus, Some(2));
        }
        other => panic!("unexpected update: {:?}", other),
    }
}

#[test]
fn test_category_update_rejects_wrong_shape() {
    let result = CategoryUpdate::from_value(Category::System, json!([1, 2, 3]));
    assert!(result.is_err());
}

#[test]
fn test_category_names() {
    let names: Vec<_> = Category::ALL.iter().map(|c| c.as_str()).collect();
    assert_eq!(
        names,
        vec!["system", "array", "disks", "containers", "vms", "ups", "gpu", "network"]
    );
    assert_eq!(serde_json::to_value(Category::Vms).unwrap(), json!("vms"));
}

#[test]
fn test_null_collections_and_names_decode_as_empty() {
    // Given: Payloads where the agent sent nil slices and strings as null
    let system: SystemInfo = serde_json::from_value(json!({
        "hostname": "tower",
        "cpu_usage_percent": 3.0,
        "fans": null
    }))
    .expect("null fans decode");

    let fans: Vec<Fan> = serde_json::from_value(json!([{"name": null, "rpm": 800}])).unwrap();
    let interfaces: Vec<NetworkInterface> =
        serde_json::from_value(json!([{"name": null, "bytes_received": 10}])).unwrap();
    let health: HealthStatus = serde_json::from_value(json!({"status": null})).unwrap();
    let ack: ActionResponse = serde_json::from_value(json!({"success": null})).unwrap();

    // Then: Each null falls back to the field default
    assert!(system.fans.is_empty());
    assert_eq!(system.hostname.as_deref(), Some("tower"));
    assert_eq!(fans[0].name, "");
    assert_eq!(fans[0].rpm, Some(800));
    assert_eq!(interfaces[0].name, "");
    assert_eq!(health.status, "");
    assert!(!ack.success);
}
