//! Shared fixtures: a wiremock agent serving realistic payloads

#![allow(dead_code)]

use serde_json::{json, Value};
use unraid_exporter::config::UnraidConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn config_for(server: &MockServer) -> UnraidConfig {
    let addr = server.address();
    let mut config = UnraidConfig::new(addr.ip().to_string(), addr.port());
    config.timeout_seconds = 1;
    config.entry_id = Some("tower".to_string());
    config
}

pub fn system_json() -> Value {
    json!({
        "hostname": "tower",
        "version": "6.12.6",
        "cpu_usage_percent": 23.46,
        "cpu_model": "Intel(R) Core(TM) i5-12600K",
        "cpu_cores": 10,
        "cpu_threads": 16,
        "cpu_temp_celsius": 45.0,
        "motherboard_temp_celsius": 38.0,
        "ram_usage_percent": 61.27,
        "ram_total_bytes": 34359738368u64,
        "uptime_seconds": 90061,
        "fans": [{"name": "CPU Fan", "rpm": 1150}]
    })
}

pub fn array_json() -> Value {
    json!({
        "state": "STARTED",
        "used_percent": 48.2,
        "num_disks": 4,
        "num_data_disks": 3,
        "num_parity_disks": 1,
        "parity_check_status": "idle",
        "parity_valid": true
    })
}

pub fn disks_json() -> Value {
    json!([
        {
            "id": "disk1",
            "name": "disk1",
            "device": "sdb",
            "size_bytes": 4000000000000u64,
            "used_bytes": 1000000000000u64,
            "spin_state": "active",
            "temperature_celsius": 34.0,
            "mount_point": "/mnt/disk1"
        },
        {
            "id": "disk2",
            "name": "disk2",
            "device": "sdc",
            "usage_percent": 71.4,
            "spin_state": "standby",
            "mount_point": "/mnt/disk2"
        }
    ])
}

pub fn containers_json() -> Value {
    json!([
        {"id": "abc123", "name": "plex", "image": "plexinc/pms-docker", "state": "running", "ports": []}
    ])
}

pub fn vms_json() -> Value {
    json!([{"id": "vm-1", "name": "win11", "state": "running", "vcpus": 4}])
}

pub fn ups_json() -> Value {
    json!({"connected": true, "status": "ONLINE", "battery_charge_percent": 100.0, "load_percent": 12.0, "runtime_left_seconds": 3600, "power_watts": 84.0})
}

pub fn gpu_json() -> Value {
    json!([{"available": true, "name": "Intel UHD 770", "driver_version": "i915", "utilization_gpu_percent": 3.0}])
}

pub fn network_json() -> Value {
    json!([
        {"name": "eth0", "mac_address": "aa:bb:cc:dd:ee:ff", "ip_address": "192.168.1.10", "bytes_received": 1000, "bytes_sent": 500, "up": true},
        {"name": "docker0", "bytes_received": 1, "bytes_sent": 1, "up": true}
    ])
}

pub async fn mount_json(server: &MockServer, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/{}", endpoint)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount every read endpoint with a healthy payload
pub async fn mount_all(server: &MockServer) {
    mount_json(server, "system", system_json()).await;
    mount_json(server, "array", array_json()).await;
    mount_json(server, "disks", disks_json()).await;
    mount_json(server, "docker", containers_json()).await;
    mount_json(server, "vm", vms_json()).await;
    mount_json(server, "ups", ups_json()).await;
    mount_json(server, "gpu", gpu_json()).await;
    mount_json(server, "network", network_json()).await;
}
