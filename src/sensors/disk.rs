//! Per-disk usage sensors.
//!
//! Usage is frozen while a disk is spun down; see [`DiskUsageCell`].
//!
//! The `size`, `used` and `free` attributes read `"Unknown"` whenever the agent
//! did not report the byte figure, whether the key was missing or `null`. A
//! missing figure is never shown as `0.00 GB`.

use super::derive::{format_gib, DiskUsageCell};
use super::system::UNIT_PERCENT;
use super::{sanitize_id, Sensor, SensorKind, SensorState};
use crate::coordinator::Snapshot;
use crate::unraid::types::Disk;

pub fn discover(entry_id: &str, snapshot: &Snapshot) -> Vec<Sensor> {
    snapshot
        .disks()
        .iter()
        .map(|disk| {
            let disk_id = disk.key().unwrap_or("unknown").to_string();
            let name = disk.name.as_deref().unwrap_or(&disk_id);
            Sensor::new(
                entry_id,
                &format!("disk_{}_usage", sanitize_id(&disk_id)),
                format!("Disk {} Usage", name),
                SensorKind::DiskUsage {
                    disk_id: disk_id.clone(),
                    cell: DiskUsageCell::new(),
                },
            )
            .with_unit(UNIT_PERCENT)
        })
        .collect()
}

fn find<'a>(snapshot: &'a Snapshot, disk_id: &str) -> Option<&'a Disk> {
    snapshot.disks().iter().find(|d| d.key() == Some(disk_id))
}

/// `"X.XX GB"`, or `"Unknown"` for an unreported figure
fn gib_or_unknown(bytes: Option<u64>) -> String {
    bytes.map(format_gib).unwrap_or_else(|| "Unknown".to_string())
}

pub fn disk_usage(snapshot: &Snapshot, disk_id: &str, cell: &mut DiskUsageCell) -> SensorState {
    let disk = find(snapshot, disk_id);
    let state = SensorState::new(cell.observe(disk));

    let Some(disk) = disk else {
        return state;
    };

    let spin_state = disk.spin_state();
    let state = state
        .attr("device", disk.device.as_deref())
        .attr("status", disk.status.as_deref())
        .attr("filesystem", disk.filesystem.as_deref())
        .attr("mount_point", disk.mount_point.as_deref())
        .attr("spin_state", spin_state.as_str())
        .attr("size", gib_or_unknown(disk.size_bytes))
        .attr("used", gib_or_unknown(disk.used_bytes))
        .attr("free", gib_or_unknown(disk.free_bytes))
        .attr("smart_status", disk.smart_status.as_deref())
        .attr("smart_errors", disk.smart_errors.unwrap_or(0));

    match disk.temperature_celsius {
        Some(t) if t > 0.0 => state.attr("temperature_celsius", t),
        _ if spin_state.is_spun_down() => state.attr("temperature_celsius", "Disk in standby"),
        _ => state,
    }
}
