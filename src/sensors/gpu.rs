//! GPU sensors. Only the first reported GPU is exposed.

use super::system::{UNIT_CELSIUS, UNIT_PERCENT};
use super::ups::UNIT_WATT;
use super::{Sensor, SensorKind, SensorState};
use crate::coordinator::Snapshot;

pub fn discover(entry_id: &str, snapshot: &Snapshot) -> Vec<Sensor> {
    if snapshot.gpus().is_empty() {
        return Vec::new();
    }

    vec![
        Sensor::new(entry_id, "gpu_name", "GPU Name", SensorKind::GpuName),
        Sensor::new(
            entry_id,
            "gpu_utilization",
            "GPU Utilization",
            SensorKind::GpuUtilization,
        )
        .with_unit(UNIT_PERCENT),
        Sensor::new(
            entry_id,
            "gpu_cpu_temperature",
            "GPU CPU Temperature",
            SensorKind::GpuCpuTemperature,
        )
        .with_unit(UNIT_CELSIUS),
        Sensor::new(entry_id, "gpu_power", "GPU Power", SensorKind::GpuPower)
            .with_unit(UNIT_WATT),
    ]
}

pub fn gpu_name(snapshot: &Snapshot) -> SensorState {
    match snapshot.gpus().first() {
        Some(gpu) => SensorState::new(gpu.name.clone())
            .attr("driver_version", gpu.driver_version.as_deref()),
        None => SensorState::unavailable(),
    }
}

pub fn gpu_utilization(snapshot: &Snapshot) -> SensorState {
    SensorState::new(snapshot.gpus().first().and_then(|g| g.utilization_gpu_percent))
}

pub fn gpu_cpu_temperature(snapshot: &Snapshot) -> SensorState {
    SensorState::new(snapshot.gpus().first().and_then(|g| g.cpu_temperature_celsius))
}

pub fn gpu_power(snapshot: &Snapshot) -> SensorState {
    SensorState::new(snapshot.gpus().first().and_then(|g| g.power_draw_watts))
}
