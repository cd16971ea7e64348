//! UPS sensors, created only while a UPS is connected

use super::derive::round1;
use super::system::UNIT_PERCENT;
use super::{Sensor, SensorKind, SensorState};
use crate::coordinator::Snapshot;
use crate::unraid::types::UpsStatus;

pub const UNIT_WATT: &str = "W";
pub const UNIT_SECONDS: &str = "s";

pub fn discover(entry_id: &str, snapshot: &Snapshot) -> Vec<Sensor> {
    let Some(ups) = snapshot.ups.as_ref() else {
        return Vec::new();
    };

    let mut sensors = vec![Sensor::new(
        entry_id,
        "ups_connected",
        "UPS Connected",
        SensorKind::UpsConnected,
    )];

    if ups.is_connected() {
        sensors.extend([
            Sensor::new(entry_id, "ups_battery", "UPS Battery", SensorKind::UpsBattery)
                .with_unit(UNIT_PERCENT),
            Sensor::new(entry_id, "ups_load", "UPS Load", SensorKind::UpsLoad)
                .with_unit(UNIT_PERCENT),
            Sensor::new(entry_id, "ups_runtime", "UPS Runtime", SensorKind::UpsRuntime)
                .with_unit(UNIT_SECONDS),
            Sensor::new(entry_id, "ups_power", "UPS Power", SensorKind::UpsPower)
                .with_unit(UNIT_WATT),
        ]);
    }

    sensors
}

fn ups(snapshot: &Snapshot) -> Option<&UpsStatus> {
    snapshot.ups.as_ref()
}

pub fn ups_battery(snapshot: &Snapshot) -> SensorState {
    SensorState::new(ups(snapshot).and_then(|u| u.battery_charge_percent))
}

pub fn ups_load(snapshot: &Snapshot) -> SensorState {
    SensorState::new(ups(snapshot).and_then(|u| u.load_percent))
}

pub fn ups_runtime(snapshot: &Snapshot) -> SensorState {
    SensorState::new(ups(snapshot).and_then(|u| u.runtime_left_seconds))
}

pub fn ups_power(snapshot: &Snapshot) -> SensorState {
    let ups = ups(snapshot);
    SensorState::new(ups.and_then(|u| u.power_watts).map(round1))
        .attr("ups_status", ups.and_then(|u| u.status.as_deref()))
        .attr("ups_model", ups.and_then(|u| u.model.as_deref()))
        .attr_opt("load_percent", ups.and_then(|u| u.load_percent))
        .attr_opt("input_voltage", ups.and_then(|u| u.input_voltage))
        .attr_opt("output_voltage", ups.and_then(|u| u.output_voltage))
}

pub fn ups_connected(snapshot: &Snapshot) -> SensorState {
    SensorState::new(Some(ups(snapshot).is_some_and(UpsStatus::is_connected)))
}
