//! Array and parity sensors

use super::system::UNIT_PERCENT;
use super::{Sensor, SensorKind, SensorState};
use crate::coordinator::Snapshot;
use crate::unraid::types::ArrayStatus;

pub fn discover(entry_id: &str, _snapshot: &Snapshot) -> Vec<Sensor> {
    vec![
        Sensor::new(entry_id, "array_usage", "Array Usage", SensorKind::ArrayUsage)
            .with_unit(UNIT_PERCENT),
        Sensor::new(
            entry_id,
            "parity_progress",
            "Parity Check Progress",
            SensorKind::ParityProgress,
        )
        .with_unit(UNIT_PERCENT),
        Sensor::new(
            entry_id,
            "array_started",
            "Array Started",
            SensorKind::ArrayStarted,
        ),
        Sensor::new(
            entry_id,
            "parity_check_running",
            "Parity Check Running",
            SensorKind::ParityCheckRunning,
        ),
        Sensor::new(entry_id, "parity_valid", "Parity Valid", SensorKind::ParityValid),
    ]
}

fn array(snapshot: &Snapshot) -> Option<&ArrayStatus> {
    snapshot.array.as_ref()
}

pub fn array_usage(snapshot: &Snapshot) -> SensorState {
    let array = array(snapshot);
    SensorState::new(array.and_then(|a| a.used_percent))
        .attr("array_state", array.and_then(|a| a.state.as_deref()))
        .attr("num_disks", array.and_then(|a| a.num_disks))
        .attr("num_data_disks", array.and_then(|a| a.num_data_disks))
        .attr("num_parity_disks", array.and_then(|a| a.num_parity_disks))
}

pub fn parity_progress(snapshot: &Snapshot) -> SensorState {
    SensorState::new(array(snapshot).and_then(|a| a.parity_check_progress))
}

pub fn array_started(snapshot: &Snapshot) -> SensorState {
    let started = array(snapshot)
        .and_then(|a| a.state.as_deref())
        .is_some_and(|s| s.eq_ignore_ascii_case("started"));
    SensorState::new(Some(started))
}

pub fn parity_check_running(snapshot: &Snapshot) -> SensorState {
    let status = array(snapshot).and_then(|a| a.parity_check_status.as_deref());
    let running = status.is_some_and(|s| s.eq_ignore_ascii_case("running"));
    SensorState::new(Some(running)).attr("parity_check_status", status)
}

/// Problem-class sensor: on when parity is reported invalid
pub fn parity_problem(snapshot: &Snapshot) -> SensorState {
    let valid = array(snapshot)
        .and_then(|a| a.parity_valid)
        .unwrap_or(true);
    SensorState::new(Some(!valid))
}
