//! Container and VM running-state binary sensors

use super::{Sensor, SensorKind, SensorState};
use crate::coordinator::Snapshot;

pub fn discover(entry_id: &str, snapshot: &Snapshot) -> Vec<Sensor> {
    let containers = snapshot.containers().iter().filter_map(|c| {
        let id = c.key()?;
        Some(Sensor::new(
            entry_id,
            &format!("container_{}", id),
            format!("Container {}", c.name.as_deref().unwrap_or("unknown")),
            SensorKind::Container { id: id.to_string() },
        ))
    });

    let vms = snapshot.vms().iter().filter_map(|vm| {
        let id = vm.key()?;
        Some(Sensor::new(
            entry_id,
            &format!("vm_{}", id),
            format!("VM {}", vm.name.as_deref().unwrap_or("unknown")),
            SensorKind::Vm { id: id.to_string() },
        ))
    });

    containers.chain(vms).collect()
}

pub fn container_running(snapshot: &Snapshot, id: &str) -> SensorState {
    match snapshot.containers().iter().find(|c| c.key() == Some(id)) {
        Some(container) => SensorState::new(Some(container.is_running()))
            .attr("image", container.image.as_deref())
            .attr("ports", &container.ports),
        None => SensorState::new(Some(false)),
    }
}

pub fn vm_running(snapshot: &Snapshot, id: &str) -> SensorState {
    match snapshot.vms().iter().find(|vm| vm.key() == Some(id)) {
        Some(vm) => SensorState::new(Some(vm.is_running())).attr("vcpus", vm.vcpus),
        None => SensorState::new(Some(false)),
    }
}
