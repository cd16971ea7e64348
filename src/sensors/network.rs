//! Network interface sensors.
//!
//! Only physical interfaces get entities. The RX/TX value is the cumulative
//! byte counter multiplied by 8, which existing dashboards expect; the true
//! bits-per-second rate and the raw counter are exposed as attributes.

use super::derive::{bytes_to_bits, is_physical_interface, RateTracker};
use super::{Sensor, SensorKind, SensorState};
use crate::coordinator::Snapshot;
use crate::unraid::types::{Category, NetworkInterface};

pub const UNIT_BITS_PER_SECOND: &str = "bit/s";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    fn counter(self, interface: &NetworkInterface) -> Option<u64> {
        match self {
            Self::Inbound => interface.bytes_received,
            Self::Outbound => interface.bytes_sent,
        }
    }

    fn counter_attribute(self) -> &'static str {
        match self {
            Self::Inbound => "bytes_received",
            Self::Outbound => "bytes_sent",
        }
    }
}

pub fn discover(entry_id: &str, snapshot: &Snapshot) -> Vec<Sensor> {
    let mut sensors = Vec::new();

    for interface in snapshot.network() {
        let name = interface.name.as_str();
        if !is_physical_interface(name) {
            continue;
        }

        sensors.push(
            Sensor::new(
                entry_id,
                &format!("network_{}_rx", name),
                format!("Network {} Inbound", name),
                SensorKind::NetworkRx {
                    interface: name.to_string(),
                    tracker: RateTracker::new(),
                },
            )
            .with_unit(UNIT_BITS_PER_SECOND),
        );
        sensors.push(
            Sensor::new(
                entry_id,
                &format!("network_{}_tx", name),
                format!("Network {} Outbound", name),
                SensorKind::NetworkTx {
                    interface: name.to_string(),
                    tracker: RateTracker::new(),
                },
            )
            .with_unit(UNIT_BITS_PER_SECOND),
        );
        sensors.push(Sensor::new(
            entry_id,
            &format!("network_{}", name),
            format!("Network {}", name),
            SensorKind::NetworkLink {
                interface: name.to_string(),
            },
        ));
    }

    sensors
}

fn find<'a>(snapshot: &'a Snapshot, name: &str) -> Option<&'a NetworkInterface> {
    snapshot.network().iter().find(|i| i.name == name)
}

pub fn traffic(
    snapshot: &Snapshot,
    name: &str,
    direction: Direction,
    tracker: &mut RateTracker,
) -> SensorState {
    let Some(interface) = find(snapshot, name) else {
        return SensorState::unavailable();
    };

    let counter = direction.counter(interface);
    let rate = match (counter, snapshot.fetched_at(Category::Network)) {
        (Some(counter), Some(at)) => tracker.observe(counter, at),
        _ => None,
    };

    SensorState::new(counter.map(bytes_to_bits))
        .attr("mac_address", interface.mac_address.as_deref())
        .attr("ip_address", interface.ip_address.as_deref())
        .attr("speed", interface.speed.as_ref())
        .attr("status", interface.status.as_deref())
        .attr("interface", name)
        .attr_opt(direction.counter_attribute(), counter)
        .attr_opt("rate_bps", rate)
}

pub fn link_up(snapshot: &Snapshot, name: &str) -> SensorState {
    let up = find(snapshot, name).and_then(|i| i.up).unwrap_or(false);
    SensorState::new(Some(up))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SensorValue;
    use crate::unraid::types::CategoryUpdate;
    use serde_json::json;
    use std::time::{Duration, Instant};

    fn interface(name: &str, rx: u64) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            bytes_received: Some(rx),
            bytes_sent: Some(0),
            up: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_only_physical_interfaces_discovered() {
        let mut snapshot = Snapshot::default();
        snapshot.apply(CategoryUpdate::Network(vec![
            interface("eth0", 0),
            interface("veth1a2b", 0),
            interface("docker0", 0),
        ]));

        let ids: Vec<_> = discover("e", &snapshot)
            .into_iter()
            .map(|s| s.unique_id)
            .collect();
        assert_eq!(ids, vec!["e_network_eth0_rx", "e_network_eth0_tx", "e_network_eth0"]);
    }

    #[test]
    fn test_rx_value_is_counter_in_bits() {
        let mut snapshot = Snapshot::default();
        snapshot.apply(CategoryUpdate::Network(vec![interface("eth0", 1000)]));

        let mut tracker = RateTracker::new();
        let state = traffic(&snapshot, "eth0", Direction::Inbound, &mut tracker);
        assert_eq!(state.value, Some(SensorValue::Float(8000.0)));
        assert_eq!(state.attributes["bytes_received"], json!(1000));
        assert!(!state.attributes.contains_key("rate_bps"));
    }

    #[test]
    fn test_rate_attribute_from_consecutive_samples() {
        let start = Instant::now();
        let mut tracker = RateTracker::new();

        let mut snapshot = Snapshot::default();
        snapshot.apply_at(CategoryUpdate::Network(vec![interface("eth0", 1000)]), start);
        traffic(&snapshot, "eth0", Direction::Inbound, &mut tracker);

        snapshot.apply_at(
            CategoryUpdate::Network(vec![interface("eth0", 3000)]),
            start + Duration::from_secs(2),
        );
        let state = traffic(&snapshot, "eth0", Direction::Inbound, &mut tracker);
        assert_eq!(state.attributes["rate_bps"], json!(8000.0));
    }

    #[test]
    fn test_link_state() {
        let mut snapshot = Snapshot::default();
        snapshot.apply(CategoryUpdate::Network(vec![interface("eth0", 0)]));
        assert_eq!(link_up(&snapshot, "eth0").value, Some(SensorValue::Bool(true)));
        assert_eq!(link_up(&snapshot, "eth1").value, Some(SensorValue::Bool(false)));
    }
}
