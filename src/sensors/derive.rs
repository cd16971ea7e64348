//! Derived Values
//!
//! Pure helpers shared by the sensor projections, plus the two small pieces of
//! per-sensor state: [`DiskUsageCell`] (spin-state freeze) and
//! [`RateTracker`] (counter-to-rate conversion).

use crate::unraid::types::Disk;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Instant;

const SECONDS_PER_YEAR: u64 = 31_536_000;
const SECONDS_PER_MONTH: u64 = 2_592_000;
const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

static PHYSICAL_INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:eth\d+|wlan\d+|bond\d+|eno\d+|enp\d+s\d+)$")
        .expect("physical interface pattern is valid")
});

/// Format uptime seconds as e.g. `"1 day, 1 hour, 1 minute, 1 second"`.
///
/// Years and months are fixed 365 and 30 day spans. Zero components are
/// omitted; seconds are shown whenever nothing else is.
pub fn format_uptime(seconds: Option<u64>) -> String {
    let Some(seconds) = seconds else {
        return "Unknown".to_string();
    };

    let mut remainder = seconds;
    let mut take = |span: u64| {
        let count = remainder / span;
        remainder %= span;
        count
    };

    let components = [
        (take(SECONDS_PER_YEAR), "year"),
        (take(SECONDS_PER_MONTH), "month"),
        (take(SECONDS_PER_DAY), "day"),
        (take(SECONDS_PER_HOUR), "hour"),
        (take(SECONDS_PER_MINUTE), "minute"),
    ];

    let mut parts: Vec<String> = components
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, unit)| plural(*count, unit))
        .collect();

    if remainder > 0 || parts.is_empty() {
        parts.push(plural(remainder, "second"));
    }

    parts.join(", ")
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// True for hardware-backed interfaces (`eth0`, `wlan0`, `bond1`, `eno1`, `enp2s0`)
pub fn is_physical_interface(name: &str) -> bool {
    PHYSICAL_INTERFACE.is_match(name)
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Byte count rendered as `"X.XX GB"` (binary gigabytes)
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / BYTES_PER_GIB)
}

pub fn bytes_to_bits(bytes: u64) -> f64 {
    bytes as f64 * 8.0
}

/// Usage percent as reported, or derived from used/size when absent
pub fn usage_percent(disk: &Disk) -> Option<f64> {
    if let Some(percent) = disk.usage_percent {
        return Some(percent);
    }
    match (disk.size_bytes, disk.used_bytes) {
        (Some(size), Some(used)) if size > 0 && used > 0 => {
            Some(used as f64 / size as f64 * 100.0)
        }
        _ => None,
    }
}

/// Last known usage percent of one disk.
///
/// Spun-down disks report zeroed or stale figures, so the cell only accepts
/// new values while the disk is active and otherwise keeps what it has.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskUsageCell {
    last_known: Option<f64>,
}

impl DiskUsageCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: f64) -> Self {
        Self {
            last_known: Some(value),
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.last_known
    }

    /// Feed the disk's current record (or `None` when it is missing from the
    /// snapshot) and return the value to display.
    pub fn observe(&mut self, disk: Option<&Disk>) -> Option<f64> {
        let Some(disk) = disk else {
            return self.last_known;
        };

        if disk.spin_state().is_spun_down() {
            return self.last_known;
        }

        if let Some(percent) = usage_percent(disk) {
            self.last_known = Some(round1(percent));
        }
        self.last_known
    }
}

/// Turns a cumulative byte counter into bits per second.
///
/// Samples are keyed by the time their category was fetched; evaluating the
/// same sample twice returns the previously computed rate.
#[derive(Debug, Clone, Default)]
pub struct RateTracker {
    last: Option<(u64, Instant)>,
    rate: Option<f64>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rate(&self) -> Option<f64> {
        self.rate
    }

    pub fn observe(&mut self, counter: u64, at: Instant) -> Option<f64> {
        match self.last {
            Some((_, prev_at)) if prev_at == at => return self.rate,
            Some((prev, prev_at)) if at > prev_at => {
                let elapsed = at.duration_since(prev_at).as_secs_f64();
                // Counter went backwards: interface reset or agent restart
                self.rate = counter
                    .checked_sub(prev)
                    .map(|delta| round1(bytes_to_bits(delta) / elapsed));
            }
            _ => self.rate = None,
        }
        self.last = Some((counter, at));
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unraid::types::SpinState;
    use std::time::Duration;

    fn active_disk(usage: Option<f64>) -> Disk {
        Disk {
            id: Some("disk1".to_string()),
            usage_percent: usage,
            spin_state: Some(SpinState::Active),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_uptime_examples() {
        assert_eq!(
            format_uptime(Some(90061)),
            "1 day, 1 hour, 1 minute, 1 second"
        );
        assert_eq!(format_uptime(Some(45)), "45 seconds");
        assert_eq!(format_uptime(Some(0)), "0 seconds");
        assert_eq!(format_uptime(None), "Unknown");
    }

    #[test]
    fn test_format_uptime_omits_zero_components() {
        assert_eq!(format_uptime(Some(3600)), "1 hour");
        assert_eq!(format_uptime(Some(7260)), "2 hours, 1 minute");
        assert_eq!(
            format_uptime(Some(SECONDS_PER_YEAR + 2 * SECONDS_PER_MONTH)),
            "1 year, 2 months"
        );
    }

    #[test]
    fn test_physical_interfaces() {
        for name in ["eth0", "eth12", "wlan0", "bond1", "eno1", "enp2s0"] {
            assert!(is_physical_interface(name), "{} should be physical", name);
        }
        for name in ["veth0", "br-123", "docker0", "virbr0", "lo", "eth", "enp2", "eth0.100"] {
            assert!(!is_physical_interface(name), "{} should be virtual", name);
        }
    }

    #[test]
    fn test_usage_derived_from_bytes() {
        let disk = Disk {
            size_bytes: Some(100),
            used_bytes: Some(50),
            ..Default::default()
        };
        assert_eq!(usage_percent(&disk), Some(50.0));

        let empty = Disk {
            size_bytes: Some(100),
            used_bytes: Some(0),
            ..Default::default()
        };
        assert_eq!(usage_percent(&empty), None);
    }

    #[test]
    fn test_freeze_holds_through_standby_and_absence() {
        let mut cell = DiskUsageCell::new();
        assert_eq!(cell.observe(Some(&active_disk(Some(42.0)))), Some(42.0));

        let standby = Disk {
            spin_state: Some(SpinState::Standby),
            usage_percent: Some(0.0),
            ..active_disk(None)
        };
        assert_eq!(cell.observe(Some(&standby)), Some(42.0));
        assert_eq!(cell.observe(None), Some(42.0));
        assert_eq!(cell.value(), Some(42.0));
    }

    #[test]
    fn test_freeze_rounds_to_one_decimal() {
        let mut cell = DiskUsageCell::new();
        assert_eq!(cell.observe(Some(&active_disk(Some(33.333)))), Some(33.3));
    }

    #[test]
    fn test_active_disk_without_figures_keeps_value() {
        let mut cell = DiskUsageCell::with_value(12.5);
        assert_eq!(cell.observe(Some(&active_disk(None))), Some(12.5));
    }

    #[test]
    fn test_rate_tracker() {
        let start = Instant::now();
        let mut tracker = RateTracker::new();

        assert_eq!(tracker.observe(1_000, start), None);
        let later = start + Duration::from_secs(10);
        assert_eq!(tracker.observe(11_000, later), Some(8_000.0));
        // Same sample evaluated again
        assert_eq!(tracker.observe(11_000, later), Some(8_000.0));
        // Counter reset
        let reset = later + Duration::from_secs(10);
        assert_eq!(tracker.observe(500, reset), None);
    }
}
