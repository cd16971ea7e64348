//! Health Issues
//!
//! Problems worth surfacing to an operator, recomputed from the coordinator
//! state after every refresh. An issue is active while its condition holds
//! and disappears once it clears.
//!
//! # Checks
//!
//! - Connection: the last refresh failed
//! - Disk SMART errors: `smart_errors > 0`
//! - Disk temperature: above [`DISK_TEMPERATURE_LIMIT`]
//! - Parity invalid: the array reports `parity_valid == false`
//! - Parity check stuck: running with sync progress strictly between 95% and 100%

use crate::config::UnraidConfig;
use crate::coordinator::CoordinatorState;
use serde::Serialize;
use std::collections::BTreeMap;

/// Disk temperature above which an issue is raised (°C)
pub const DISK_TEMPERATURE_LIMIT: f64 = 50.0;

const PARITY_STUCK_LOWER: f64 = 95.0;
const PARITY_STUCK_UPPER: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ConnectionFailed,
    DiskSmartErrors,
    DiskHighTemperature,
    ArrayParityInvalid,
    ParityCheckStuck,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionFailed => "connection_failed",
            Self::DiskSmartErrors => "disk_smart_errors",
            Self::DiskHighTemperature => "disk_high_temperature",
            Self::ArrayParityInvalid => "array_parity_invalid",
            Self::ParityCheckStuck => "parity_check_stuck",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::ConnectionFailed | Self::ArrayParityInvalid => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub id: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub details: BTreeMap<&'static str, String>,
}

impl Issue {
    fn new(id: String, kind: IssueKind) -> Self {
        Self {
            id,
            kind,
            severity: kind.severity(),
            details: BTreeMap::new(),
        }
    }

    fn detail(mut self, key: &'static str, value: impl ToString) -> Self {
        self.details.insert(key, value.to_string());
        self
    }
}

/// Evaluate every check against the latest coordinator state
pub fn detect_issues(
    entry_id: &str,
    config: &UnraidConfig,
    state: &CoordinatorState,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    // Nothing has been fetched yet
    if state.last_refresh.is_none() {
        return issues;
    }

    if !state.available {
        issues.push(
            Issue::new(format!("connection_{}", entry_id), IssueKind::ConnectionFailed)
                .detail("host", &config.host)
                .detail("port", config.port)
                .detail(
                    "error",
                    state.last_error.as_deref().unwrap_or("Unknown error"),
                ),
        );
    }

    let snapshot = &state.snapshot;

    for disk in snapshot.disks() {
        let disk_id = disk.key().unwrap_or("unknown");
        let smart_errors = disk.smart_errors.unwrap_or(0);

        if smart_errors > 0 {
            issues.push(
                Issue::new(
                    format!("disk_health_{}_smart_errors", disk_id),
                    IssueKind::DiskSmartErrors,
                )
                .detail("disk_name", disk.display_name())
                .detail("smart_errors", smart_errors)
                .detail(
                    "smart_status",
                    disk.smart_status.as_deref().unwrap_or("UNKNOWN"),
                ),
            );
        }

        if let Some(temperature) = disk
            .temperature_celsius
            .filter(|t| *t > DISK_TEMPERATURE_LIMIT)
        {
            issues.push(
                Issue::new(
                    format!("disk_health_{}_high_temp", disk_id),
                    IssueKind::DiskHighTemperature,
                )
                .detail("disk_name", disk.display_name())
                .detail("temperature", temperature),
            );
        }
    }

    if let Some(array) = snapshot.array.as_ref() {
        if !array.parity_valid.unwrap_or(true) {
            issues.push(
                Issue::new(
                    format!("array_parity_invalid_{}", entry_id),
                    IssueKind::ArrayParityInvalid,
                )
                .detail("array_state", array.state.as_deref().unwrap_or("Unknown")),
            );
        }

        let sync_percent = array.sync_percent.unwrap_or(0.0);
        if array.parity_check_running.unwrap_or(false)
            && sync_percent > PARITY_STUCK_LOWER
            && sync_percent < PARITY_STUCK_UPPER
        {
            issues.push(
                Issue::new(
                    format!("parity_check_stuck_{}", entry_id),
                    IssueKind::ParityCheckStuck,
                )
                .detail("sync_percent", sync_percent),
            );
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unraid::types::*;
    use std::time::Instant;

    fn state() -> CoordinatorState {
        CoordinatorState {
            available: true,
            last_refresh: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn config() -> UnraidConfig {
        UnraidConfig::new("tower.local", 8043)
    }

    #[test]
    fn test_no_issues_before_first_refresh() {
        let state = CoordinatorState::default();
        assert!(detect_issues("e", &config(), &state).is_empty());
    }

    #[test]
    fn test_connection_issue() {
        let mut state = state();
        state.available = false;
        state.last_error = Some("system: Timeout connecting to x".to_string());

        let issues = detect_issues("e", &config(), &state);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].id, "connection_e");
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[0].details["port"], "8043");
    }

    #[test]
    fn test_disk_issues() {
        let mut state = state();
        state.snapshot.apply(CategoryUpdate::Disks(vec![
            Disk {
                id: Some("disk1".to_string()),
                smart_errors: Some(3),
                temperature_celsius: Some(55.0),
                ..Default::default()
            },
            Disk {
                id: Some("disk2".to_string()),
                temperature_celsius: Some(50.0),
                ..Default::default()
            },
        ]));

        let ids: Vec<_> = detect_issues("e", &config(), &state)
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(
            ids,
            vec!["disk_health_disk1_smart_errors", "disk_health_disk1_high_temp"]
        );
    }

    #[test]
    fn test_parity_issues() {
        let mut state = state();
        state.snapshot.apply(CategoryUpdate::Array(ArrayStatus {
            parity_valid: Some(false),
            parity_check_running: Some(true),
            sync_percent: Some(97.5),
            ..Default::default()
        }));

        let kinds: Vec<_> = detect_issues("e", &config(), &state)
            .into_iter()
            .map(|i| i.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![IssueKind::ArrayParityInvalid, IssueKind::ParityCheckStuck]
        );
    }

    #[test]
    fn test_parity_check_at_100_is_not_stuck() {
        let mut state = state();
        state.snapshot.apply(CategoryUpdate::Array(ArrayStatus {
            parity_check_running: Some(true),
            sync_percent: Some(100.0),
            ..Default::default()
        }));
        assert!(detect_issues("e", &config(), &state).is_empty());
    }
}
