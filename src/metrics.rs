//! Prometheus Metrics Definitions
//!
//! Renders the coordinator state, the evaluated sensor readings and the
//! active health issues in Prometheus text format.
//!
//! # Metrics
//!
//! - `unraid_up` - 1 when the last refresh succeeded, 0 otherwise
//! - `unraid_category_up` - per-category fetch result of the last refresh
//!   - Labels: category
//! - `unraid_sensor_value` - numeric value of every sensor that has one
//!   - Labels: sensor, name, unit
//! - `unraid_binary_sensor_state` - binary sensors (1=on, 0=off)
//!   - Labels: sensor, name
//! - `unraid_issue_active` - one series per active health issue
//!   - Labels: issue, kind, severity
//! - `unraid_sensors_registered` - number of registered sensors
//!
//! Text-valued sensors (uptime, GPU name) have no numeric form and are only
//! available through the JSON API.
//!
//! All metrics use the `unraid_` namespace prefix.

use crate::coordinator::CoordinatorState;
use crate::issues::{Issue, Severity};
use crate::sensors::{Platform, SensorReading};
use crate::unraid::types::Category;
use prometheus::{Encoder, Gauge, GaugeVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

const NAMESPACE: &str = "unraid";

/// Metrics collector for the Unraid exporter
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    pub up: Arc<Gauge>,
    pub category_up: Arc<GaugeVec>,
    pub sensor_value: Arc<GaugeVec>,
    pub binary_sensor_state: Arc<GaugeVec>,
    pub issue_active: Arc<GaugeVec>,
    pub sensors_registered: Arc<IntGauge>,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let up = Gauge::with_opts(
            Opts::new("up", "Whether the last refresh from the agent succeeded")
                .namespace(NAMESPACE),
        )?;

        let category_up = GaugeVec::new(
            Opts::new(
                "category_up",
                "Whether the category fetch succeeded in the last refresh",
            )
            .namespace(NAMESPACE),
            &["category"],
        )?;

        let sensor_value = GaugeVec::new(
            Opts::new("sensor_value", "Current numeric value of a sensor").namespace(NAMESPACE),
            &["sensor", "name", "unit"],
        )?;

        let binary_sensor_state = GaugeVec::new(
            Opts::new(
                "binary_sensor_state",
                "Binary sensor state (1=on, 0=off)",
            )
            .namespace(NAMESPACE),
            &["sensor", "name"],
        )?;

        let issue_active = GaugeVec::new(
            Opts::new("issue_active", "Active health issue").namespace(NAMESPACE),
            &["issue", "kind", "severity"],
        )?;

        let sensors_registered = IntGauge::with_opts(
            Opts::new("sensors_registered", "Number of registered sensors").namespace(NAMESPACE),
        )?;

        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(category_up.clone()))?;
        registry.register(Box::new(sensor_value.clone()))?;
        registry.register(Box::new(binary_sensor_state.clone()))?;
        registry.register(Box::new(issue_active.clone()))?;
        registry.register(Box::new(sensors_registered.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            up: Arc::new(up),
            category_up: Arc::new(category_up),
            sensor_value: Arc::new(sensor_value),
            binary_sensor_state: Arc::new(binary_sensor_state),
            issue_active: Arc::new(issue_active),
            sensors_registered: Arc::new(sensors_registered),
        })
    }

    /// Replace all series with the given state
    pub fn publish(&self, state: &CoordinatorState, readings: &[SensorReading], issues: &[Issue]) {
        self.reset();

        self.up.set(if state.available { 1.0 } else { 0.0 });

        for category in Category::ALL {
            if let Some(ok) = state.category_ok.get(&category) {
                self.category_up
                    .with_label_values(&[category.as_str()])
                    .set(if *ok { 1.0 } else { 0.0 });
            }
        }

        for reading in readings {
            let Some(value) = reading.value.as_ref().and_then(|v| v.as_f64()) else {
                continue;
            };
            match reading.platform {
                Platform::Sensor => self
                    .sensor_value
                    .with_label_values(&[
                        reading.unique_id.as_str(),
                        reading.name.as_str(),
                        reading.unit.unwrap_or(""),
                    ])
                    .set(value),
                Platform::BinarySensor => self
                    .binary_sensor_state
                    .with_label_values(&[reading.unique_id.as_str(), reading.name.as_str()])
                    .set(value),
            }
        }

        for issue in issues {
            let severity = match issue.severity {
                Severity::Warning => "warning",
                Severity::Error => "error",
            };
            self.issue_active
                .with_label_values(&[issue.id.as_str(), issue.kind.as_str(), severity])
                .set(1.0);
        }

        self.sensors_registered.set(readings.len() as i64);
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Drop all labelled series so vanished sensors and cleared issues disappear
    pub fn reset(&self) {
        self.category_up.reset();
        self.sensor_value.reset();
        self.binary_sensor_state.reset();
        self.issue_active.reset();
    }
}
