// ── Cycle snapshot ──
//
// The coordinator's published output: one fully-rebuilt mapping per
// successful cycle, replaced wholesale. Never merged incrementally.
// BTreeMap keys make two shapes of identical upstream data compare
// equal regardless of device order on the wire.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use aerolite_api::DeviceReading;

/// One shaped metric value with its display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricValue {
    pub value: f64,
    pub display_name: String,
    /// Unit as reported; `"-"` (dimensionless) is preserved here and
    /// mapped to "no unit" at the entity boundary.
    pub unit: Option<String>,
    pub description: Option<String>,
}

/// One device with its shaped telemetry.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub device: Arc<DeviceReading>,
    /// Sensor name -> shaped value. Every key here had a non-null
    /// latest value at fetch time; metrics that errored while shaping
    /// are absent, never half-populated.
    pub telemetry: BTreeMap<String, MetricValue>,
}

/// The published result of one successful cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleSnapshot {
    pub devices: BTreeMap<String, DeviceSnapshot>,
}

impl CycleSnapshot {
    pub fn device(&self, device_id: &str) -> Option<&DeviceSnapshot> {
        self.devices.get(device_id)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Current value for one (device, sensor) pair.
    pub fn value(&self, device_id: &str, sensor_name: &str) -> Option<f64> {
        self.devices
            .get(device_id)?
            .telemetry
            .get(sensor_name)
            .map(|m| m.value)
    }
}

/// Shape one cycle's readings into a [`CycleSnapshot`].
///
/// Per-metric failures are contained: a metric whose latest value
/// cannot be read is skipped with a debug log, and its siblings on the
/// same device are unaffected. Metrics whose latest value is null are
/// simply omitted.
pub fn shape_cycle(readings: Vec<DeviceReading>) -> CycleSnapshot {
    let mut devices = BTreeMap::new();

    for reading in readings {
        let mut telemetry = BTreeMap::new();

        for (sensor_name, metric) in &reading.sensors {
            match metric.latest_value() {
                Ok(Some(value)) => {
                    telemetry.insert(
                        sensor_name.clone(),
                        MetricValue {
                            value,
                            display_name: metric.label().to_owned(),
                            unit: metric.unit.clone(),
                            description: metric.description.clone(),
                        },
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    // One bad metric must never break the whole update.
                    debug!(
                        device = %reading.id,
                        sensor = %sensor_name,
                        error = %err,
                        "failed to shape sensor value"
                    );
                }
            }
        }

        devices.insert(
            reading.id.clone(),
            DeviceSnapshot {
                device: Arc::new(reading),
                telemetry,
            },
        );
    }

    CycleSnapshot { devices }
}
