// ── Sensor entity projection ──
//
// Projects the coordinator's snapshot into individually addressable
// sensor entities. The entity set is fixed at the first successful
// cycle: sensors that appear only in later cycles get no entity. This
// is a known limitation carried over deliberately, not a bug.

use crate::coordinator::CycleStatus;
use crate::snapshot::CycleSnapshot;

use aerolite_api::DeviceStatus;

/// Measurement class for a known sensor name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorClass {
    Temperature,
    Humidity,
    Pm1,
    Pm25,
    Pm10,
    CarbonDioxide,
    AirQualityIndex,
}

/// Map a wire sensor name to its measurement class.
///
/// `pm4` has no class of its own and reports as PM10; `voc` and `nox`
/// are unit-less indexes.
pub fn sensor_class(sensor_name: &str) -> Option<SensorClass> {
    match sensor_name {
        "temperature" => Some(SensorClass::Temperature),
        "humidity" => Some(SensorClass::Humidity),
        "pm1" => Some(SensorClass::Pm1),
        "pm2p5" => Some(SensorClass::Pm25),
        "pm4" | "pm10" => Some(SensorClass::Pm10),
        "co2" => Some(SensorClass::CarbonDioxide),
        "voc" | "nox" => Some(SensorClass::AirQualityIndex),
        _ => None,
    }
}

/// One addressable (device, sensor) pair.
#[derive(Debug, Clone)]
pub struct SensorEntity {
    pub device_id: String,
    pub sensor_name: String,
    /// Stable identifier: `aerolite_{device_id}_{sensor_name}`.
    pub unique_id: String,
    /// Display name: device label + metric display name.
    pub name: String,
    /// Unit of measurement; the wire's `"-"` (dimensionless) maps to `None`.
    pub unit: Option<String>,
    pub device_class: Option<SensorClass>,
    pub description: Option<String>,
}

impl SensorEntity {
    /// Current value from the latest snapshot, or `None` when the
    /// device or sensor is absent.
    pub fn value(&self, snapshot: &CycleSnapshot) -> Option<f64> {
        snapshot.value(&self.device_id, &self.sensor_name)
    }

    /// Availability: the last cycle succeeded, the device is still in
    /// the snapshot, and it is not reporting itself offline.
    pub fn is_available(&self, status: &CycleStatus, snapshot: &CycleSnapshot) -> bool {
        if !status.last_update_succeeded {
            return false;
        }

        match snapshot.device(&self.device_id) {
            None => false,
            Some(device) => device.device.status != Some(DeviceStatus::Offline),
        }
    }
}

/// Build the entity set from the first successful cycle.
///
/// One entity per (device, sensor) pair present in the snapshot's
/// telemetry. Deterministic order: devices and sensors sort by key.
pub fn project_entities(snapshot: &CycleSnapshot) -> Vec<SensorEntity> {
    let mut entities = Vec::new();

    for (device_id, device_snapshot) in &snapshot.devices {
        let device_label = device_snapshot.device.label();

        for (sensor_name, metric) in &device_snapshot.telemetry {
            // Index sensors report "-"; treat that as unit-less.
            let unit = metric
                .unit
                .as_deref()
                .filter(|u| *u != "-")
                .map(str::to_owned);

            entities.push(SensorEntity {
                device_id: device_id.clone(),
                sensor_name: sensor_name.clone(),
                unique_id: format!("aerolite_{device_id}_{sensor_name}"),
                name: format!("{device_label} {}", metric.display_name),
                unit,
                device_class: sensor_class(sensor_name),
                description: metric.description.clone(),
            });
        }
    }

    entities
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::snapshot::shape_cycle;
    use crate::snapshot::tests::{device, metric};

    fn first_cycle() -> CycleSnapshot {
        shape_cycle(vec![device(
            "d1",
            vec![
                metric("temperature", Some("°C"), json!(21.5)),
                metric("voc", Some("-"), json!(3)),
            ],
        )])
    }

    fn ok_status() -> CycleStatus {
        CycleStatus {
            last_update_succeeded: true,
            last_error: None,
            last_success_at: None,
        }
    }

    #[test]
    fn one_entity_per_device_sensor_pair() {
        let entities = project_entities(&first_cycle());

        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].unique_id, "aerolite_d1_temperature");
        assert_eq!(entities[0].name, "d1-name Temperature");
        assert_eq!(entities[1].unique_id, "aerolite_d1_voc");
    }

    #[test]
    fn dash_unit_means_no_unit() {
        let entities = project_entities(&first_cycle());

        let temp = entities
            .iter()
            .find(|e| e.sensor_name == "temperature")
            .unwrap();
        assert_eq!(temp.unit.as_deref(), Some("°C"));

        let voc = entities.iter().find(|e| e.sensor_name == "voc").unwrap();
        assert_eq!(voc.unit, None);
        assert_eq!(voc.device_class, Some(SensorClass::AirQualityIndex));
    }

    #[test]
    fn late_appearing_sensors_get_no_entity() {
        let entities = project_entities(&first_cycle());

        // A later cycle adds a co2 sensor; the entity set is fixed.
        let later = shape_cycle(vec![device(
            "d1",
            vec![
                metric("temperature", Some("°C"), json!(22.0)),
                metric("co2", Some("ppm"), json!(600)),
            ],
        )]);

        assert!(!entities.iter().any(|e| e.sensor_name == "co2"));
        let temp = entities
            .iter()
            .find(|e| e.sensor_name == "temperature")
            .unwrap();
        assert_eq!(temp.value(&later), Some(22.0));
    }

    #[test]
    fn value_none_when_sensor_missing_from_cycle() {
        let entities = project_entities(&first_cycle());
        let voc = entities.iter().find(|e| e.sensor_name == "voc").unwrap();

        let without_voc = shape_cycle(vec![device(
            "d1",
            vec![metric("temperature", Some("°C"), json!(20.0))],
        )]);
        assert_eq!(voc.value(&without_voc), None);
    }

    #[test]
    fn unavailable_after_failed_cycle() {
        let snapshot = first_cycle();
        let entities = project_entities(&snapshot);

        let failed = CycleStatus {
            last_update_succeeded: false,
            last_error: Some("HTTP 503".into()),
            last_success_at: None,
        };
        assert!(!entities[0].is_available(&failed, &snapshot));
        assert!(entities[0].is_available(&ok_status(), &snapshot));
    }

    #[test]
    fn unavailable_when_device_leaves_snapshot() {
        let entities = project_entities(&first_cycle());

        let empty = shape_cycle(Vec::new());
        assert!(!entities[0].is_available(&ok_status(), &empty));
    }

    #[test]
    fn unavailable_when_device_reports_offline() {
        let mut reading = device("d1", vec![metric("temperature", Some("°C"), json!(20.0))]);
        reading.status = Some(aerolite_api::DeviceStatus::Offline);
        let snapshot = shape_cycle(vec![reading]);

        let entities = project_entities(&snapshot);
        assert!(!entities[0].is_available(&ok_status(), &snapshot));
    }

    #[test]
    fn sensor_class_table() {
        assert_eq!(sensor_class("pm2p5"), Some(SensorClass::Pm25));
        assert_eq!(sensor_class("pm4"), Some(SensorClass::Pm10));
        assert_eq!(sensor_class("nox"), Some(SensorClass::AirQualityIndex));
        assert_eq!(sensor_class("mystery"), None);
    }
}
