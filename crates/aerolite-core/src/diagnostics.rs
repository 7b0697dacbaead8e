// ── Diagnostics reports ──
//
// Serializable support bundles for one entry. Token material is always
// redacted and raw sample history never leaves this module; only the
// current shaped value per sensor is included.

use serde::Serialize;

use aerolite_api::DeviceStatus;

use crate::coordinator::CycleStatus;
use crate::registry::AccountEntry;
use crate::snapshot::CycleSnapshot;

const REDACTED: &str = "**REDACTED**";

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub entry: EntrySection,
    pub coordinator: CoordinatorSection,
    pub devices: Vec<DeviceSection>,
}

#[derive(Debug, Serialize)]
pub struct EntrySection {
    pub title: String,
    /// Always the redaction placeholder, kept so support bundles show
    /// that a token was present without leaking it.
    pub access_token: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CoordinatorSection {
    pub last_update_succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub update_interval_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct DeviceSection {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    pub sensors: Vec<SensorSection>,
}

#[derive(Debug, Serialize)]
pub struct SensorSection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Current shaped value, absent when the last sample was null or
    /// could not be interpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Build a redacted diagnostics report for one entry.
pub fn entry_diagnostics(entry: &AccountEntry) -> DiagnosticsReport {
    let status = entry.coordinator.status();
    let snapshot = entry.coordinator.snapshot();
    build_report(
        &entry.title,
        &status,
        entry.coordinator.scan_interval().as_secs(),
        snapshot.as_deref(),
    )
}

fn build_report(
    title: &str,
    status: &CycleStatus,
    update_interval_secs: u64,
    snapshot: Option<&CycleSnapshot>,
) -> DiagnosticsReport {
    let devices = snapshot
        .map(|snap| {
            snap.devices
                .values()
                .map(|dev| DeviceSection {
                    id: dev.device.id.clone(),
                    name: dev.device.name.clone(),
                    display_name: dev.device.display_name.clone(),
                    status: dev.device.status,
                    model: dev.device.model.clone(),
                    firmware_version: dev.device.firmware_version.clone(),
                    sensors: dev
                        .device
                        .sensors
                        .keys()
                        .map(|sensor| SensorSection {
                            name: sensor.clone(),
                            unit: dev
                                .telemetry
                                .get(sensor)
                                .and_then(|m| m.unit.clone())
                                .or_else(|| {
                                    dev.device.sensors.get(sensor).and_then(|m| m.unit.clone())
                                }),
                            value: dev.telemetry.get(sensor).map(|m| m.value),
                        })
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    DiagnosticsReport {
        entry: EntrySection {
            title: title.to_owned(),
            access_token: REDACTED,
        },
        coordinator: CoordinatorSection {
            last_update_succeeded: status.last_update_succeeded,
            last_error: status.last_error.clone(),
            update_interval_secs,
        },
        devices,
    }
}
