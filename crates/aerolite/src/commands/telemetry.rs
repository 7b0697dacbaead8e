//! Telemetry command handler: current shaped values per sensor.

use serde::Serialize;
use tabled::Tabled;

use aerolite_core::{CycleSnapshot, shape_cycle};

use crate::cli::{GlobalOpts, TelemetryArgs};
use crate::error::CliError;
use crate::output;

use super::build_context;

#[derive(Debug, Serialize)]
pub(crate) struct TelemetryEntry {
    device_id: String,
    device: String,
    sensor: String,
    value: Option<f64>,
    unit: Option<String>,
}

#[derive(Tabled)]
struct TelemetryRow {
    #[tabled(rename = "DEVICE")]
    device: String,
    #[tabled(rename = "SENSOR")]
    sensor: String,
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "UNIT")]
    unit: String,
}

fn to_row(entry: &TelemetryEntry) -> TelemetryRow {
    TelemetryRow {
        device: entry.device.clone(),
        sensor: entry.sensor.clone(),
        value: entry
            .value
            .map_or_else(|| "-".into(), |v| format!("{v}")),
        unit: entry.unit.clone().unwrap_or_else(|| "-".into()),
    }
}

/// Flatten a snapshot into one row per sensor, in stable device order.
/// Sensors whose latest sample was unusable get a row with no value.
pub(crate) fn flatten(snapshot: &CycleSnapshot, device: Option<&str>) -> Vec<TelemetryEntry> {
    let mut entries = Vec::new();
    for (device_id, dev) in &snapshot.devices {
        if let Some(filter) = device {
            let matches =
                device_id == filter || dev.device.name == filter || dev.device.label() == filter;
            if !matches {
                continue;
            }
        }
        for sensor in dev.device.sensors.keys() {
            let shaped = dev.telemetry.get(sensor);
            entries.push(TelemetryEntry {
                device_id: device_id.clone(),
                device: dev.device.label().to_owned(),
                sensor: sensor.clone(),
                value: shaped.map(|m| m.value),
                unit: shaped
                    .and_then(|m| m.unit.clone())
                    .or_else(|| dev.device.sensors.get(sensor).and_then(|m| m.unit.clone())),
            });
        }
    }
    entries
}

pub async fn handle(args: TelemetryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = build_context(global)?;
    let readings = ctx.fetch_readings().await?;

    if let Some(ref needle) = args.device {
        // Fail early with a not-found error instead of an empty table.
        super::devices::find_device(&readings, needle)?;
    }

    let snapshot = shape_cycle(readings);
    let entries = flatten(&snapshot, args.device.as_deref());

    let rendered = global.output.list(&entries, to_row, |e| {
        format!("{}/{}", e.device_id, e.sensor)
    });
    output::emit(&rendered, global.quiet);
    Ok(())
}
