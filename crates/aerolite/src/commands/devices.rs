//! Device command handlers.

use tabled::Tabled;

use aerolite_api::{DeviceReading, DeviceStatus};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::build_context;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "MODEL")]
    model: String,
    #[tabled(rename = "FIRMWARE")]
    firmware: String,
    #[tabled(rename = "SENSORS")]
    sensors: usize,
}

fn to_row(dev: &DeviceReading) -> DeviceRow {
    DeviceRow {
        id: dev.id.clone(),
        name: dev.label().to_owned(),
        status: status_str(dev.status).to_owned(),
        model: dev.model.clone().unwrap_or_else(|| "-".into()),
        firmware: dev.firmware_version.clone().unwrap_or_else(|| "-".into()),
        sensors: dev.sensors.len(),
    }
}

fn status_str(status: Option<DeviceStatus>) -> &'static str {
    match status {
        Some(DeviceStatus::Online) => "online",
        Some(DeviceStatus::Offline) => "offline",
        Some(DeviceStatus::Unknown) => "unknown",
        None => "-",
    }
}

fn detail(dev: &DeviceReading) -> String {
    let mut out = String::new();
    out.push_str(&format!("Device:   {} ({})\n", dev.label(), dev.id));
    out.push_str(&format!("Status:   {}\n", status_str(dev.status)));
    out.push_str(&format!(
        "Model:    {}\n",
        dev.model.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!(
        "Firmware: {}\n",
        dev.firmware_version.as_deref().unwrap_or("-")
    ));
    out.push_str("Sensors:\n");
    for (name, metric) in &dev.sensors {
        out.push_str(&format!(
            "  {name} ({})\n",
            metric.unit.as_deref().unwrap_or("-")
        ));
    }
    out
}

/// Find a device by id or (display) name.
pub(crate) fn find_device<'a>(
    readings: &'a [DeviceReading],
    needle: &str,
) -> Result<&'a DeviceReading, CliError> {
    readings
        .iter()
        .find(|d| d.id == needle || d.name == needle || d.label() == needle)
        .ok_or_else(|| CliError::NotFound {
            resource_type: "device".into(),
            identifier: needle.to_owned(),
            list_command: "devices list".into(),
        })
}

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = build_context(global)?;
    let readings = ctx.fetch_readings().await?;

    match args.command {
        DevicesCommand::List => {
            let rendered = global.output.list(&readings, to_row, |d| d.id.clone());
            output::emit(&rendered, global.quiet);
        }

        DevicesCommand::Get { device } => {
            let dev = find_device(&readings, &device)?;
            let rendered = global.output.single(dev, detail, |d| d.id.clone());
            output::emit(&rendered, global.quiet);
        }
    }
    Ok(())
}
