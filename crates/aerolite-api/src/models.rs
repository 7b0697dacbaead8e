// Wire models for the Aerolite readings API.
//
// One `DeviceReading` per physical monitor, carrying every metric the
// device reported in the batched readings call. Values arrive as raw
// JSON (the cloud emits numbers, numeric strings, and occasionally
// null) -- `Metric::latest_value` is the single place that turns them
// into an `f64` or refuses to.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reported device status.
///
/// Explicit enum instead of probing for an optional field: devices that
/// omit `status` deserialize to `None` on [`DeviceReading::status`], and
/// unrecognized values collapse to [`Unknown`](DeviceStatus::Unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    #[serde(other)]
    Unknown,
}

/// One timestamped raw sample for a metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    /// Raw wire value; may be a number, a numeric string, or null.
    pub value: serde_json::Value,
}

/// One measurable quantity on a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub display_name: Option<String>,
    /// Unit string as reported; `"-"` means dimensionless (index values).
    pub unit: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

/// Failure to interpret a metric's latest sample as a number.
///
/// Recovered per-metric by the coordinator's shaping pass -- a bad value
/// on one metric never aborts a cycle.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("metric '{metric}' reported a non-numeric value: {raw}")]
    NotNumeric { metric: String, raw: String },

    #[error("metric '{metric}' reported a non-finite value")]
    NotFinite { metric: String },
}

impl Metric {
    /// The latest sample's value as `f64`.
    ///
    /// Returns `Ok(None)` when the metric has no samples or the newest
    /// sample is null. Non-numeric or non-finite values are an error.
    pub fn latest_value(&self) -> Result<Option<f64>, ValueError> {
        let Some(sample) = self.samples.iter().max_by_key(|s| s.timestamp) else {
            return Ok(None);
        };

        let value = match &sample.value {
            serde_json::Value::Null => return Ok(None),
            serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| ValueError::NotNumeric {
                metric: self.name.clone(),
                raw: n.to_string(),
            })?,
            serde_json::Value::String(s) => {
                s.parse::<f64>().map_err(|_| ValueError::NotNumeric {
                    metric: self.name.clone(),
                    raw: s.clone(),
                })?
            }
            other => {
                return Err(ValueError::NotNumeric {
                    metric: self.name.clone(),
                    raw: other.to_string(),
                });
            }
        };

        if value.is_finite() {
            Ok(Some(value))
        } else {
            Err(ValueError::NotFinite {
                metric: self.name.clone(),
            })
        }
    }

    /// Display name, falling back to the wire name.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Snapshot of one device and its latest readings.
///
/// Immutable per fetch; the batched readings endpoint returns one of
/// these per device the account can see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReading {
    pub id: String,
    pub name: String,
    pub display_name: Option<String>,
    pub status: Option<DeviceStatus>,
    pub model: Option<String>,
    pub firmware_version: Option<String>,
    /// Metrics keyed by sensor name (unique per device). Insertion
    /// order preserved as the API reported it.
    #[serde(default)]
    pub sensors: IndexMap<String, Metric>,
}

impl DeviceReading {
    /// Device label for display, falling back to the wire name.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}
