//! Metering records as returned by the telemetry service.
//!
//! These are typed, validated counterparts of the service's JSON payloads.
//! The client crate maps the wire format onto them; everything downstream
//! works with these types only.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::MeterviewError;

/// How a meter accumulates its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterType {
    /// Monotonically increasing counter (e.g. bytes read since boot).
    Cumulative,
    /// Change since the previous sample.
    Delta,
    /// Point-in-time reading.
    Gauge,
}

impl MeterType {
    /// Get the type name as used by the telemetry service.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cumulative => "cumulative",
            Self::Delta => "delta",
            Self::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MeterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeterType {
    type Err = MeterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cumulative" => Ok(Self::Cumulative),
            "delta" => Ok(Self::Delta),
            "gauge" => Ok(Self::Gauge),
            other => Err(MeterviewError::MalformedResponse(format!(
                "unknown meter type: {other}"
            ))),
        }
    }
}

/// A counter type attached to one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    /// Dotted counter name, e.g. `disk.read.bytes`.
    pub name: String,
    /// Accumulation type.
    pub meter_type: MeterType,
    /// Unit of the counter volume.
    pub unit: String,
    /// Resource the meter is attached to.
    pub resource_id: String,
    /// Owning user, if reported.
    pub user_id: Option<String>,
    /// Owning project (tenant), if reported.
    pub project_id: Option<String>,
}

/// One observation of a meter for a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Meter name.
    pub counter_name: String,
    /// Accumulation type.
    pub counter_type: MeterType,
    /// Unit of the volume.
    pub counter_unit: String,
    /// Observed value.
    pub counter_volume: f64,
    /// Observation time, truncated to whole seconds.
    pub timestamp: NaiveDateTime,
    /// Resource the sample belongs to.
    pub resource_id: String,
    /// Free-form metadata reported with the sample.
    #[serde(default)]
    pub resource_metadata: serde_json::Map<String, serde_json::Value>,
    /// Sample source.
    pub source: Option<String>,
    /// Owning user, if reported.
    pub user_id: Option<String>,
    /// Owning project, if reported.
    pub project_id: Option<String>,
}

impl Sample {
    /// Human-readable resource name from metadata (`name`, then `display_name`).
    #[must_use]
    pub fn display_name(&self) -> &str {
        metadata_name(&self.resource_metadata)
    }

    /// Instance label from metadata (`display_name`, then `instance_id`).
    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        self.resource_metadata
            .get("display_name")
            .or_else(|| self.resource_metadata.get("instance_id"))
            .and_then(serde_json::Value::as_str)
    }
}

/// Pre-aggregated summary of a meter over the query window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    /// Minimum volume.
    pub min: f64,
    /// Maximum volume.
    pub max: f64,
    /// Average volume.
    pub avg: f64,
    /// Sum of volumes.
    pub sum: f64,
    /// Number of samples.
    pub count: u64,
    /// Period length in seconds.
    #[serde(default)]
    pub period: Option<i64>,
    /// Period start.
    #[serde(default)]
    pub period_start: Option<NaiveDateTime>,
    /// Period end.
    #[serde(default)]
    pub period_end: Option<NaiveDateTime>,
    /// Covered duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    /// First sample time.
    #[serde(default)]
    pub duration_start: Option<NaiveDateTime>,
    /// Last sample time.
    #[serde(default)]
    pub duration_end: Option<NaiveDateTime>,
}

/// A metered resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier.
    pub resource_id: String,
    /// Source that reported it.
    pub source: Option<String>,
    /// Owning user.
    pub user_id: Option<String>,
    /// Owning project.
    pub project_id: Option<String>,
    /// Free-form metadata.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Resource {
    /// Human-readable name from metadata (`name`, then `display_name`).
    #[must_use]
    pub fn name(&self) -> &str {
        metadata_name(&self.metadata)
    }
}

fn metadata_name(metadata: &serde_json::Map<String, serde_json::Value>) -> &str {
    ["name", "display_name"]
        .iter()
        .filter_map(|key| metadata.get(*key).and_then(serde_json::Value::as_str))
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_with_metadata(metadata: serde_json::Value) -> Sample {
        Sample {
            counter_name: "cpu".into(),
            counter_type: MeterType::Cumulative,
            counter_unit: "ns".into(),
            counter_volume: 1.0,
            timestamp: NaiveDateTime::parse_from_str("2013-07-08T10:00:00", "%Y-%m-%dT%H:%M:%S")
                .unwrap(),
            resource_id: "res-1".into(),
            resource_metadata: metadata.as_object().cloned().unwrap_or_default(),
            source: None,
            user_id: None,
            project_id: None,
        }
    }

    #[test]
    fn meter_type_parses_service_names() {
        assert_eq!("cumulative".parse::<MeterType>().unwrap(), MeterType::Cumulative);
        assert_eq!("gauge".parse::<MeterType>().unwrap(), MeterType::Gauge);
        assert!("counter".parse::<MeterType>().is_err());
    }

    #[test]
    fn meter_type_serializes_lowercase() {
        assert_eq!(serde_json::to_value(MeterType::Delta).unwrap(), json!("delta"));
    }

    #[test]
    fn sample_name_prefers_name_over_display_name() {
        let sample = sample_with_metadata(json!({"name": "vm", "display_name": "My VM"}));
        assert_eq!(sample.display_name(), "vm");

        let sample = sample_with_metadata(json!({"display_name": "My VM"}));
        assert_eq!(sample.display_name(), "My VM");

        let sample = sample_with_metadata(json!({}));
        assert_eq!(sample.display_name(), "");
    }

    #[test]
    fn sample_instance_falls_back_to_instance_id() {
        let sample = sample_with_metadata(json!({"instance_id": "i-42"}));
        assert_eq!(sample.instance(), Some("i-42"));
        assert_eq!(sample_with_metadata(json!({})).instance(), None);
    }

    #[test]
    fn resource_name_from_metadata() {
        let resource = Resource {
            resource_id: "r".into(),
            source: None,
            user_id: None,
            project_id: None,
            metadata: json!({"display_name": "volume-1"})
                .as_object()
                .cloned()
                .unwrap(),
        };
        assert_eq!(resource.name(), "volume-1");
    }
}
