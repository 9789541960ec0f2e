//! Wire formats of the metering and identity APIs.
//!
//! Every field is optional here; `TryFrom` impls check what the dashboard
//! actually needs and reject records without it.

use serde::Deserialize;

use meterview_core::series::parse_timestamp;
use meterview_core::{Meter, MeterType, Resource, Sample, Statistic};

use crate::api::IdentityRecord;
use crate::error::ClientError;

type JsonMap = serde_json::Map<String, serde_json::Value>;

fn required<T>(value: Option<T>, record: &str, field: &str) -> Result<T, ClientError> {
    value.ok_or_else(|| ClientError::MalformedResponse(format!("{record} without {field}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireMeter {
    name: Option<String>,
    #[serde(rename = "type")]
    meter_type: Option<String>,
    unit: Option<String>,
    resource_id: Option<String>,
    user_id: Option<String>,
    project_id: Option<String>,
}

impl TryFrom<WireMeter> for Meter {
    type Error = ClientError;

    fn try_from(wire: WireMeter) -> Result<Self, Self::Error> {
        Ok(Self {
            name: required(wire.name, "meter", "name")?,
            meter_type: required(wire.meter_type, "meter", "type")?.parse()?,
            unit: wire.unit.unwrap_or_default(),
            resource_id: required(wire.resource_id, "meter", "resource_id")?,
            user_id: non_empty(wire.user_id),
            project_id: non_empty(wire.project_id),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSample {
    counter_name: Option<String>,
    counter_type: Option<String>,
    counter_unit: Option<String>,
    counter_volume: Option<f64>,
    timestamp: Option<String>,
    resource_id: Option<String>,
    resource_metadata: Option<JsonMap>,
    source: Option<String>,
    user_id: Option<String>,
    project_id: Option<String>,
}

impl TryFrom<WireSample> for Sample {
    type Error = ClientError;

    fn try_from(wire: WireSample) -> Result<Self, Self::Error> {
        let counter_type: MeterType = required(wire.counter_type, "sample", "counter_type")?.parse()?;
        let timestamp = parse_timestamp(&required(wire.timestamp, "sample", "timestamp")?)?;

        Ok(Self {
            counter_name: required(wire.counter_name, "sample", "counter_name")?,
            counter_type,
            counter_unit: wire.counter_unit.unwrap_or_default(),
            counter_volume: required(wire.counter_volume, "sample", "counter_volume")?,
            timestamp,
            resource_id: required(wire.resource_id, "sample", "resource_id")?,
            resource_metadata: wire.resource_metadata.unwrap_or_default(),
            source: wire.source,
            user_id: non_empty(wire.user_id),
            project_id: non_empty(wire.project_id),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireStatistic {
    min: Option<f64>,
    max: Option<f64>,
    avg: Option<f64>,
    sum: Option<f64>,
    count: Option<u64>,
    period: Option<i64>,
    period_start: Option<String>,
    period_end: Option<String>,
    duration: Option<f64>,
    duration_start: Option<String>,
    duration_end: Option<String>,
}

fn optional_timestamp(value: Option<String>) -> Result<Option<chrono::NaiveDateTime>, ClientError> {
    value
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(ClientError::from)
}

impl TryFrom<WireStatistic> for Statistic {
    type Error = ClientError;

    fn try_from(wire: WireStatistic) -> Result<Self, Self::Error> {
        Ok(Self {
            min: wire.min.unwrap_or_default(),
            max: required(wire.max, "statistic", "max")?,
            avg: wire.avg.unwrap_or_default(),
            sum: wire.sum.unwrap_or_default(),
            count: wire.count.unwrap_or_default(),
            period: wire.period,
            period_start: optional_timestamp(wire.period_start)?,
            period_end: optional_timestamp(wire.period_end)?,
            duration: wire.duration,
            duration_start: optional_timestamp(wire.duration_start)?,
            duration_end: optional_timestamp(wire.duration_end)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResource {
    resource_id: Option<String>,
    source: Option<String>,
    user_id: Option<String>,
    project_id: Option<String>,
    metadata: Option<JsonMap>,
}

impl TryFrom<WireResource> for Resource {
    type Error = ClientError;

    fn try_from(wire: WireResource) -> Result<Self, Self::Error> {
        Ok(Self {
            resource_id: required(wire.resource_id, "resource", "resource_id")?,
            source: wire.source,
            user_id: non_empty(wire.user_id),
            project_id: non_empty(wire.project_id),
            metadata: wire.metadata.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireIdentity {
    id: Option<String>,
    name: Option<String>,
}

impl TryFrom<WireIdentity> for IdentityRecord {
    type Error = ClientError;

    fn try_from(wire: WireIdentity) -> Result<Self, Self::Error> {
        let id = required(wire.id, "identity record", "id")?;
        let name = wire.name.unwrap_or_else(|| id.clone());
        Ok(Self { id, name })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    #[serde(default)]
    pub users: Vec<WireIdentity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsResponse {
    #[serde(default)]
    pub projects: Vec<WireIdentity>,
}

/// Validate every wire record, failing on the first bad one.
pub(crate) fn convert_all<W, T>(records: Vec<W>) -> Result<Vec<T>, ClientError>
where
    T: TryFrom<W, Error = ClientError>,
{
    records.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode<W: serde::de::DeserializeOwned>(value: serde_json::Value) -> W {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn meter_requires_name_and_type() {
        let wire: WireMeter = decode(json!({
            "name": "disk.read.bytes",
            "type": "cumulative",
            "unit": "B",
            "resource_id": "vm-1",
            "user_id": "u1",
            "project_id": ""
        }));
        let meter = Meter::try_from(wire).unwrap();
        assert_eq!(meter.meter_type, MeterType::Cumulative);
        assert_eq!(meter.user_id.as_deref(), Some("u1"));
        assert_eq!(meter.project_id, None);

        let wire: WireMeter = decode(json!({"type": "gauge", "resource_id": "vm-1"}));
        assert!(matches!(
            Meter::try_from(wire),
            Err(ClientError::MalformedResponse(msg)) if msg.contains("name")
        ));
    }

    #[test]
    fn sample_timestamp_is_truncated() {
        let wire: WireSample = decode(json!({
            "counter_name": "cpu",
            "counter_type": "cumulative",
            "counter_unit": "ns",
            "counter_volume": 12.5,
            "timestamp": "2013-07-08T10:11:12.654321",
            "resource_id": "vm-1",
            "resource_metadata": {"display_name": "web"}
        }));
        let sample = Sample::try_from(wire).unwrap();
        assert_eq!(sample.timestamp.to_string(), "2013-07-08 10:11:12");
        assert_eq!(sample.display_name(), "web");
    }

    #[test]
    fn sample_with_bad_type_is_rejected() {
        let wire: WireSample = decode(json!({
            "counter_name": "cpu",
            "counter_type": "weird",
            "counter_volume": 1.0,
            "timestamp": "2013-07-08T10:11:12",
            "resource_id": "vm-1"
        }));
        assert!(matches!(
            Sample::try_from(wire),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn statistic_requires_max() {
        let wire: WireStatistic = decode(json!({"max": 42.0, "count": 3}));
        let stat = Statistic::try_from(wire).unwrap();
        assert!((stat.max - 42.0).abs() < f64::EPSILON);
        assert_eq!(stat.count, 3);

        let wire: WireStatistic = decode(json!({"min": 1.0}));
        assert!(Statistic::try_from(wire).is_err());
    }

    #[test]
    fn identity_name_defaults_to_id() {
        let wire: WireIdentity = decode(json!({"id": "p1"}));
        let record = IdentityRecord::try_from(wire).unwrap();
        assert_eq!(record.name, "p1");
    }
}
