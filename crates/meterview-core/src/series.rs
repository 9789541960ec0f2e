//! Time-series shaping for the sample export.
//!
//! Cumulative counters only ever grow, so charting them raw is useless; the
//! export turns them into per-sample increments. Long windows are then
//! averaged into hourly or daily buckets to keep the series small.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::MeterviewError;
use crate::meter::{MeterType, Sample};

/// Timestamp format used in exported series.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Timestamp format of query clause values.
pub const QUERY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format accepted from the chart form (`MM/DD/YYYY`).
pub const FORM_DATE_FORMAT: &str = "%m/%d/%Y";

/// Windows of at least this many whole days are reduced to hourly buckets.
pub const HOURLY_SPAN_DAYS: i64 = 30;

/// Windows of at least this many whole days are reduced to daily buckets.
pub const DAILY_SPAN_DAYS: i64 = 365;

/// One `(timestamp, value)` point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Point time.
    pub timestamp: NaiveDateTime,
    /// Point value.
    pub value: f64,
}

impl SeriesPoint {
    /// Create a point.
    #[must_use]
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Bucket size for reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Keep every point.
    Raw,
    /// One point per hour.
    Hour,
    /// One point per day.
    Day,
}

impl Granularity {
    /// Pick the bucket size for a window.
    #[must_use]
    pub fn for_span(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        let days = (to - from).num_days();
        if days >= DAILY_SPAN_DAYS {
            Self::Day
        } else if days >= HOURLY_SPAN_DAYS {
            Self::Hour
        } else {
            Self::Raw
        }
    }

    /// Truncate a timestamp to the start of its bucket.
    #[must_use]
    pub fn truncate(self, ts: NaiveDateTime) -> NaiveDateTime {
        let midnight = ts.date().and_time(NaiveTime::MIN);
        match self {
            Self::Raw => ts,
            Self::Hour => midnight + TimeDelta::hours(i64::from(ts.hour())),
            Self::Day => midnight,
        }
    }
}

/// How bucket means are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Averaging {
    /// Plain floating-point mean.
    #[default]
    Float,
    /// Mean truncated toward zero, as older dashboards computed it.
    Truncate,
}

/// Turn samples into chart points.
///
/// Cumulative samples become the difference to the previous volume, starting
/// from `previous`. A negative difference is taken as a counter reset and the
/// raw volume is emitted instead; this is a heuristic and will misreport a
/// reset whose new volume exceeds the old one. Delta and gauge samples pass
/// through unchanged.
#[must_use]
pub fn reconstruct_deltas(samples: &[Sample], mut previous: f64) -> Vec<SeriesPoint> {
    samples
        .iter()
        .map(|sample| {
            let volume = sample.counter_volume;
            let value = match sample.counter_type {
                MeterType::Cumulative => {
                    let delta = volume - previous;
                    previous = volume;
                    if delta < 0.0 {
                        volume
                    } else {
                        delta
                    }
                }
                MeterType::Delta | MeterType::Gauge => volume,
            };
            SeriesPoint::new(sample.timestamp, value)
        })
        .collect()
}

/// Average points into buckets of the given size, ordered by bucket.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reduce(points: &[SeriesPoint], granularity: Granularity, averaging: Averaging) -> Vec<SeriesPoint> {
    if granularity == Granularity::Raw {
        return points.to_vec();
    }

    let mut buckets: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for point in points {
        let bucket = buckets
            .entry(granularity.truncate(point.timestamp))
            .or_insert((0.0, 0));
        bucket.0 += point.value;
        bucket.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(timestamp, (sum, count))| {
            let mean = sum / count as f64;
            let value = match averaging {
                Averaging::Float => mean,
                Averaging::Truncate => mean.trunc(),
            };
            SeriesPoint::new(timestamp, value)
        })
        .collect()
}

/// Add zero points at the window bounds so charts show a baseline.
#[must_use]
pub fn pad_window(
    points: Vec<SeriesPoint>,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> Vec<SeriesPoint> {
    let mut padded = Vec::with_capacity(points.len() + 2);
    padded.extend(from.map(|ts| SeriesPoint::new(ts, 0.0)));
    padded.extend(points);
    padded.extend(to.map(|ts| SeriesPoint::new(ts, 0.0)));
    padded
}

/// Parameters of a series export.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesRequest {
    /// Window start.
    pub from: Option<NaiveDateTime>,
    /// Window end.
    pub to: Option<NaiveDateTime>,
    /// Last cumulative volume before the window.
    pub previous: f64,
    /// Bucket averaging mode.
    pub averaging: Averaging,
}

/// Build the exported series for one `(meter, resource)`.
///
/// The series type is that of the last sample; an empty series counts as
/// non-cumulative. Cumulative series are bucketed when the window is long,
/// others are padded with zero points at the window bounds.
#[must_use]
pub fn build_series(samples: &[Sample], request: &SeriesRequest) -> Vec<SeriesPoint> {
    let points = reconstruct_deltas(samples, request.previous);
    let series_type = samples.last().map(|s| s.counter_type);

    if series_type == Some(MeterType::Cumulative) {
        match (request.from, request.to) {
            (Some(from), Some(to)) => {
                reduce(&points, Granularity::for_span(from, to), request.averaging)
            }
            _ => points,
        }
    } else {
        pad_window(points, request.from, request.to)
    }
}

/// Parse a `MM/DD/YYYY` date from the chart form.
pub fn parse_form_date(s: &str) -> Result<NaiveDate, MeterviewError> {
    NaiveDate::parse_from_str(s.trim(), FORM_DATE_FORMAT)
        .map_err(|e| MeterviewError::MalformedInput(format!("invalid date {s:?}: {e}")))
}

/// First second of a day.
#[must_use]
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last second of a day.
#[must_use]
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    day_start(date) + TimeDelta::seconds(86_399)
}

/// Parse a service timestamp, ignoring fractional seconds and zone suffixes.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, MeterviewError> {
    let head = s.get(..19).unwrap_or(s);
    NaiveDateTime::parse_from_str(head, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(head, QUERY_TIMESTAMP_FORMAT))
        .map_err(|e| MeterviewError::MalformedResponse(format!("invalid timestamp {s:?}: {e}")))
}
