//! Time-series CSV export of one meter on one resource.

use std::sync::Arc;

use axum::extract::{Query as QueryParams, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use chrono::{NaiveDateTime, TimeDelta};
use serde::Deserialize;

use meterview_client::MeteringApi;
use meterview_core::series::{
    build_series, day_end, day_start, parse_form_date, QUERY_TIMESTAMP_FORMAT, TIMESTAMP_FORMAT,
};
use meterview_core::{MeterviewError, Query, QueryOp, Sample, SeriesPoint, SeriesRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// Samples export query parameters. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct SamplesParams {
    /// Meter name.
    pub sample: Option<String>,
    /// Window start day, `MM/DD/YYYY`.
    pub from: Option<String>,
    /// Window end day, `MM/DD/YYYY`.
    pub to: Option<String>,
    /// Resource id.
    pub resource: Option<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Export the series of a meter on a resource as `date,value` CSV.
pub async fn get_samples(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SamplesParams>,
) -> Result<impl IntoResponse, ApiError> {
    let from = present(params.from.as_ref())
        .map(parse_form_date)
        .transpose()?
        .map(day_start);
    let to = present(params.to.as_ref())
        .map(parse_form_date)
        .transpose()?
        .map(day_end);

    let points = match (present(params.sample.as_ref()), present(params.resource.as_ref())) {
        (Some(meter), Some(resource)) => {
            let request = SeriesRequest {
                from,
                to,
                previous: 0.0,
                averaging: state.config.averaging,
            };
            match fetch_series(&state, meter, resource, request).await {
                Ok(points) => points,
                Err(e) if e.is_backend() => {
                    tracing::warn!(meter, resource, error = %e, "Unable to retrieve samples");
                    Vec::new()
                }
                Err(e) => return Err(e.into()),
            }
        }
        _ => Vec::new(),
    };

    let body = series_to_csv(&points)?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/csv")], body))
}

/// Fetch the samples in the window and turn them into chart points.
async fn fetch_series(
    state: &AppState,
    meter: &str,
    resource: &str,
    mut request: SeriesRequest,
) -> Result<Vec<SeriesPoint>, MeterviewError> {
    let metering = state.metering()?;

    let mut query = Query::new();
    if let Some(from) = request.from {
        query = query.clause("timestamp", QueryOp::Ge, format_query_time(from));
    }
    if let Some(to) = request.to {
        query = query.clause("timestamp", QueryOp::Le, format_query_time(to));
    }
    let query = query.equals("resource", resource);

    let mut samples = list_samples(metering, meter, &query).await?;
    samples.sort_by_key(|s| s.timestamp);

    if let Some(from) = request.from {
        request.previous = previous_volume(metering, meter, resource, from).await?;
    }

    tracing::debug!(
        meter,
        resource,
        samples = samples.len(),
        previous = request.previous,
        "Building series"
    );

    Ok(build_series(&samples, &request))
}

/// Volume of the last sample in the hour before `from`, 0 if there is none.
async fn previous_volume(
    metering: &dyn MeteringApi,
    meter: &str,
    resource: &str,
    from: NaiveDateTime,
) -> Result<f64, MeterviewError> {
    let query = Query::new()
        .clause(
            "timestamp",
            QueryOp::Ge,
            format_query_time(from - TimeDelta::hours(1)),
        )
        .clause("timestamp", QueryOp::Lt, format_query_time(from))
        .equals("resource", resource);

    let samples = list_samples(metering, meter, &query).await?;
    Ok(samples
        .iter()
        .max_by_key(|s| s.timestamp)
        .map_or(0.0, |s| s.counter_volume))
}

async fn list_samples(
    metering: &dyn MeteringApi,
    meter: &str,
    query: &Query,
) -> Result<Vec<Sample>, MeterviewError> {
    metering
        .samples(meter, query)
        .await
        .map_err(|e| e.into_core("metering"))
}

fn format_query_time(ts: NaiveDateTime) -> String {
    ts.format(QUERY_TIMESTAMP_FORMAT).to_string()
}

/// Render points as CSV with a `date,value` header.
fn series_to_csv(points: &[SeriesPoint]) -> Result<String, ApiError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["date", "value"])
        .map_err(|e| ApiError::Internal(format!("CSV write failed: {e}")))?;

    for point in points {
        wtr.write_record([
            point.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            point.value.to_string(),
        ])
        .map_err(|e| ApiError::Internal(format!("CSV write failed: {e}")))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Internal(format!("CSV is not UTF-8: {e}")))
}
