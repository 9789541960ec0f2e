//! Stats overview handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use meterview_core::{Meter, MeterType, MeterviewError, Query, Resource};

use crate::state::AppState;

/// Resource ids keyed by project, then user.
pub type ResourceTree = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Stats overview response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Names of the meters that can be charted.
    pub meters: Vec<String>,
    /// Resources grouped by project and user.
    pub resources: ResourceTree,
}

/// Get the chartable meters and the resource tree.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let (meters, resources) = match state.metering() {
        Ok(metering) => {
            let query = Query::new();
            let (meters, resources) = tokio::join!(metering.meters(&query), metering.resources(&query));
            (
                degrade(meters.map_err(|e| e.into_core("metering")), "meters"),
                degrade(resources.map_err(|e| e.into_core("metering")), "resources"),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Unable to retrieve stats");
            (Vec::new(), Vec::new())
        }
    };

    Json(StatsResponse {
        meters: chartable_meters(&meters),
        resources: group_resources(&resources),
    })
}

fn degrade<T>(result: Result<Vec<T>, MeterviewError>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, what, "Unable to retrieve stats");
        Vec::new()
    })
}

/// Names of cumulative meters, deduplicated in first-seen order.
fn chartable_meters(meters: &[Meter]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for meter in meters {
        if meter.meter_type == MeterType::Cumulative && !names.contains(&meter.name) {
            names.push(meter.name.clone());
        }
    }
    names
}

/// Group resource ids by project, then user. Missing ids group under `""`.
fn group_resources(resources: &[Resource]) -> ResourceTree {
    let mut tree = ResourceTree::new();
    for resource in resources {
        tree.entry(resource.project_id.clone().unwrap_or_default())
            .or_default()
            .entry(resource.user_id.clone().unwrap_or_default())
            .or_default()
            .push(resource.resource_id.clone());
    }
    tree
}
