//! Global usage table handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use meterview_core::{normalize_counter_name, ByteQuantity, UsageCategory, UsageRecord};

use crate::aggregator::aggregate_global_usage;
use crate::error::ApiError;
use crate::state::AppState;

/// Usage table query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct UsageParams {
    /// Case-insensitive tenant name filter.
    pub q: Option<String>,
}

/// Column total shown under the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    /// Raw sum.
    pub total: f64,
    /// Human-readable sum (byte counters in B/KB/MB/...).
    pub display: String,
}

/// Usage table response.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// Category slug.
    pub category: String,
    /// Table title.
    pub title: String,
    /// One record per `(user, tenant, resource)`, sorted by tenant then user.
    pub records: Vec<UsageRecord>,
    /// Column totals keyed by normalized counter name.
    pub summary: BTreeMap<String, FieldSummary>,
}

/// Get the global usage table of a category.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<UsageParams>,
) -> Result<Json<UsageResponse>, ApiError> {
    let category: UsageCategory = category
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown usage category: {category}")))?;

    let records = match load_records(&state, category).await {
        Ok(records) => records,
        Err(e) if e.is_backend() => {
            tracing::warn!(category = %category, error = %e, "Unable to retrieve usage");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    let records = filter_and_sort(records, params.q.as_deref());
    let summary = summarize(&records, category.fields());

    Ok(Json(UsageResponse {
        category: category.slug().to_string(),
        title: category.title().to_string(),
        records,
        summary,
    }))
}

async fn load_records(
    state: &AppState,
    category: UsageCategory,
) -> Result<Vec<UsageRecord>, meterview_core::MeterviewError> {
    aggregate_global_usage(
        state.metering()?,
        state.identity(),
        category.fields(),
        state.config.statistics_concurrency,
    )
    .await
}

/// Keep records whose tenant contains `filter` (case-insensitive), sorted by
/// tenant then user.
fn filter_and_sort(mut records: Vec<UsageRecord>, filter: Option<&str>) -> Vec<UsageRecord> {
    if let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) {
        let needle = filter.to_lowercase();
        records.retain(|r| r.tenant.to_lowercase().contains(&needle));
    }
    records.sort_by(|a, b| (&a.tenant, &a.user).cmp(&(&b.tenant, &b.user)));
    records
}

/// Sum every field over the records.
fn summarize(records: &[UsageRecord], fields: &[&str]) -> BTreeMap<String, FieldSummary> {
    fields
        .iter()
        .map(|field| {
            let total = records.iter().fold(0.0, |acc, r| acc + r.counter(field));
            let display = if UsageCategory::is_byte_counter(field) {
                records
                    .iter()
                    .map(|r| ByteQuantity::from_bytes(r.counter(field)))
                    .sum::<ByteQuantity>()
                    .to_string()
            } else {
                total.to_string()
            };
            (normalize_counter_name(field), FieldSummary { total, display })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tenant: &str, user: &str, read_bytes: f64) -> UsageRecord {
        UsageRecord {
            tenant: tenant.into(),
            user: user.into(),
            resource: format!("{tenant}-{user}"),
            counters: [
                ("disk_read_bytes".to_string(), read_bytes),
                ("disk_read_requests".to_string(), 3.0),
            ]
            .into_iter()
            .collect(),
        }
    }

    #[test]
    fn records_are_sorted_by_tenant_then_user() {
        let records = vec![
            record("beta", "zoe", 1.0),
            record("alpha", "yan", 1.0),
            record("alpha", "bob", 1.0),
        ];
        let sorted = filter_and_sort(records, None);
        let order: Vec<_> = sorted.iter().map(|r| (r.tenant.as_str(), r.user.as_str())).collect();
        assert_eq!(order, [("alpha", "bob"), ("alpha", "yan"), ("beta", "zoe")]);
    }

    #[test]
    fn filter_matches_tenant_case_insensitively() {
        let records = vec![record("Demo", "a", 1.0), record("admin", "b", 1.0)];
        let filtered = filter_and_sort(records, Some("DEM"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].tenant, "Demo");

        let all = filter_and_sort(vec![record("Demo", "a", 1.0)], Some("  "));
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn byte_fields_are_summarized_with_units() {
        let records = vec![record("a", "u", 1024.0), record("b", "u", 512.0)];
        let summary = summarize(&records, &["disk.read.bytes", "disk.read.requests"]);

        let bytes = &summary["disk_read_bytes"];
        assert!((bytes.total - 1536.0).abs() < f64::EPSILON);
        assert_eq!(bytes.display, "1.5 KB");

        let requests = &summary["disk_read_requests"];
        assert_eq!(requests.display, "6");
    }

    #[test]
    fn empty_table_has_zero_totals() {
        let summary = summarize(&[], UsageCategory::NetworkTraffic.fields());
        let packets = &summary["network_incoming_packets"];
        assert_eq!(packets.display, "0");
        assert!(packets.total.is_sign_positive());
        assert_eq!(summary["network_incoming_bytes"].display, "0 bytes");
    }
}
