//! Global usage aggregation.
//!
//! One statistic lookup per meter, run through a bounded stream that yields
//! in input order, then grouped into one record per `(user, tenant, resource)`.

use futures::stream::{self, StreamExt, TryStreamExt};

use meterview_client::{IdentityApi, MeteringApi};
use meterview_core::{
    group_usage, normalize_counter_name, Meter, MeterviewError, NameDirectory, Query, UsageRecord,
    UsageRow,
};

/// Build the global usage table for the given meter names.
///
/// Meters outside `fields` are skipped. Every record carries every field,
/// defaulting to 0. Records come out in the order their key is first seen in
/// the meter listing, whatever order the lookups complete in.
pub async fn aggregate_global_usage(
    metering: &dyn MeteringApi,
    identity: Option<&dyn IdentityApi>,
    fields: &[&str],
    concurrency: usize,
) -> Result<Vec<UsageRecord>, MeterviewError> {
    let meters: Vec<Meter> = metering
        .meters(&Query::new())
        .await
        .map_err(|e| e.into_core("metering"))?
        .into_iter()
        .filter(|meter| fields.contains(&meter.name.as_str()))
        .collect();

    tracing::debug!(meters = meters.len(), concurrency, "Fetching usage statistics");

    let directory = load_directory(identity).await;

    // Built eagerly so the handler future stays `Send`.
    let lookups: Vec<_> = meters
        .iter()
        .map(|meter| meter_total(metering, meter))
        .collect();
    let totals: Vec<f64> = stream::iter(lookups)
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let rows = meters.iter().zip(totals).map(|(meter, total)| UsageRow {
        tenant: directory
            .tenant_name(meter.project_id.as_deref().unwrap_or_default())
            .to_string(),
        user: directory
            .user_name(meter.user_id.as_deref().unwrap_or_default())
            .to_string(),
        resource: meter.resource_id.clone(),
        counter_name: normalize_counter_name(&meter.name),
        total,
    });

    Ok(group_usage(rows, fields))
}

/// The usage total of one meter: the `max` of its scoped statistic.
async fn meter_total(metering: &dyn MeteringApi, meter: &Meter) -> Result<f64, MeterviewError> {
    let query = Query::scoped(
        meter.user_id.as_deref(),
        meter.project_id.as_deref(),
        Some(meter.resource_id.as_str()),
    );

    let statistics = metering
        .statistics(&meter.name, &query)
        .await
        .map_err(|e| e.into_core("metering"))?;

    if let Some(statistic) = statistics.first() {
        return Ok(statistic.max);
    }

    let err = MeterviewError::EmptyStatistic {
        meter: meter.name.clone(),
    };
    tracing::warn!(
        error = %err,
        resource_id = %meter.resource_id,
        "Empty statistic, reporting 0"
    );
    Ok(0.0)
}

/// Load user and project names; an unreachable identity service yields an
/// empty directory.
async fn load_directory(identity: Option<&dyn IdentityApi>) -> NameDirectory {
    let Some(identity) = identity else {
        return NameDirectory::default();
    };

    match tokio::join!(identity.users(), identity.projects()) {
        (Ok(users), Ok(projects)) => NameDirectory::new(
            users.into_iter().map(|u| (u.id, u.name)),
            projects.into_iter().map(|p| (p.id, p.name)),
        ),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Identity lookup failed, showing raw ids");
            NameDirectory::default()
        }
    }
}
