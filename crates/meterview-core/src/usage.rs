//! Usage records and grouping.
//!
//! The metering service reports one statistic per `(meter, resource)`. The
//! usage tables want one row per `(user, tenant, resource)` with a column per
//! counter, so rows are grouped here and every requested counter is present in
//! every record, defaulting to 0.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MeterviewError;

/// Turn a dotted meter name into a record field name (`disk.read.bytes` to
/// `disk_read_bytes`).
#[must_use]
pub fn normalize_counter_name(name: &str) -> String {
    name.replace('.', "_")
}

/// Identity of a usage record.
///
/// Compared field by field, so `("a_b", "c", "d")` and `("a", "b_c", "d")`
/// never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsageKey {
    /// User display name.
    pub user: String,
    /// Tenant display name.
    pub tenant: String,
    /// Resource id.
    pub resource: String,
}

/// One counter total for one resource, before grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRow {
    /// Tenant display name.
    pub tenant: String,
    /// User display name.
    pub user: String,
    /// Resource id.
    pub resource: String,
    /// Normalized counter name.
    pub counter_name: String,
    /// Counter total (the statistic's `max`).
    pub total: f64,
}

impl UsageRow {
    /// The grouping key of this row.
    #[must_use]
    pub fn key(&self) -> UsageKey {
        UsageKey {
            user: self.user.clone(),
            tenant: self.tenant.clone(),
            resource: self.resource.clone(),
        }
    }
}

/// Grouped usage for one `(user, tenant, resource)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Tenant display name.
    pub tenant: String,
    /// User display name.
    pub user: String,
    /// Resource id.
    pub resource: String,
    /// Counter totals keyed by normalized counter name.
    #[serde(flatten)]
    pub counters: BTreeMap<String, f64>,
}

impl UsageRecord {
    /// The grouping key of this record.
    #[must_use]
    pub fn key(&self) -> UsageKey {
        UsageKey {
            user: self.user.clone(),
            tenant: self.tenant.clone(),
            resource: self.resource.clone(),
        }
    }

    /// Total for a counter (dotted or normalized name), 0 if absent.
    #[must_use]
    pub fn counter(&self, name: &str) -> f64 {
        self.counters
            .get(&normalize_counter_name(name))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Group rows into one record per `(user, tenant, resource)`.
///
/// Every record gets every field in `fields` (normalized), initialised to 0,
/// then overlaid with the rows' totals; a later row for the same counter
/// replaces an earlier one. Rows for counters outside `fields` are ignored.
/// Records come out in the order their key was first seen.
pub fn group_usage<I, S>(rows: I, fields: &[S]) -> Vec<UsageRecord>
where
    I: IntoIterator<Item = UsageRow>,
    S: AsRef<str>,
{
    let fields: Vec<String> = fields
        .iter()
        .map(|f| normalize_counter_name(f.as_ref()))
        .collect();

    let mut index: HashMap<UsageKey, usize> = HashMap::new();
    let mut records: Vec<UsageRecord> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.key()).or_insert_with(|| {
            records.push(UsageRecord {
                tenant: row.tenant.clone(),
                user: row.user.clone(),
                resource: row.resource.clone(),
                counters: fields.iter().map(|f| (f.clone(), 0.0)).collect(),
            });
            records.len() - 1
        });

        if let Some(total) = records[slot].counters.get_mut(&row.counter_name) {
            *total = row.total;
        }
    }

    records
}

/// Maps user and project ids to display names.
///
/// Unknown ids are shown as-is.
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    users: HashMap<String, String>,
    tenants: HashMap<String, String>,
}

impl NameDirectory {
    /// Build a directory from `(id, name)` pairs.
    pub fn new<U, T>(users: U, tenants: T) -> Self
    where
        U: IntoIterator<Item = (String, String)>,
        T: IntoIterator<Item = (String, String)>,
    {
        Self {
            users: users.into_iter().collect(),
            tenants: tenants.into_iter().collect(),
        }
    }

    /// Display name of a user, falling back to the id.
    #[must_use]
    pub fn user_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.users.get(id).map_or(id, String::as_str)
    }

    /// Display name of a tenant, falling back to the id.
    #[must_use]
    pub fn tenant_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.tenants.get(id).map_or(id, String::as_str)
    }
}

/// The usage tables offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageCategory {
    /// CPU time.
    Cpu,
    /// Disk reads and writes.
    Disk,
    /// Network bytes and packets.
    NetworkTraffic,
    /// Networking resources (networks, subnets, ports, routers, floating IPs).
    Network,
    /// Object storage.
    ObjectStore,
}

impl UsageCategory {
    /// All categories in tab order.
    pub const ALL: [Self; 5] = [
        Self::Disk,
        Self::NetworkTraffic,
        Self::Network,
        Self::ObjectStore,
        Self::Cpu,
    ];

    /// URL slug.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Disk => "disk",
            Self::NetworkTraffic => "network-traffic",
            Self::Network => "network",
            Self::ObjectStore => "object-store",
        }
    }

    /// Table title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Cpu => "Global CPU Usage",
            Self::Disk => "Global Disk Usage",
            Self::NetworkTraffic => "Global Network Traffic Usage",
            Self::Network => "Global Network Usage",
            Self::ObjectStore => "Global Object Store Usage",
        }
    }

    /// Meter names shown in this table.
    #[must_use]
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Self::Cpu => &["cpu"],
            Self::Disk => &[
                "disk.read.bytes",
                "disk.read.requests",
                "disk.write.bytes",
                "disk.write.requests",
            ],
            Self::NetworkTraffic => &[
                "network.incoming.bytes",
                "network.incoming.packets",
                "network.outgoing.bytes",
                "network.outgoing.packets",
            ],
            Self::Network => &[
                "network",
                "network.create",
                "subnet",
                "subnet.create",
                "port",
                "port.create",
                "router",
                "router.create",
                "ip.floating",
                "ip.floating.create",
            ],
            Self::ObjectStore => &[
                "storage.objects",
                "storage.objects.size",
                "storage.objects.incoming.bytes",
                "storage.objects.outgoing.bytes",
            ],
        }
    }

    /// Whether a counter (dotted or normalized) measures bytes.
    #[must_use]
    pub fn is_byte_counter(name: &str) -> bool {
        let name = normalize_counter_name(name);
        name.ends_with("_bytes") || name == "storage_objects_size"
    }
}

impl fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for UsageCategory {
    type Err = MeterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| MeterviewError::MalformedInput(format!("unknown usage category: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user: &str, tenant: &str, resource: &str, counter: &str, total: f64) -> UsageRow {
        UsageRow {
            tenant: tenant.into(),
            user: user.into(),
            resource: resource.into(),
            counter_name: normalize_counter_name(counter),
            total,
        }
    }

    const DISK: &[&str] = &[
        "disk.read.bytes",
        "disk.read.requests",
        "disk.write.bytes",
        "disk.write.requests",
    ];

    #[test]
    fn normalizes_dots() {
        assert_eq!(normalize_counter_name("disk.read.bytes"), "disk_read_bytes");
        assert_eq!(normalize_counter_name("cpu"), "cpu");
    }

    #[test]
    fn every_record_has_every_field() {
        let records = group_usage(
            vec![
                row("alice", "demo", "vm-1", "disk.read.bytes", 100.0),
                row("bob", "demo", "vm-2", "disk.write.requests", 7.0),
            ],
            DISK,
        );

        assert_eq!(records.len(), 2);
        for record in &records {
            let keys: Vec<_> = record.counters.keys().map(String::as_str).collect();
            assert_eq!(
                keys,
                [
                    "disk_read_bytes",
                    "disk_read_requests",
                    "disk_write_bytes",
                    "disk_write_requests"
                ]
            );
        }
        assert_eq!(records[0].counter("disk.read.bytes"), 100.0);
        assert_eq!(records[0].counter("disk.write.requests"), 0.0);
        assert_eq!(records[1].counter("disk_write_requests"), 7.0);
    }

    #[test]
    fn rows_with_same_key_merge() {
        let records = group_usage(
            vec![
                row("alice", "demo", "vm-1", "disk.read.bytes", 100.0),
                row("alice", "demo", "vm-1", "disk.write.bytes", 50.0),
            ],
            DISK,
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].counter("disk.read.bytes"), 100.0);
        assert_eq!(records[0].counter("disk.write.bytes"), 50.0);
    }

    #[test]
    fn last_write_wins_for_duplicate_counter() {
        let records = group_usage(
            vec![
                row("alice", "demo", "vm-1", "disk.read.bytes", 100.0),
                row("alice", "demo", "vm-1", "disk.read.bytes", 300.0),
            ],
            DISK,
        );
        assert_eq!(records[0].counter("disk.read.bytes"), 300.0);
    }

    #[test]
    fn separator_in_names_does_not_merge_keys() {
        let records = group_usage(
            vec![
                row("a_b", "c", "d", "cpu", 1.0),
                row("a", "b_c", "d", "cpu", 2.0),
            ],
            &["cpu"],
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user, "a_b");
        assert_eq!(records[0].counter("cpu"), 1.0);
        assert_eq!(records[1].user, "a");
        assert_eq!(records[1].tenant, "b_c");
        assert_eq!(records[1].counter("cpu"), 2.0);
    }

    #[test]
    fn unrequested_counters_are_dropped() {
        let records = group_usage(vec![row("u", "t", "r", "memory", 512.0)], &["cpu"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].counters.len(), 1);
        assert_eq!(records[0].counter("cpu"), 0.0);
    }

    #[test]
    fn record_serializes_flat() {
        let records = group_usage(vec![row("u", "t", "r", "cpu", 5.0)], &["cpu"]);
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"tenant": "t", "user": "u", "resource": "r", "cpu": 5.0})
        );
    }

    #[test]
    fn directory_falls_back_to_id() {
        let directory = NameDirectory::new(
            vec![("u1".to_string(), "alice".to_string())],
            vec![("p1".to_string(), "demo".to_string())],
        );
        assert_eq!(directory.user_name("u1"), "alice");
        assert_eq!(directory.user_name("u2"), "u2");
        assert_eq!(directory.tenant_name("p1"), "demo");
        assert_eq!(directory.tenant_name("p9"), "p9");
    }

    #[test]
    fn category_slugs_round_trip() {
        for category in UsageCategory::ALL {
            assert_eq!(category.slug().parse::<UsageCategory>().unwrap(), category);
        }
        assert!("memory".parse::<UsageCategory>().is_err());
    }

    #[test]
    fn byte_counters() {
        assert!(UsageCategory::is_byte_counter("disk.read.bytes"));
        assert!(UsageCategory::is_byte_counter("storage_objects_size"));
        assert!(!UsageCategory::is_byte_counter("disk.read.requests"));
        assert!(!UsageCategory::is_byte_counter("cpu"));
    }
}
