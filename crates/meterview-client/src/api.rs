//! Service seams.
//!
//! The HTTP service only sees these traits, so tests can swap in fakes or
//! point real clients at a mock server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use meterview_core::{Meter, Query, Resource, Sample, Statistic};

use crate::error::ClientError;

/// Read access to the metering service.
#[async_trait]
pub trait MeteringApi: Send + Sync {
    /// List meters matching the query.
    async fn meters(&self, query: &Query) -> Result<Vec<Meter>, ClientError>;

    /// List samples of one meter matching the query, oldest first.
    async fn samples(&self, meter: &str, query: &Query) -> Result<Vec<Sample>, ClientError>;

    /// Statistics of one meter over the query window.
    async fn statistics(&self, meter: &str, query: &Query) -> Result<Vec<Statistic>, ClientError>;

    /// List resources matching the query.
    async fn resources(&self, query: &Query) -> Result<Vec<Resource>, ClientError>;
}

/// An `(id, name)` pair from the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Read access to the identity service.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// List all users.
    async fn users(&self) -> Result<Vec<IdentityRecord>, ClientError>;

    /// List all projects (tenants), with admin scope.
    async fn projects(&self) -> Result<Vec<IdentityRecord>, ClientError>;
}
