//! Filter clauses for metering queries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operator of a query clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOp {
    /// Equal.
    Eq,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
}

impl QueryOp {
    /// Operator name as understood by the metering API.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ge => "ge",
            Self::Le => "le",
            Self::Lt => "lt",
            Self::Gt => "gt",
        }
    }
}

impl fmt::Display for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `{field, op, value}` filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryClause {
    /// Field to filter on (`user`, `project`, `resource`, `timestamp`, ...).
    pub field: String,
    /// Comparison operator.
    pub op: QueryOp,
    /// Value to compare against.
    pub value: String,
}

/// An ordered list of filter clauses, all of which must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Query {
    clauses: Vec<QueryClause>,
}

impl Query {
    /// Create an empty query (matches everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query scoped to a user, project and resource.
    ///
    /// Clauses for missing or empty ids are left out so the query does not
    /// filter on values the meter never reported.
    #[must_use]
    pub fn scoped(user: Option<&str>, project: Option<&str>, resource: Option<&str>) -> Self {
        Self::new()
            .equals_opt("user", user)
            .equals_opt("project", project)
            .equals_opt("resource", resource)
    }

    /// Append a clause.
    #[must_use]
    pub fn clause(mut self, field: impl Into<String>, op: QueryOp, value: impl Into<String>) -> Self {
        self.clauses.push(QueryClause {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    /// Append an equality clause.
    #[must_use]
    pub fn equals(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clause(field, QueryOp::Eq, value)
    }

    /// Append an equality clause unless the value is missing or empty.
    #[must_use]
    pub fn equals_opt(self, field: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.equals(field, v),
            _ => self,
        }
    }

    /// The clauses in insertion order.
    #[must_use]
    pub fn clauses(&self) -> &[QueryClause] {
        &self.clauses
    }

    /// Whether the query has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = &'a QueryClause;
    type IntoIter = std::slice::Iter<'a, QueryClause>;

    fn into_iter(self) -> Self::IntoIter {
        self.clauses.iter()
    }
}
