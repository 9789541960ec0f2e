//! Core types and utilities for meterview.
//!
//! This crate provides the foundational types used throughout meterview:
//!
//! - **Metering records**: `Meter`, `Sample`, `Statistic`, `Resource`
//! - **Queries**: `Query`, `QueryClause`, `QueryOp`
//! - **Usage**: `UsageRecord`, `UsageKey`, `UsageCategory`, `group_usage`
//! - **Time series**: delta reconstruction and bucket reduction
//! - **Quantities**: `ByteQuantity`, `ByteUnit`
//!
//! Nothing in here performs I/O. Records are fetched by `meterview-client`
//! and stitched together by the service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod meter;
pub mod quantity;
pub mod query;
pub mod series;
pub mod usage;

pub use error::{MeterviewError, Result};
pub use meter::{Meter, MeterType, Resource, Sample, Statistic};
pub use quantity::{ByteQuantity, ByteUnit};
pub use query::{Query, QueryClause, QueryOp};
pub use series::{Averaging, Granularity, SeriesPoint, SeriesRequest};
pub use usage::{
    group_usage, normalize_counter_name, NameDirectory, UsageCategory, UsageKey, UsageRecord,
    UsageRow,
};
