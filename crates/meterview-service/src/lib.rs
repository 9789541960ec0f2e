//! Meterview HTTP API Service.
//!
//! This crate provides the HTTP API of the metering dashboard, including:
//!
//! - Usage tables per category (disk, network traffic, network, object store, CPU)
//! - The stats overview (chartable meters, resources per tenant and user)
//! - Time-series CSV export of one meter on one resource
//! - SVG chart to PDF export
//!
//! # Backends
//!
//! Data comes from the metering service (Ceilometer v2) with names resolved
//! through the identity service (Keystone v3). When either is unreachable the
//! affected endpoint degrades to an empty result and logs a warning.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers stay async for routing consistency

pub mod aggregator;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
