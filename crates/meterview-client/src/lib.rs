//! Meterview REST clients.
//!
//! This crate talks to the two OpenStack services the dashboard reads from:
//!
//! - the metering service (Ceilometer v2): meters, samples, statistics and
//!   resources, filtered with [`Query`](meterview_core::Query) clauses;
//! - the identity service (Keystone v3): user and project names.
//!
//! Responses are decoded into permissive wire structs and validated into the
//! typed records of `meterview-core`; a record missing a required field is a
//! [`ClientError::MalformedResponse`].
//!
//! # Example
//!
//! ```no_run
//! use meterview_client::{ClientOptions, MeteringApi, MeteringClient};
//! use meterview_core::Query;
//!
//! # async fn example() -> Result<(), meterview_client::ClientError> {
//! let client = MeteringClient::new(
//!     "http://ceilometer.example.com:8777",
//!     "keystone-token",
//!     ClientOptions::default(),
//! )?;
//!
//! let meters = client.meters(&Query::new()).await?;
//! println!("{} meters", meters.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod api;
mod error;
mod http;
mod identity;
mod metering;
mod wire;

pub use api::{IdentityApi, IdentityRecord, MeteringApi};
pub use error::ClientError;
pub use http::ClientOptions;
pub use identity::IdentityClient;
pub use metering::MeteringClient;
