//! API handlers.

pub mod export;
pub mod health;
pub mod samples;
pub mod stats;
pub mod usage;
