//! # BEMS API
//!
//! REST history layer over the Redis reading store. Query strings are
//! translated into storage reads and aggregation requests; chart series are
//! aggregated server-side with the configured granularity policy.

pub mod config;
pub mod error;
pub mod query;
pub mod routes;

pub use config::ApiConfig;
pub use routes::{router, AppState};
