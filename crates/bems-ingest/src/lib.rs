//! # BEMS Ingest
//!
//! Bridges sensor telemetry from MQTT into Redis.
//! `topics` maps the JSON payload of each `bems/*` topic onto channel readings,
//! `worker` runs the subscription loop that stores them.

pub mod config;
pub mod topics;
pub mod worker;

pub use config::WorkerConfig;
pub use topics::{fields_for_topic, parse_message};
