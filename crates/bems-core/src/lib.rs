//! # BEMS Core
//!
//! This crate provides the core data structures and functions for turning raw
//! building-sensor history into chart-ready series.
//! It defines the `TimedValue` trait, which is a generic interface for a single
//! timestamped measurement, and a concrete `SensorSample` struct.
//! It also provides the range selectors, the granularity policy and the
//! bucketing `aggregate` function used by the history endpoints.

pub mod aggregate;
pub mod channel;
pub mod error;
pub mod granularity;
pub mod range;
pub mod status;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use aggregate::{AggregatedPoint, AggregationRequest, Aggregator, aggregate, bucket_by};
pub use channel::Channel;
pub use error::Error;
pub use granularity::{Granularity, GranularityPolicy};
pub use range::{RangeSelector, TimeWindow, resolve_range};
pub use status::Status;

pub trait TimedValue {
    fn timestamp(&self) -> DateTime<Utc>;
    fn value(&self) -> f64;
}

/// A concrete implementation of `TimedValue`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl SensorSample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl TimedValue for SensorSample {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// Returns true if `value` can take part in an average.
///
/// # Examples
///
/// ```
/// use bems_core::is_numeric;
///
/// assert!(is_numeric(21.5));
/// assert!(!is_numeric(f64::NAN));
/// assert!(!is_numeric(f64::INFINITY));
/// ```
pub fn is_numeric(value: f64) -> bool {
    value.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sample_trait_impl_works() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap();
        let sample = SensorSample::new(ts, 20.5);

        assert_eq!(sample.timestamp(), ts);
        assert_eq!(sample.value(), 20.5);
    }

    #[test]
    fn zero_is_numeric() {
        assert!(is_numeric(0.0));
        assert!(is_numeric(-12.0));
        assert!(!is_numeric(f64::NEG_INFINITY));
    }

    #[test]
    fn sample_serializes_timestamp_as_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap();
        let json = serde_json::to_string(&SensorSample::new(ts, 1.5)).unwrap();
        assert_eq!(json, r#"{"timestamp":"2024-05-01T10:05:00Z","value":1.5}"#);
    }
}
