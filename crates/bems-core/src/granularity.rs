//! # Granularity
//!
//! Bucket widths and the policy that picks one for a requested range.

use std::fmt;

use chrono::{DateTime, Datelike, Days, Months, NaiveTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{AggregationRequest, RangeSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Minute,
    Hour,
    Day,
    Month,
}

impl Granularity {
    /// Truncates `ts` to the start of its minute, hour, day or month (UTC calendar).
    pub fn truncate(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let start = match self {
            Granularity::Minute => date.and_hms_opt(ts.hour(), ts.minute(), 0),
            Granularity::Hour => date.and_hms_opt(ts.hour(), 0, 0),
            Granularity::Day => Some(date.and_time(NaiveTime::MIN)),
            Granularity::Month => date.with_day(1).map(|d| d.and_time(NaiveTime::MIN)),
        };
        // hour/minute come from a valid time and every month has a first day
        start.map_or(ts, |naive| naive.and_utc())
    }

    /// Start of the bucket following the one that starts at `bucket_start`.
    pub fn next(self, bucket_start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Granularity::Minute => bucket_start.checked_add_signed(TimeDelta::minutes(1)),
            Granularity::Hour => bucket_start.checked_add_signed(TimeDelta::hours(1)),
            Granularity::Day => bucket_start.checked_add_days(Days::new(1)),
            Granularity::Month => bucket_start.checked_add_months(Months::new(1)),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Minute => "minute",
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Month => "month",
        };
        f.write_str(name)
    }
}

/// Threshold table for custom spans.
///
/// A span up to `minute_max_hours` is bucketed per minute, up to
/// `hour_max_days` per hour, up to `day_max_days` per day, anything longer per
/// month. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GranularityPolicy {
    pub minute_max_hours: i64,
    pub hour_max_days: i64,
    pub day_max_days: i64,
}

impl GranularityPolicy {
    pub fn new(minute_max_hours: i64, hour_max_days: i64, day_max_days: i64) -> Self {
        Self {
            minute_max_hours,
            hour_max_days,
            day_max_days,
        }
    }

    pub fn for_span(&self, span: TimeDelta) -> Granularity {
        if span <= hours(self.minute_max_hours) {
            Granularity::Minute
        } else if span <= days(self.hour_max_days) {
            Granularity::Hour
        } else if span <= days(self.day_max_days) {
            Granularity::Day
        } else {
            Granularity::Month
        }
    }

    /// Bucket width for `request`.
    ///
    /// `None` means "do not bucket": either `Latest` (pass-through) or a
    /// `Custom` request without a usable window.
    pub fn granularity(&self, request: &AggregationRequest) -> Option<Granularity> {
        match request.selector {
            RangeSelector::Latest => None,
            RangeSelector::OneDay => Some(Granularity::Hour),
            RangeSelector::OneWeek
            | RangeSelector::OneMonth
            | RangeSelector::ThreeMonths
            | RangeSelector::YearToDate => Some(Granularity::Day),
            RangeSelector::OneYear => Some(Granularity::Month),
            RangeSelector::Custom => request.window().map(|w| self.for_span(w.span())),
        }
    }
}

impl Default for GranularityPolicy {
    fn default() -> Self {
        Self::new(24, 7, 90)
    }
}

fn hours(n: i64) -> TimeDelta {
    TimeDelta::try_hours(n).unwrap_or(TimeDelta::MAX)
}

fn days(n: i64) -> TimeDelta {
    TimeDelta::try_days(n).unwrap_or(TimeDelta::MAX)
}
