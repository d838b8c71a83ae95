//! # Range Selectors
//!
//! The closed set of viewing windows offered by the dashboard, and their
//! resolution into concrete `[start, end]` windows against an injected "now".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeSelector {
    Latest,
    OneDay,
    OneWeek,
    OneMonth,
    ThreeMonths,
    YearToDate,
    OneYear,
    Custom,
}

impl RangeSelector {
    pub const ALL: [RangeSelector; 8] = [
        RangeSelector::Latest,
        RangeSelector::OneDay,
        RangeSelector::OneWeek,
        RangeSelector::OneMonth,
        RangeSelector::ThreeMonths,
        RangeSelector::YearToDate,
        RangeSelector::OneYear,
        RangeSelector::Custom,
    ];

    /// Short code used in query strings (`range=1d`).
    pub fn code(self) -> &'static str {
        match self {
            RangeSelector::Latest => "latest",
            RangeSelector::OneDay => "1d",
            RangeSelector::OneWeek => "1w",
            RangeSelector::OneMonth => "1m",
            RangeSelector::ThreeMonths => "3m",
            RangeSelector::YearToDate => "ytd",
            RangeSelector::OneYear => "1y",
            RangeSelector::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RangeSelector::Latest => "Latest",
            RangeSelector::OneDay => "1 Day",
            RangeSelector::OneWeek => "1 Week",
            RangeSelector::OneMonth => "1 Month",
            RangeSelector::ThreeMonths => "3 Months",
            RangeSelector::YearToDate => "Year-to-date",
            RangeSelector::OneYear => "1 Year",
            RangeSelector::Custom => "Custom",
        }
    }
}

impl fmt::Display for RangeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either the query code or the display label, case-insensitively.
impl FromStr for RangeSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RangeSelector::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(wanted) || r.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownRange(s.to_string()))
    }
}

/// A closed time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Resolves an enumerated selector to the window ending at `now`.
///
/// Uses calendar subtraction, so "1 Month" before 31 March is the last day of
/// February. `Latest` and `Custom` have no relative window and yield `None`.
pub fn resolve_range(selector: RangeSelector, now: DateTime<Utc>) -> Option<TimeWindow> {
    let start = match selector {
        RangeSelector::Latest | RangeSelector::Custom => return None,
        RangeSelector::OneDay => now.checked_sub_days(Days::new(1)),
        RangeSelector::OneWeek => now.checked_sub_days(Days::new(7)),
        RangeSelector::OneMonth => now.checked_sub_months(Months::new(1)),
        RangeSelector::ThreeMonths => now.checked_sub_months(Months::new(3)),
        RangeSelector::YearToDate => NaiveDate::from_ymd_opt(now.year(), 1, 1)
            .map(|d| d.and_time(NaiveTime::MIN).and_utc()),
        RangeSelector::OneYear => now.checked_sub_months(Months::new(12)),
    }?;
    TimeWindow::new(start, now)
}
