//! # Query
//!
//! Translates `/api/history` and `/api/series` query strings into a storage
//! read plan and an aggregation request.

use bems_core::{AggregationRequest, Channel, Error, RangeSelector, TimeWindow, resolve_range};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Raw query string, e.g. `?channel=humidity&range=1w` or
/// `?start=2024-05-01T00:00:00Z&end=2024-05-02T00:00:00Z`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HistoryParams {
    pub channel: Option<String>,
    pub range: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Which rows to fetch from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetch {
    Recent(usize),
    Window(TimeWindow),
    /// Custom range without usable bounds: answer with an empty series.
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub channel: Channel,
    pub request: AggregationRequest,
    pub fetch: Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 5000,
        }
    }
}

impl HistoryParams {
    /// Without `range`, explicit bounds imply a custom range and no bounds
    /// imply `Latest`.
    pub fn plan(&self, now: DateTime<Utc>, limits: Limits) -> Result<Plan, Error> {
        let channel = match &self.channel {
            Some(name) => name.parse()?,
            None => Channel::Temperature,
        };
        let selector = match &self.range {
            Some(code) => code.parse()?,
            None if self.start.is_some() || self.end.is_some() => RangeSelector::Custom,
            None => RangeSelector::Latest,
        };
        let request = AggregationRequest {
            selector,
            start: self.start,
            end: self.end,
        };

        let fetch = match selector {
            RangeSelector::Latest => {
                let limit = self.limit.unwrap_or(limits.default_limit);
                Fetch::Recent(limit.min(limits.max_limit))
            }
            RangeSelector::Custom => request.window().map_or(Fetch::Nothing, Fetch::Window),
            fixed => resolve_range(fixed, now).map_or(Fetch::Nothing, Fetch::Window),
        };

        Ok(Plan {
            channel,
            request,
            fetch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn plan(params: HistoryParams) -> Result<Plan, Error> {
        params.plan(now(), Limits::default())
    }

    #[test]
    fn empty_query_reads_latest_temperature() {
        let plan = plan(HistoryParams::default()).unwrap();
        assert_eq!(plan.channel, Channel::Temperature);
        assert_eq!(plan.request.selector, RangeSelector::Latest);
        assert_eq!(plan.fetch, Fetch::Recent(100));
    }

    #[test]
    fn limit_is_clamped() {
        let params = HistoryParams {
            limit: Some(1_000_000),
            ..Default::default()
        };
        assert_eq!(plan(params).unwrap().fetch, Fetch::Recent(5000));
    }

    #[test]
    fn fixed_range_resolves_against_now() {
        let params = HistoryParams {
            channel: Some("humidity".into()),
            range: Some("1w".into()),
            ..Default::default()
        };
        let plan = plan(params).unwrap();
        assert_eq!(plan.channel, Channel::Humidity);
        assert_eq!(
            plan.fetch,
            Fetch::Window(TimeWindow::new(Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap(), now()).unwrap())
        );
    }

    #[test]
    fn bounds_without_range_mean_custom() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let params = HistoryParams {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        };
        let plan = plan(params).unwrap();
        assert_eq!(plan.request.selector, RangeSelector::Custom);
        assert_eq!(plan.fetch, Fetch::Window(TimeWindow::new(start, end).unwrap()));
    }

    #[test]
    fn custom_missing_end_fetches_nothing() {
        let params = HistoryParams {
            range: Some("custom".into()),
            start: Some(now()),
            ..Default::default()
        };
        assert_eq!(plan(params).unwrap().fetch, Fetch::Nothing);
    }

    #[test]
    fn unknown_names_are_errors() {
        let bad_range = HistoryParams {
            range: Some("fortnight".into()),
            ..Default::default()
        };
        assert_eq!(plan(bad_range), Err(Error::UnknownRange("fortnight".into())));

        let bad_channel = HistoryParams {
            channel: Some("co2".into()),
            ..Default::default()
        };
        assert_eq!(plan(bad_channel), Err(Error::UnknownChannel("co2".into())));
    }
}
