//! # Aggregate
//!
//! Downsamples irregular sensor history into one averaged point per bucket.
//! The bucket width follows the requested range (see [`GranularityPolicy`]).
//!
//! Pure and synchronous: every call works on its own input slice and keeps no
//! state between calls.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Granularity, GranularityPolicy, RangeSelector, TimeWindow, TimedValue, is_numeric};

/// What the caller wants to chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationRequest {
    pub selector: RangeSelector,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl AggregationRequest {
    pub fn new(selector: RangeSelector) -> Self {
        Self {
            selector,
            start: None,
            end: None,
        }
    }

    pub fn custom(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            selector: RangeSelector::Custom,
            start,
            end,
        }
    }

    /// The explicit window, if both bounds are present and ordered.
    pub fn window(&self) -> Option<TimeWindow> {
        TimeWindow::new(self.start?, self.end?)
    }
}

/// One chart point: the mean of `count` samples in the bucket starting at `bucket_start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPoint {
    pub bucket_start: DateTime<Utc>,
    pub value: f64,
    pub count: usize,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// Aggregates `samples` for `request` under `policy`.
///
/// - empty input gives empty output for every selector
/// - `Latest` returns the samples sorted by timestamp, values untouched
/// - `Custom` without both bounds (or with `end < start`) gives empty output
/// - otherwise samples are averaged per bucket, see [`bucket_by`]
pub fn aggregate<S: TimedValue>(
    samples: &[S],
    request: &AggregationRequest,
    policy: &GranularityPolicy,
) -> Vec<AggregatedPoint> {
    if samples.is_empty() {
        return Vec::new();
    }
    if request.selector == RangeSelector::Latest {
        return pass_through(samples);
    }
    match policy.granularity(request) {
        Some(granularity) => bucket_by(samples, granularity),
        None => Vec::new(),
    }
}

/// Averages numeric sample values per `granularity` bucket.
///
/// Non-finite values are skipped entirely: they add to neither sum nor count,
/// and a bucket holding only such values produces no point. Output is ordered
/// by `bucket_start` with one point per bucket.
pub fn bucket_by<S: TimedValue>(samples: &[S], granularity: Granularity) -> Vec<AggregatedPoint> {
    let mut buckets: BTreeMap<DateTime<Utc>, Accumulator> = BTreeMap::new();

    for sample in samples {
        let value = sample.value();
        if !is_numeric(value) {
            continue;
        }
        let acc = buckets.entry(granularity.truncate(sample.timestamp())).or_default();
        acc.sum += value;
        acc.count += 1;
    }

    buckets
        .into_iter()
        .map(|(bucket_start, acc)| AggregatedPoint {
            bucket_start,
            value: acc.sum / acc.count as f64,
            count: acc.count,
        })
        .collect()
}

fn pass_through<S: TimedValue>(samples: &[S]) -> Vec<AggregatedPoint> {
    let mut points: Vec<AggregatedPoint> = samples
        .iter()
        .map(|s| AggregatedPoint {
            bucket_start: s.timestamp(),
            value: s.value(),
            count: 1,
        })
        .collect();
    points.sort_by_key(|p| p.bucket_start);
    points
}

/// Holds a [`GranularityPolicy`] for callers that load it from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    policy: GranularityPolicy,
}

impl Aggregator {
    pub fn new(policy: GranularityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GranularityPolicy {
        &self.policy
    }

    pub fn granularity(&self, request: &AggregationRequest) -> Option<Granularity> {
        self.policy.granularity(request)
    }

    pub fn aggregate<S: TimedValue>(&self, samples: &[S], request: &AggregationRequest) -> Vec<AggregatedPoint> {
        aggregate(samples, request, &self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SensorSample;
    use approx::assert_relative_eq;
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;

    fn at(d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, h, mi, 0).unwrap()
    }

    fn sample(ts: DateTime<Utc>, value: f64) -> SensorSample {
        SensorSample::new(ts, value)
    }

    fn run(samples: &[SensorSample], request: AggregationRequest) -> Vec<AggregatedPoint> {
        aggregate(samples, &request, &GranularityPolicy::default())
    }

    #[test]
    fn one_day_buckets_per_hour() {
        let samples = vec![
            sample(at(1, 10, 5), 20.0),
            sample(at(1, 10, 40), 22.0),
            sample(at(1, 11, 10), 24.0),
        ];
        let points = run(&samples, AggregationRequest::new(RangeSelector::OneDay));

        assert_eq!(
            points,
            vec![
                AggregatedPoint { bucket_start: at(1, 10, 0), value: 21.0, count: 2 },
                AggregatedPoint { bucket_start: at(1, 11, 0), value: 24.0, count: 1 },
            ]
        );
    }

    #[test]
    fn non_numeric_values_are_excluded_not_zeroed() {
        let t1 = at(1, 10, 5);
        let samples = vec![sample(t1, 20.0), sample(t1, f64::NAN), sample(t1, 22.0)];
        let points = run(&samples, AggregationRequest::new(RangeSelector::OneDay));

        assert_eq!(points.len(), 1);
        assert_relative_eq!(points[0].value, 21.0);
        assert_eq!(points[0].count, 2);
    }

    #[test]
    fn bucket_of_only_non_numeric_values_is_not_emitted() {
        let samples = vec![
            sample(at(1, 9, 0), f64::NAN),
            sample(at(1, 9, 30), f64::INFINITY),
            sample(at(1, 10, 0), 5.0),
        ];
        let points = run(&samples, AggregationRequest::new(RangeSelector::OneDay));

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].bucket_start, at(1, 10, 0));
    }

    #[test]
    fn empty_input_gives_empty_output_for_every_selector() {
        let empty: Vec<SensorSample> = Vec::new();
        for selector in RangeSelector::ALL {
            let request = AggregationRequest {
                selector,
                start: Some(at(1, 0, 0)),
                end: Some(at(2, 0, 0)),
            };
            assert!(run(&empty, request).is_empty(), "{selector}");
        }
    }

    #[test]
    fn latest_passes_samples_through_sorted() {
        let samples = vec![
            sample(at(1, 12, 0), 3.0),
            sample(at(1, 10, 0), 1.0),
            sample(at(1, 11, 0), f64::NAN),
        ];
        let points = run(&samples, AggregationRequest::new(RangeSelector::Latest));

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].bucket_start, at(1, 10, 0));
        assert_eq!(points[0].value, 1.0);
        assert!(points[1].value.is_nan());
        assert_eq!(points[2].value, 3.0);
        assert!(points.iter().all(|p| p.count == 1));
    }

    #[test]
    fn custom_with_missing_bound_is_empty() {
        let samples = vec![sample(at(1, 10, 0), 1.0)];
        assert!(run(&samples, AggregationRequest::custom(Some(at(1, 0, 0)), None)).is_empty());
        assert!(run(&samples, AggregationRequest::custom(None, Some(at(2, 0, 0)))).is_empty());
    }

    #[test]
    fn custom_with_reversed_bounds_is_empty() {
        let samples = vec![sample(at(1, 10, 0), 1.0)];
        let request = AggregationRequest::custom(Some(at(2, 0, 0)), Some(at(1, 0, 0)));
        assert!(run(&samples, request).is_empty());
    }

    #[test]
    fn short_custom_span_buckets_per_minute() {
        let samples = vec![
            sample(at(1, 10, 0) + TimeDelta::seconds(10), 1.0),
            sample(at(1, 10, 0) + TimeDelta::seconds(50), 3.0),
            sample(at(1, 10, 1), 10.0),
        ];
        let request = AggregationRequest::custom(Some(at(1, 0, 0)), Some(at(1, 12, 0)));
        let points = run(&samples, request);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].bucket_start, at(1, 10, 0));
        assert_relative_eq!(points[0].value, 2.0);
        assert_eq!(points[1].bucket_start, at(1, 10, 1));
    }

    #[test]
    fn long_custom_span_buckets_per_month() {
        let samples = vec![
            sample(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(), 1.0),
            sample(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap(), 3.0),
            sample(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(), 7.0),
        ];
        let request = AggregationRequest::custom(
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap()),
        );
        let points = run(&samples, request);

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].bucket_start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_relative_eq!(points[0].value, 2.0);
        assert_eq!(points[1].bucket_start, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn output_is_strictly_ordered_and_covers_every_numeric_sample() {
        // deliberately unsorted and spread over several days
        let samples: Vec<SensorSample> = (0..200)
            .map(|i| {
                let offset = TimeDelta::minutes((i * 7919) % 20_000);
                let value = if i % 13 == 0 { f64::NAN } else { i as f64 };
                sample(at(1, 0, 0) + offset, value)
            })
            .collect();
        let numeric = samples.iter().filter(|s| s.value.is_finite()).count();

        for selector in [RangeSelector::OneDay, RangeSelector::OneWeek, RangeSelector::OneYear] {
            let points = run(&samples, AggregationRequest::new(selector));
            assert!(points.windows(2).all(|w| w[0].bucket_start < w[1].bucket_start));
            assert_eq!(points.iter().map(|p| p.count).sum::<usize>(), numeric);
        }
    }

    #[test]
    fn rebucketing_midpoints_reproduces_series() {
        let samples: Vec<SensorSample> = (0..500)
            .map(|i| sample(at(1, 0, 0) + TimeDelta::minutes(i * 37), (i % 17) as f64))
            .collect();

        for granularity in [Granularity::Minute, Granularity::Hour, Granularity::Day, Granularity::Month] {
            let first = bucket_by(&samples, granularity);
            let midpoints: Vec<SensorSample> = first
                .iter()
                .map(|p| {
                    let end = granularity.next(p.bucket_start).unwrap();
                    sample(p.bucket_start + (end - p.bucket_start) / 2, p.value)
                })
                .collect();
            let second = bucket_by(&midpoints, granularity);

            let strip = |points: &[AggregatedPoint]| -> Vec<(DateTime<Utc>, f64)> {
                points.iter().map(|p| (p.bucket_start, p.value)).collect()
            };
            assert_eq!(strip(&first), strip(&second), "{granularity}");
        }
    }

    #[test]
    fn aggregator_uses_its_policy() {
        let aggregator = Aggregator::new(GranularityPolicy::new(1, 7, 90));
        let request = AggregationRequest::custom(Some(at(1, 0, 0)), Some(at(1, 12, 0)));
        assert_eq!(aggregator.granularity(&request), Some(Granularity::Hour));

        let samples = vec![sample(at(1, 10, 5), 2.0), sample(at(1, 10, 55), 4.0)];
        let points = aggregator.aggregate(&samples, &request);
        assert_eq!(points.len(), 1);
        assert_relative_eq!(points[0].value, 3.0);
    }
}
