//! Time-series containers for concurrency samples and violation counts.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// A single concurrency sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyPoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl ConcurrencyPoint {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// Bidirectional lookup between bucket timestamps and positions in a
/// uniformly spaced series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampIndex {
    start_ms: i64,
    bucket_width_ms: i64,
    len: usize,
}

impl TimestampIndex {
    /// Index covering `[start_ms, end_ms)`. A trailing partial bucket counts as one bucket.
    pub fn new(start_ms: i64, end_ms: i64, bucket_width_ms: i64) -> Self {
        let len = if bucket_width_ms <= 0 || end_ms <= start_ms {
            0
        } else {
            let span = end_ms.abs_diff(start_ms);
            let buckets = span.div_ceil(bucket_width_ms.unsigned_abs());
            usize::try_from(buckets).unwrap_or(usize::MAX)
        };
        Self {
            start_ms,
            bucket_width_ms,
            len,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    /// End of the last bucket (exclusive).
    pub fn end_ms(&self) -> i64 {
        let end = self.offset_to_ms(self.len);
        i64::try_from(end).unwrap_or(i64::MAX)
    }

    pub fn bucket_width_ms(&self) -> i64 {
        self.bucket_width_ms
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Position of a bucket start timestamp. Timestamps that are not bucket
    /// starts have no position.
    pub fn index_of(&self, timestamp_ms: i64) -> Option<usize> {
        let offset = self.offset_of(timestamp_ms)?;
        if offset % i128::from(self.bucket_width_ms) != 0 {
            return None;
        }
        self.position(offset)
    }

    /// Position of the bucket containing `timestamp_ms`.
    pub fn bucket_of(&self, timestamp_ms: i64) -> Option<usize> {
        self.position(self.offset_of(timestamp_ms)?)
    }

    /// Start timestamp of the bucket at `index`.
    pub fn timestamp_at(&self, index: usize) -> Option<i64> {
        if index >= self.len {
            return None;
        }
        i64::try_from(self.offset_to_ms(index)).ok()
    }

    /// Bucket start timestamps in order.
    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len).map_while(move |i| self.timestamp_at(i))
    }

    // Offsets are widened to i128 so windows spanning the whole i64 range stay exact.
    fn offset_of(&self, timestamp_ms: i64) -> Option<i128> {
        let offset = i128::from(timestamp_ms) - i128::from(self.start_ms);
        (offset >= 0 && self.bucket_width_ms > 0).then_some(offset)
    }

    fn position(&self, offset: i128) -> Option<usize> {
        let idx = usize::try_from(offset / i128::from(self.bucket_width_ms)).ok()?;
        (idx < self.len).then_some(idx)
    }

    fn offset_to_ms(&self, index: usize) -> i128 {
        i128::from(self.start_ms) + index as i128 * i128::from(self.bucket_width_ms)
    }
}

/// Uniformly spaced concurrency samples covering a resolved window.
///
/// Construction repairs malformed input: samples are sorted when they arrive
/// out of order, several samples in one bucket keep the maximum, samples
/// outside the window are dropped, and empty buckets are zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencySeries {
    index: TimestampIndex,
    points: Vec<ConcurrencyPoint>,
}

impl ConcurrencySeries {
    pub fn from_samples(
        mut samples: Vec<ConcurrencyPoint>,
        start_ms: i64,
        end_ms: i64,
        bucket_width_ms: i64,
    ) -> Self {
        if !samples.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms) {
            warn!(
                "Concurrency samples for [{}, {}) are not strictly increasing; sorting {} samples",
                start_ms,
                end_ms,
                samples.len()
            );
            samples.sort_by_key(|p| p.timestamp_ms);
        }

        let index = TimestampIndex::new(start_ms, end_ms, bucket_width_ms);
        let mut values = vec![0.0_f64; index.len()];
        let mut filled = vec![false; index.len()];
        let mut dropped = 0usize;

        for sample in &samples {
            match index.bucket_of(sample.timestamp_ms) {
                Some(i) if filled[i] => values[i] = values[i].max(sample.value),
                Some(i) => {
                    values[i] = sample.value;
                    filled[i] = true;
                }
                None => dropped += 1,
            }
        }

        let gaps = filled.iter().filter(|f| !**f).count();
        if gaps > 0 {
            debug!("Zero-filled {} of {} buckets", gaps, index.len());
        }
        if dropped > 0 {
            debug!("Dropped {} samples outside [{}, {})", dropped, start_ms, end_ms);
        }

        let points = index
            .timestamps()
            .zip(values)
            .map(|(ts, value)| ConcurrencyPoint::new(ts, value))
            .collect();

        Self { index, points }
    }

    pub fn points(&self) -> &[ConcurrencyPoint] {
        &self.points
    }

    pub fn index(&self) -> &TimestampIndex {
        &self.index
    }

    pub fn bucket_width_ms(&self) -> i64 {
        self.index.bucket_width_ms()
    }

    pub fn start_ms(&self) -> i64 {
        self.index.start_ms()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value of the bucket starting at `timestamp_ms`.
    pub fn value_at(&self, timestamp_ms: i64) -> Option<f64> {
        self.index
            .index_of(timestamp_ms)
            .map(|i| self.points[i].value)
    }
}

/// Sparse violation counts keyed by bucket start. Absent keys count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationIndex {
    counts: BTreeMap<i64, u64>,
}

impl ViolationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` violations at `timestamp_ms`.
    pub fn insert(&mut self, timestamp_ms: i64, count: u64) {
        *self.counts.entry(timestamp_ms).or_insert(0) += count;
    }

    pub fn count_at(&self, timestamp_ms: i64) -> u64 {
        self.counts.get(&timestamp_ms).copied().unwrap_or(0)
    }

    /// Violations in `[start_ms, end_ms)`.
    pub fn count_in(&self, start_ms: i64, end_ms: i64) -> u64 {
        if end_ms <= start_ms {
            return 0;
        }
        self.counts.range(start_ms..end_ms).map(|(_, c)| *c).sum()
    }

    /// Violations attributable to the bucket `[bucket_start_ms, bucket_start_ms + width)`.
    ///
    /// The last bucket of a window also absorbs violations stamped exactly at
    /// `window_end_ms`, which the feed reports on the closing boundary.
    pub fn bucket_count(&self, bucket_start_ms: i64, bucket_width_ms: i64, window_end_ms: i64) -> u64 {
        let bucket_end = bucket_start_ms + bucket_width_ms;
        let mut count = self.count_in(bucket_start_ms, bucket_end.min(window_end_ms));
        if bucket_end >= window_end_ms {
            count += self.count_at(window_end_ms);
        }
        count
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(i64, u64)> for ViolationIndex {
    fn from_iter<I: IntoIterator<Item = (i64, u64)>>(iter: I) -> Self {
        let mut index = ViolationIndex::new();
        for (ts, count) in iter {
            index.insert(ts, count);
        }
        index
    }
}

/// Request volume attributed to one integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationUsage {
    pub name: String,
    pub unallocated_requests: u64,
}

/// Totals reported alongside the violation feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationOverview {
    pub total_requests: u64,
    pub total_violations: u64,
    #[serde(default)]
    pub integrations: Vec<IntegrationUsage>,
}

/// Account-level settings reported alongside the concurrency feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyOverview {
    pub concurrency_limit: f64,
}

/// Concurrency samples for a window as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyFeed {
    pub points: Vec<ConcurrencyPoint>,
    pub overview: ConcurrencyOverview,
}

/// Violation counts for a window as returned by the gateway.
///
/// The overview totals are reported independently of the concurrency feed
/// and are used as-is rather than recomputed from samples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationFeed {
    pub index: ViolationIndex,
    pub overview: ViolationOverview,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::HOUR_MS;
    use proptest::prelude::*;

    #[test]
    fn test_index_lookup_both_ways() {
        let index = TimestampIndex::new(1_000, 1_000 + 4 * HOUR_MS, HOUR_MS);
        assert_eq!(index.len(), 4);
        assert_eq!(index.index_of(1_000 + 2 * HOUR_MS), Some(2));
        assert_eq!(index.timestamp_at(2), Some(1_000 + 2 * HOUR_MS));
        assert_eq!(index.index_of(1_000 + 2 * HOUR_MS + 1), None);
        assert_eq!(index.bucket_of(1_000 + 2 * HOUR_MS + 1), Some(2));
        assert_eq!(index.index_of(1_000 + 4 * HOUR_MS), None);
        assert_eq!(index.index_of(999), None);
        assert_eq!(index.timestamp_at(4), None);
        assert_eq!(index.end_ms(), 1_000 + 4 * HOUR_MS);
    }

    #[test]
    fn test_index_extreme_bounds_do_not_overflow() {
        let index = TimestampIndex::new(i64::MIN, i64::MAX, HOUR_MS);
        assert_eq!(index.len() as u64, u64::MAX.div_ceil(HOUR_MS as u64));
        assert_eq!(index.end_ms(), i64::MAX);
        assert_eq!(index.timestamp_at(0), Some(i64::MIN));
        assert_eq!(index.timestamp_at(1), Some(i64::MIN + HOUR_MS));
        assert_eq!(index.bucket_of(i64::MAX - 1), Some(index.len() - 1));
        assert_eq!(index.index_of(i64::MIN + 3 * HOUR_MS), Some(3));

        let tail = TimestampIndex::new(i64::MAX - 10, i64::MAX, HOUR_MS);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail.timestamps().collect::<Vec<_>>(), vec![i64::MAX - 10]);
    }

    #[test]
    fn test_index_empty_window() {
        let index = TimestampIndex::new(10, 10, HOUR_MS);
        assert!(index.is_empty());
        assert_eq!(index.bucket_of(10), None);
    }

    #[test]
    fn test_series_zero_fills_gaps() {
        let samples = vec![
            ConcurrencyPoint::new(0, 3.0),
            ConcurrencyPoint::new(3 * HOUR_MS, 7.0),
        ];
        let series = ConcurrencySeries::from_samples(samples, 0, 5 * HOUR_MS, HOUR_MS);
        let values: Vec<f64> = series.points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3.0, 0.0, 0.0, 7.0, 0.0]);
    }

    #[test]
    fn test_series_sorts_and_keeps_bucket_max() {
        let samples = vec![
            ConcurrencyPoint::new(HOUR_MS + 10, 2.0),
            ConcurrencyPoint::new(0, 1.0),
            ConcurrencyPoint::new(HOUR_MS + 5, 9.0),
        ];
        let series = ConcurrencySeries::from_samples(samples, 0, 2 * HOUR_MS, HOUR_MS);
        assert_eq!(series.value_at(0), Some(1.0));
        assert_eq!(series.value_at(HOUR_MS), Some(9.0));
    }

    #[test]
    fn test_series_drops_out_of_window_samples() {
        let samples = vec![
            ConcurrencyPoint::new(-HOUR_MS, 50.0),
            ConcurrencyPoint::new(2 * HOUR_MS, 50.0),
        ];
        let series = ConcurrencySeries::from_samples(samples, 0, 2 * HOUR_MS, HOUR_MS);
        assert!(series.points().iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn test_violation_index_absent_is_zero() {
        let index: ViolationIndex = vec![(HOUR_MS, 2), (HOUR_MS, 3)].into_iter().collect();
        assert_eq!(index.count_at(HOUR_MS), 5);
        assert_eq!(index.count_at(0), 0);
        assert_eq!(index.total(), 5);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_violation_on_window_edge_goes_to_last_bucket() {
        let end = 3 * HOUR_MS;
        let index: ViolationIndex = vec![(end, 4), (HOUR_MS + 30, 1)].into_iter().collect();
        assert_eq!(index.bucket_count(2 * HOUR_MS, HOUR_MS, end), 4);
        assert_eq!(index.bucket_count(HOUR_MS, HOUR_MS, end), 1);
        assert_eq!(index.bucket_count(0, HOUR_MS, end), 0);
    }

    proptest! {
        #[test]
        fn prop_zero_fill_keeps_uniform_spacing(
            raw in prop::collection::vec((0i64..48 * HOUR_MS, 0.0f64..100.0), 0..64),
            width_hours in 1i64..4,
        ) {
            let width = width_hours * HOUR_MS;
            let samples = raw.into_iter().map(|(t, v)| ConcurrencyPoint::new(t, v)).collect();
            let series = ConcurrencySeries::from_samples(samples, 0, 48 * HOUR_MS, width);
            prop_assert_eq!(series.len() as i64, (48 * HOUR_MS + width - 1) / width);
            prop_assert_eq!(series.points()[0].timestamp_ms, 0);
            for pair in series.points().windows(2) {
                prop_assert_eq!(pair[1].timestamp_ms - pair[0].timestamp_ms, width);
            }
        }
    }
}
