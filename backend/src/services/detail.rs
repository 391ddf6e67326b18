//! Per-minute aggregation of a single detail window.

use log::{debug, warn};

use crate::models::time::{TimestampFormatter, MINUTE_MS};
use crate::models::{ConcurrencyPoint, ConcurrencySeries, TimestampIndex, ViolationFeed};
use crate::routes::detail::{DetailConfig, DetailData, DetailResultRow};
use crate::services::overview::{find_peak, OverviewCalculator};

#[derive(Debug, Clone, Copy, Default)]
struct MinuteAccumulator {
    sum: f64,
    count: usize,
    peak: f64,
    peak_ms: Option<i64>,
}

impl MinuteAccumulator {
    fn push(&mut self, point: &ConcurrencyPoint) {
        self.sum += point.value;
        self.count += 1;
        let replace = match self.peak_ms {
            None => true,
            Some(ms) => {
                point.value > self.peak || (point.value == self.peak && point.timestamp_ms < ms)
            }
        };
        if replace {
            self.peak = point.value;
            self.peak_ms = Some(point.timestamp_ms);
        }
    }

    fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Folds raw samples of one window into per-minute rows and overview statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailAggregator {
    formatter: TimestampFormatter,
    calculator: OverviewCalculator,
}

impl DetailAggregator {
    pub fn new(formatter: TimestampFormatter, calculator: OverviewCalculator) -> Self {
        Self {
            formatter,
            calculator,
        }
    }

    /// One row per minute of `[start_ms, end_ms)`.
    ///
    /// Rows carry the average and the maximum of their samples. The peak
    /// timestamp is set only when the peak is positive, in the precise
    /// format that drill-down links parse back. Percentages are taken over
    /// the per-minute peaks, zero-filled.
    pub fn aggregate(
        &self,
        samples: &[ConcurrencyPoint],
        start_ms: i64,
        end_ms: i64,
        violations: &ViolationFeed,
        limit: f64,
    ) -> DetailData {
        let index = TimestampIndex::new(start_ms, end_ms, MINUTE_MS);
        let mut minutes = vec![MinuteAccumulator::default(); index.len()];
        let mut in_window = Vec::with_capacity(samples.len());

        if !samples.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms) {
            warn!(
                "Detail samples for [{}, {}) arrived out of order",
                start_ms, end_ms
            );
        }

        for point in samples {
            if let Some(i) = index.bucket_of(point.timestamp_ms) {
                minutes[i].push(point);
                in_window.push(*point);
            }
        }
        if in_window.len() < samples.len() {
            debug!(
                "Ignored {} detail samples outside the window",
                samples.len() - in_window.len()
            );
        }

        let rows: Vec<DetailResultRow> = index
            .timestamps()
            .zip(minutes.iter())
            .map(|(ts, minute)| DetailResultRow {
                start_time_ms: ts,
                end_time_ms: (ts + MINUTE_MS).min(end_ms),
                average_concurrency: minute.average(),
                peak_concurrency: minute.peak,
                peak_concurrency_timestamp: minute
                    .peak_ms
                    .filter(|_| minute.peak > 0.0)
                    .map(|ms| self.formatter.precise(ms)),
            })
            .collect();

        let peak = find_peak(&in_window, start_ms);
        let per_minute = ConcurrencySeries::from_samples(in_window, start_ms, end_ms, MINUTE_MS);
        let values: Vec<f64> = per_minute.points().iter().map(|p| p.value).collect();
        let overview = self
            .calculator
            .compute(peak, &values, limit, &violations.overview);

        DetailData {
            overview,
            config: DetailConfig {
                start_ms,
                end_ms,
                bucket_width_ms: MINUTE_MS,
                concurrency_limit: limit,
                utc_offset_minutes: self.formatter.offset().local_minus_utc() / 60,
            },
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::HOUR_MS;
    use crate::models::ViolationOverview;

    const E: i64 = 1_709_251_200_000 + 5 * HOUR_MS;

    fn p(offset_ms: i64, value: f64) -> ConcurrencyPoint {
        ConcurrencyPoint::new(E + offset_ms, value)
    }

    #[test]
    fn test_one_row_per_minute() {
        let data = DetailAggregator::default().aggregate(
            &[],
            E,
            E + HOUR_MS,
            &ViolationFeed::default(),
            10.0,
        );
        assert_eq!(data.rows.len(), 60);
        assert!(data.rows.iter().all(|r| r.peak_concurrency_timestamp.is_none()));
        assert_eq!(data.rows[59].end_time_ms, E + HOUR_MS);
        assert_eq!(data.overview.peak_concurrency.timestamp_ms, E);
        assert_eq!(data.config.bucket_width_ms, MINUTE_MS);
    }

    #[test]
    fn test_average_and_peak_per_minute() {
        let samples = vec![
            p(1_000, 2.0),
            p(15_000, 6.0),
            p(30_000, 6.0),
            p(45_000, 4.0),
            p(MINUTE_MS + 5_000, 1.0),
        ];
        let formatter = TimestampFormatter::utc();
        let data = DetailAggregator::default().aggregate(
            &samples,
            E,
            E + 3 * MINUTE_MS,
            &ViolationFeed::default(),
            5.0,
        );

        let first = &data.rows[0];
        assert_eq!(first.average_concurrency, 4.5);
        assert_eq!(first.peak_concurrency, 6.0);
        assert_eq!(
            first.peak_concurrency_timestamp.as_deref(),
            Some(formatter.precise(E + 15_000).as_str())
        );
        assert_eq!(data.rows[1].peak_concurrency, 1.0);
        assert!(data.rows[2].peak_concurrency_timestamp.is_none());

        assert_eq!(data.overview.peak_concurrency.value, 6.0);
        assert_eq!(data.overview.peak_concurrency.timestamp_ms, E + 15_000);
        // One of three minutes peaks at or above the limit
        assert_eq!(data.overview.percent_over_limit.value, "33.33");
    }

    #[test]
    fn test_zero_peak_has_no_timestamp() {
        let data = DetailAggregator::default().aggregate(
            &[p(0, 0.0)],
            E,
            E + MINUTE_MS,
            &ViolationFeed::default(),
            5.0,
        );
        assert_eq!(data.rows[0].peak_concurrency, 0.0);
        assert!(data.rows[0].peak_concurrency_timestamp.is_none());
    }

    #[test]
    fn test_violations_only_in_overview() {
        let feed = ViolationFeed {
            index: [(E + 10_000, 4)].into_iter().collect(),
            overview: ViolationOverview {
                total_requests: 40,
                total_violations: 4,
                integrations: vec![],
            },
        };
        let data = DetailAggregator::default().aggregate(&[p(10_000, 3.0)], E, E + MINUTE_MS, &feed, 5.0);
        assert_eq!(data.overview.total_violations, 4);
        assert_eq!(
            data.overview.violation_rate,
            crate::routes::overview::RateValue::Percent("10.00".to_string())
        );
    }

    #[test]
    fn test_offset_in_config() {
        let aggregator = DetailAggregator::new(
            TimestampFormatter::from_offset_minutes(330).unwrap(),
            OverviewCalculator::default(),
        );
        let data = aggregator.aggregate(&[], E, E + MINUTE_MS, &ViolationFeed::default(), 1.0);
        assert_eq!(data.config.utc_offset_minutes, 330);
    }
}
