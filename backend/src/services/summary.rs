//! Day x hour aggregation of a multi-day concurrency series.

use log::debug;

use crate::models::time::{TimestampFormatter, DAY_MS};
use crate::models::{ConcurrencySeries, ViolationFeed};
use crate::routes::summary::{HeatCell, SummaryAggregate};
use crate::services::overview::{find_peak, OverviewCalculator};

/// Folds an hourly series and its violation feed into heat cells and overview statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryAggregator {
    formatter: TimestampFormatter,
    calculator: OverviewCalculator,
}

impl SummaryAggregator {
    pub fn new(formatter: TimestampFormatter, calculator: OverviewCalculator) -> Self {
        Self {
            formatter,
            calculator,
        }
    }

    /// One cell per bucket in series order.
    ///
    /// `day_index` counts whole days from the series start, `hour_index` is
    /// the local hour of the bucket. A cell is flagged as violated when the
    /// violation index has a nonzero count inside its bucket.
    pub fn aggregate(
        &self,
        series: &ConcurrencySeries,
        violations: &ViolationFeed,
        limit: f64,
    ) -> SummaryAggregate {
        let index = series.index();
        let width = series.bucket_width_ms();
        let window_end = index.end_ms();

        let matrix: Vec<HeatCell> = series
            .points()
            .iter()
            .map(|point| {
                let offset = point.timestamp_ms - series.start_ms();
                HeatCell {
                    day_index: (offset / DAY_MS) as usize,
                    hour_index: self.formatter.hour_of_day(point.timestamp_ms),
                    value: point.value,
                    start_timestamp_ms: point.timestamp_ms,
                    violated: violations
                        .index
                        .bucket_count(point.timestamp_ms, width, window_end)
                        > 0,
                }
            })
            .collect();

        let values: Vec<f64> = series.points().iter().map(|p| p.value).collect();
        let peak = find_peak(series.points(), series.start_ms());
        let overview = self
            .calculator
            .compute(peak, &values, limit, &violations.overview);

        debug!(
            "Summary aggregated {} cells, {} violated, peak {} at {}",
            matrix.len(),
            matrix.iter().filter(|c| c.violated).count(),
            overview.peak_concurrency.value,
            overview.peak_concurrency.timestamp_ms
        );

        SummaryAggregate { matrix, overview }
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod summary_tests;
