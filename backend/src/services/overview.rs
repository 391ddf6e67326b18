//! Overview statistics shared by the summary and detail aggregations.

use log::warn;

use crate::models::{ConcurrencyPoint, IntegrationUsage, ViolationOverview};
use crate::routes::overview::{
    OverviewStats, PeakConcurrency, PercentCloseToLimit, PercentOverLimit, RateValue,
    TopIntegration,
};

/// Close-to-limit band, as percentages of the concurrency limit.
///
/// A bucket is close to the limit when its value lies in
/// `[lower_pct% * limit, upper_pct% * limit)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitBand {
    lower_pct: f64,
    upper_pct: f64,
}

impl LimitBand {
    pub fn new(lower_pct: f64, upper_pct: f64) -> Result<Self, String> {
        if !lower_pct.is_finite() || !upper_pct.is_finite() {
            return Err("close-to-limit bounds must be finite".to_string());
        }
        if lower_pct < 0.0 || lower_pct >= upper_pct {
            return Err(format!(
                "close-to-limit band [{}%, {}%) is empty or negative",
                lower_pct, upper_pct
            ));
        }
        Ok(Self {
            lower_pct,
            upper_pct,
        })
    }

    pub fn lower_bound(&self, limit: f64) -> f64 {
        limit * self.lower_pct / 100.0
    }

    pub fn upper_bound(&self, limit: f64) -> f64 {
        limit * self.upper_pct / 100.0
    }
}

impl Default for LimitBand {
    fn default() -> Self {
        Self {
            lower_pct: 90.0,
            upper_pct: 100.0,
        }
    }
}

/// Global maximum; ties resolve to the earliest timestamp.
///
/// An empty slice yields a zero peak at `window_start_ms`.
pub fn find_peak(points: &[ConcurrencyPoint], window_start_ms: i64) -> PeakConcurrency {
    let mut peak = PeakConcurrency {
        value: 0.0,
        timestamp_ms: window_start_ms,
    };
    let mut seen = false;

    for point in points {
        let better = !seen
            || point.value > peak.value
            || (point.value == peak.value && point.timestamp_ms < peak.timestamp_ms);
        if better {
            peak = PeakConcurrency {
                value: point.value,
                timestamp_ms: point.timestamp_ms,
            };
            seen = true;
        }
    }

    peak
}

/// Percentage rounded to two decimals.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}", value)
}

/// Percentage of `values` matching `predicate`, formatted. Empty input is `"0.00"`.
pub fn percent_of(values: &[f64], predicate: impl Fn(f64) -> bool) -> String {
    if values.is_empty() {
        return format_percent(0.0);
    }
    let hits = values.iter().filter(|v| predicate(**v)).count();
    format_percent(hits as f64 * 100.0 / values.len() as f64)
}

/// Violations per request as a percentage; not applicable without requests.
pub fn violation_rate(total_violations: u64, total_requests: u64) -> RateValue {
    if total_requests == 0 {
        return RateValue::NotApplicable;
    }
    RateValue::Percent(format_percent(
        total_violations as f64 * 100.0 / total_requests as f64,
    ))
}

/// Integrations with positive volume, by count descending then name ascending.
pub fn rank_integrations(usage: &[IntegrationUsage], limit: usize) -> Vec<TopIntegration> {
    let mut ranked: Vec<TopIntegration> = usage
        .iter()
        .filter(|u| u.unallocated_requests > 0)
        .map(|u| TopIntegration {
            name: u.name.clone(),
            request_count: u.unallocated_requests,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.request_count
            .cmp(&a.request_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked.truncate(limit);
    ranked
}

/// Builds [`OverviewStats`] from bucket values and the violation feed totals.
#[derive(Debug, Clone, Copy)]
pub struct OverviewCalculator {
    band: LimitBand,
    top_integrations: usize,
}

impl OverviewCalculator {
    pub fn new(band: LimitBand, top_integrations: usize) -> Self {
        Self {
            band,
            top_integrations,
        }
    }

    /// # Arguments
    /// * `peak` - Peak of the window, see [`find_peak`]
    /// * `bucket_values` - One value per bucket, zero-filled
    /// * `limit` - Concurrency limit of the account
    /// * `violations` - Totals reported by the violation feed
    pub fn compute(
        &self,
        peak: PeakConcurrency,
        bucket_values: &[f64],
        limit: f64,
        violations: &ViolationOverview,
    ) -> OverviewStats {
        let lower = self.band.lower_bound(limit);
        let upper = self.band.upper_bound(limit);

        let total_requests = violations.total_requests;
        let total_violations = if violations.total_violations > total_requests {
            warn!(
                "Violation feed reports {} violations for {} requests; clamping",
                violations.total_violations, total_requests
            );
            total_requests
        } else {
            violations.total_violations
        };

        OverviewStats {
            concurrency_limit: limit,
            peak_concurrency: peak,
            percent_close_to_limit: PercentCloseToLimit {
                value: percent_of(bucket_values, |v| v >= lower && v < upper),
                lower_bound: lower,
                upper_bound: upper,
            },
            percent_over_limit: PercentOverLimit {
                value: percent_of(bucket_values, |v| v >= limit),
                bound: limit,
            },
            total_requests,
            total_violations,
            violation_rate: violation_rate(total_violations, total_requests),
            top_integrations: rank_integrations(&violations.integrations, self.top_integrations),
        }
    }
}

impl Default for OverviewCalculator {
    fn default() -> Self {
        Self::new(LimitBand::default(), 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn usage(name: &str, count: u64) -> IntegrationUsage {
        IntegrationUsage {
            name: name.to_string(),
            unallocated_requests: count,
        }
    }

    #[test]
    fn test_find_peak_empty_is_zero_at_window_start() {
        let peak = find_peak(&[], 42);
        assert_eq!(peak.value, 0.0);
        assert_eq!(peak.timestamp_ms, 42);
    }

    #[test]
    fn test_find_peak_tie_takes_earliest() {
        let points = vec![
            ConcurrencyPoint::new(30, 5.0),
            ConcurrencyPoint::new(10, 5.0),
            ConcurrencyPoint::new(20, 3.0),
        ];
        let peak = find_peak(&points, 0);
        assert_eq!(peak.value, 5.0);
        assert_eq!(peak.timestamp_ms, 10);
    }

    #[test]
    fn test_band_validation() {
        assert!(LimitBand::new(90.0, 100.0).is_ok());
        assert!(LimitBand::new(100.0, 100.0).is_err());
        assert!(LimitBand::new(-1.0, 100.0).is_err());
        assert!(LimitBand::new(f64::NAN, 100.0).is_err());
    }

    #[test]
    fn test_violation_rate_guard() {
        assert_eq!(violation_rate(0, 0), RateValue::NotApplicable);
        assert_eq!(violation_rate(1, 8), RateValue::Percent("12.50".to_string()));
    }

    #[test]
    fn test_rank_integrations() {
        let ranked = rank_integrations(
            &[usage("zeta", 4), usage("alpha", 4), usage("idle", 0), usage("big", 9)],
            5,
        );
        let names: Vec<&str> = ranked.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["big", "alpha", "zeta"]);

        assert_eq!(rank_integrations(&[usage("a", 1), usage("b", 2)], 1).len(), 1);
    }

    #[test]
    fn test_compute_bands() {
        let calculator = OverviewCalculator::default();
        let values = vec![0.0, 18.0, 20.0, 25.0];
        let stats = calculator.compute(
            find_peak(&[], 0),
            &values,
            20.0,
            &ViolationOverview::default(),
        );
        assert_eq!(stats.percent_close_to_limit.value, "25.00");
        assert_eq!(stats.percent_close_to_limit.lower_bound, 18.0);
        assert_eq!(stats.percent_close_to_limit.upper_bound, 20.0);
        assert_eq!(stats.percent_over_limit.value, "50.00");
        assert_eq!(stats.violation_rate, RateValue::NotApplicable);
    }

    #[test]
    fn test_compute_clamps_violations_to_requests() {
        let stats = OverviewCalculator::default().compute(
            find_peak(&[], 0),
            &[],
            10.0,
            &ViolationOverview {
                total_requests: 3,
                total_violations: 7,
                integrations: vec![],
            },
        );
        assert_eq!(stats.total_violations, 3);
        assert!(stats.total_violations <= stats.total_requests);
        assert_eq!(stats.percent_over_limit.value, "0.00");
    }

    proptest! {
        #[test]
        fn prop_peak_is_max_and_earliest(values in prop::collection::vec(0u8..20, 1..100)) {
            let points: Vec<ConcurrencyPoint> = values
                .iter()
                .enumerate()
                .map(|(i, v)| ConcurrencyPoint::new(i as i64 * 1000, *v as f64))
                .collect();
            let peak = find_peak(&points, 0);
            let max = values.iter().copied().max().unwrap() as f64;
            let first = values.iter().position(|v| *v as f64 == max).unwrap() as i64 * 1000;
            prop_assert_eq!(peak.value, max);
            prop_assert_eq!(peak.timestamp_ms, first);
        }
    }
}
