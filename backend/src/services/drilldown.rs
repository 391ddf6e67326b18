//! Drill-down links between the summary, detail and request views.
//!
//! Links are the only state carried from one view to the next. Encoding and
//! decoding live side by side in this module: every `path()` has a matching
//! `decode()`/`from_path()` that recovers the exact same coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::models::time::{TimestampFormatter, HOUR_MS};
use crate::routes::detail::DetailResultRow;
use crate::routes::summary::HeatCell;
use crate::services::time_range::TimeRangeSelection;

/// Route segment of the detail view.
pub const DETAIL_ROUTE: &str = "concurrencyDetail";
/// Route segment of the request view.
pub const REQUEST_ROUTE: &str = "concurrencyRequest";

/// Widest detail window: one summary bucket.
pub const MAX_DETAIL_SPAN_MS: i64 = HOUR_MS;
/// Widest request window. Links from detail rows cover one minute.
pub const MAX_REQUEST_SPAN_MS: i64 = HOUR_MS;

/// Coordinates of a detail view: `/concurrencyDetail/:startMs/:endMs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailLink {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DetailLink {
    pub fn path(&self) -> String {
        format!("/{}/{}/{}", DETAIL_ROUTE, self.start_ms, self.end_ms)
    }

    /// Decode route parameters. Both are required.
    pub fn decode(start: Option<&str>, end: Option<&str>) -> AnalyticsResult<Self> {
        let link = Self {
            start_ms: parse_ms("start_ms", start)?,
            end_ms: parse_ms("end_ms", end)?,
        };
        link.validate()?;
        Ok(link)
    }

    /// Check that the window is ordered and no wider than one summary bucket.
    pub fn validate(&self) -> AnalyticsResult<()> {
        check_window(self.start_ms, self.end_ms, MAX_DETAIL_SPAN_MS)
    }

    pub fn from_path(path: &str) -> AnalyticsResult<Self> {
        let segments = route_segments(path, DETAIL_ROUTE)?;
        if segments.len() > 2 {
            return Err(AnalyticsError::InvalidLinkParameters(format!(
                "unexpected trailing segments in {}",
                path
            )));
        }
        Self::decode(segments.first().copied(), segments.get(1).copied())
    }

    pub fn selection(&self) -> TimeRangeSelection {
        TimeRangeSelection::ExplicitRange {
            start_ms: self.start_ms,
            end_ms: self.end_ms,
        }
    }
}

/// Peak value of a minute and the instant it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakCoordinate {
    pub value: f64,
    pub time_ms: i64,
}

/// Coordinates of a request view:
/// `/concurrencyRequest/:startMs/:endMs/:peakValue?/:peakTimeMs?`.
///
/// The peak segments are omitted together when the minute had no concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestLink {
    pub start_ms: i64,
    pub end_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<PeakCoordinate>,
}

impl RequestLink {
    pub fn path(&self) -> String {
        match self.peak {
            Some(peak) => format!(
                "/{}/{}/{}/{}/{}",
                REQUEST_ROUTE, self.start_ms, self.end_ms, peak.value, peak.time_ms
            ),
            None => format!("/{}/{}/{}", REQUEST_ROUTE, self.start_ms, self.end_ms),
        }
    }

    /// Decode route parameters. The peak pair is optional but must be complete.
    pub fn decode(
        start: Option<&str>,
        end: Option<&str>,
        peak_value: Option<&str>,
        peak_time: Option<&str>,
    ) -> AnalyticsResult<Self> {
        let start_ms = parse_ms("start_ms", start)?;
        let end_ms = parse_ms("end_ms", end)?;
        check_window(start_ms, end_ms, MAX_REQUEST_SPAN_MS)?;

        let peak = match (peak_value, peak_time) {
            (None, None) => None,
            (Some(value), Some(time)) => Some(PeakCoordinate {
                value: parse_value("peak_value", value)?,
                time_ms: parse_ms("peak_time_ms", Some(time))?,
            }),
            (Some(_), None) => {
                return Err(AnalyticsError::InvalidLinkParameters(
                    "peak_value given without peak_time_ms".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(AnalyticsError::InvalidLinkParameters(
                    "peak_time_ms given without peak_value".to_string(),
                ))
            }
        };

        Ok(Self {
            start_ms,
            end_ms,
            peak,
        })
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        check_window(self.start_ms, self.end_ms, MAX_REQUEST_SPAN_MS)
    }

    pub fn from_path(path: &str) -> AnalyticsResult<Self> {
        let segments = route_segments(path, REQUEST_ROUTE)?;
        if segments.len() > 4 {
            return Err(AnalyticsError::InvalidLinkParameters(format!(
                "unexpected trailing segments in {}",
                path
            )));
        }
        Self::decode(
            segments.first().copied(),
            segments.get(1).copied(),
            segments.get(2).copied(),
            segments.get(3).copied(),
        )
    }

    pub fn selection(&self) -> TimeRangeSelection {
        TimeRangeSelection::ExplicitRange {
            start_ms: self.start_ms,
            end_ms: self.end_ms,
        }
    }
}

/// Computes the link of the next view from a selected cell or row.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrillDownLinker {
    formatter: TimestampFormatter,
}

impl DrillDownLinker {
    pub fn new(formatter: TimestampFormatter) -> Self {
        Self { formatter }
    }

    /// Detail window covering the summary bucket of `cell`.
    pub fn to_detail_link(&self, cell: &HeatCell) -> AnalyticsResult<DetailLink> {
        let end_ms = cell
            .start_timestamp_ms
            .checked_add(HOUR_MS)
            .ok_or_else(|| {
                AnalyticsError::InvalidLinkParameters(format!(
                    "bucket at {} has no representable end",
                    cell.start_timestamp_ms
                ))
            })?;
        Ok(DetailLink {
            start_ms: cell.start_timestamp_ms,
            end_ms,
        })
    }

    /// Request window of a detail row, with the row's peak when it has one.
    ///
    /// The peak instant is recovered by parsing the row's formatted
    /// timestamp, so it must have been produced by the same formatter.
    pub fn to_request_link(&self, row: &DetailResultRow) -> AnalyticsResult<RequestLink> {
        let peak = match row.peak_concurrency_timestamp.as_deref() {
            Some(text) => {
                let time_ms = self.formatter.parse_precise(text).ok_or_else(|| {
                    AnalyticsError::InvalidLinkParameters(format!(
                        "unparseable peak timestamp '{}'",
                        text
                    ))
                })?;
                Some(PeakCoordinate {
                    value: row.peak_concurrency,
                    time_ms,
                })
            }
            None => None,
        };

        Ok(RequestLink {
            start_ms: row.start_time_ms,
            end_ms: row.end_time_ms,
            peak,
        })
    }
}

fn route_segments<'a>(path: &'a str, route: &str) -> AnalyticsResult<Vec<&'a str>> {
    let mut segments = path.trim_matches('/').split('/');
    match segments.next() {
        Some(first) if first == route => Ok(segments.filter(|s| !s.is_empty()).collect()),
        _ => Err(AnalyticsError::InvalidLinkParameters(format!(
            "'{}' is not a {} link",
            path, route
        ))),
    }
}

fn parse_value(name: &str, raw: &str) -> AnalyticsResult<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(AnalyticsError::InvalidLinkParameters(format!(
            "{} '{}' is not a finite number",
            name, raw
        ))),
    }
}

fn parse_ms(name: &str, raw: Option<&str>) -> AnalyticsResult<i64> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AnalyticsError::InvalidLinkParameters(format!("missing {}", name)))?;

    if let Ok(ms) = raw.trim().parse::<i64>() {
        return Ok(ms);
    }
    let value = parse_value(name, raw)?;
    if value.fract() != 0.0 || value.abs() >= i64::MAX as f64 {
        return Err(AnalyticsError::InvalidLinkParameters(format!(
            "{} '{}' is not a whole millisecond value",
            name, raw
        )));
    }
    Ok(value as i64)
}

fn check_window(start_ms: i64, end_ms: i64, max_span_ms: i64) -> AnalyticsResult<()> {
    if start_ms >= end_ms {
        return Err(AnalyticsError::InvalidLinkParameters(format!(
            "start_ms {} is not before end_ms {}",
            start_ms, end_ms
        )));
    }
    match end_ms.checked_sub(start_ms) {
        Some(span) if span <= max_span_ms => Ok(()),
        _ => Err(AnalyticsError::InvalidLinkParameters(format!(
            "window [{}, {}) is wider than {} ms",
            start_ms, end_ms, max_span_ms
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::time::MINUTE_MS;

    const E: i64 = 1_709_251_200_000;

    fn row(peak: f64, peak_time: Option<i64>) -> DetailResultRow {
        let formatter = TimestampFormatter::from_offset_minutes(-300).unwrap();
        DetailResultRow {
            start_time_ms: E,
            end_time_ms: E + MINUTE_MS,
            average_concurrency: peak / 2.0,
            peak_concurrency: peak,
            peak_concurrency_timestamp: peak_time.map(|t| formatter.precise(t)),
        }
    }

    #[test]
    fn test_detail_link_from_cell() {
        let cell = HeatCell {
            day_index: 0,
            hour_index: 5,
            value: 3.0,
            start_timestamp_ms: E + 5 * HOUR_MS,
            violated: false,
        };
        let link = DrillDownLinker::default().to_detail_link(&cell).unwrap();
        assert_eq!(link.start_ms, E + 5 * HOUR_MS);
        assert_eq!(link.end_ms, E + 6 * HOUR_MS);
        assert_eq!(
            link.path(),
            format!("/concurrencyDetail/{}/{}", E + 5 * HOUR_MS, E + 6 * HOUR_MS)
        );
        assert_eq!(DetailLink::from_path(&link.path()).unwrap(), link);
    }

    #[test]
    fn test_request_link_round_trip_with_peak() {
        let linker = DrillDownLinker::new(TimestampFormatter::from_offset_minutes(-300).unwrap());
        let peak_time = E + 17_345;
        let link = linker.to_request_link(&row(7.5, Some(peak_time))).unwrap();

        let decoded = RequestLink::from_path(&link.path()).unwrap();
        assert_eq!(decoded, link);
        assert_eq!(decoded.start_ms, E);
        assert_eq!(decoded.end_ms, E + MINUTE_MS);
        assert_eq!(decoded.peak.unwrap().time_ms, peak_time);
        assert_eq!(decoded.peak.unwrap().value, 7.5);
    }

    #[test]
    fn test_request_link_without_peak_omits_segments() {
        let link = DrillDownLinker::default().to_request_link(&row(0.0, None)).unwrap();
        assert!(link.peak.is_none());
        assert_eq!(link.path(), format!("/concurrencyRequest/{}/{}", E, E + MINUTE_MS));

        let decoded = RequestLink::from_path(&link.path()).unwrap();
        assert_eq!(decoded, link);
    }

    #[test]
    fn test_missing_coordinates_fail() {
        assert!(matches!(
            DetailLink::decode(Some("1"), None),
            Err(AnalyticsError::InvalidLinkParameters(_))
        ));
        assert!(DetailLink::decode(None, Some("2")).is_err());
        assert!(RequestLink::decode(Some("1"), Some("2"), Some("3"), None).is_err());
        assert!(RequestLink::decode(Some("1"), Some("2"), None, Some("3")).is_err());
        assert!(RequestLink::from_path("/concurrencyRequest/1").is_err());
    }

    #[test]
    fn test_non_finite_and_unordered_rejected() {
        assert!(DetailLink::decode(Some("NaN"), Some("2")).is_err());
        assert!(DetailLink::decode(Some("1"), Some("inf")).is_err());
        assert!(DetailLink::decode(Some("1.5"), Some("2")).is_err());
        assert!(DetailLink::decode(Some("abc"), Some("2")).is_err());
        assert!(DetailLink::decode(Some("5"), Some("5")).is_err());
        assert!(RequestLink::decode(Some("1"), Some("2"), Some("NaN"), Some("1")).is_err());
    }

    #[test]
    fn test_wrong_route_rejected() {
        assert!(DetailLink::from_path("/concurrencyRequest/1/2").is_err());
        assert!(DetailLink::from_path("/concurrencyDetail/1/2/3").is_err());
        assert_eq!(
            DetailLink::from_path("concurrencyDetail/1/2/").unwrap(),
            DetailLink { start_ms: 1, end_ms: 2 }
        );
    }

    #[test]
    fn test_oversized_windows_rejected() {
        let too_wide = DetailLink::decode(Some("0"), Some("1000000000000000"));
        assert!(matches!(too_wide, Err(AnalyticsError::InvalidLinkParameters(_))));

        let full_range = DetailLink::from_path(&format!(
            "/concurrencyDetail/{}/{}",
            i64::MIN,
            i64::MAX
        ));
        assert!(matches!(full_range, Err(AnalyticsError::InvalidLinkParameters(_))));

        assert!(DetailLink::decode(Some("0"), Some(&HOUR_MS.to_string())).is_ok());
        assert!(DetailLink::decode(Some("0"), Some(&(HOUR_MS + 1).to_string())).is_err());
        assert!(DetailLink { start_ms: 0, end_ms: 2 * HOUR_MS }.validate().is_err());

        let request = format!("/concurrencyRequest/{}/{}", i64::MIN, i64::MAX);
        assert!(RequestLink::from_path(&request).is_err());
        assert!(RequestLink::decode(Some("0"), Some("86400000"), None, None).is_err());
    }

    #[test]
    fn test_detail_link_at_end_of_time() {
        let cell = HeatCell {
            day_index: 0,
            hour_index: 0,
            value: 0.0,
            start_timestamp_ms: i64::MAX - 1,
            violated: false,
        };
        assert!(matches!(
            DrillDownLinker::default().to_detail_link(&cell),
            Err(AnalyticsError::InvalidLinkParameters(_))
        ));
    }

    #[test]
    fn test_float_millis_at_i64_limit_rejected() {
        // 2^63 parses as a float but has no i64 representation
        assert!(
            DetailLink::decode(Some("9223372036854775808.0"), Some("9223372036854775807")).is_err()
        );
        assert_eq!(
            DetailLink::decode(Some("1000.0"), Some("2000")).unwrap(),
            DetailLink { start_ms: 1000, end_ms: 2000 }
        );
    }

    #[test]
    fn test_unparseable_row_timestamp() {
        let mut bad = row(3.0, Some(E));
        bad.peak_concurrency_timestamp = Some("yesterday".to_string());
        assert!(DrillDownLinker::default().to_request_link(&bad).is_err());
    }
}
