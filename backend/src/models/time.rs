use chrono::{DateTime, Duration, FixedOffset, Offset, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One minute in milliseconds.
pub const MINUTE_MS: i64 = 60_000;
/// One hour in milliseconds.
pub const HOUR_MS: i64 = 3_600_000;
/// One day in milliseconds.
pub const DAY_MS: i64 = 86_400_000;

/// Pattern used for request and row timestamps shown to the operator.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Pattern used for timestamps that travel back into drill-down links.
/// Keeps milliseconds and the offset so parsing recovers the exact instant.
pub const PRECISE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

const HOUR_LABEL_FORMAT: &str = "%-I %p";
const DATE_LABEL_FORMAT: &str = "%Y-%m-%d";

/// The three zoom levels of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Summary,
    Detail,
    Request,
}

impl ViewKind {
    /// Bucket width for the view. The request view lists raw records and has none.
    pub fn bucket_width_ms(&self) -> Option<i64> {
        match self {
            ViewKind::Summary => Some(HOUR_MS),
            ViewKind::Detail => Some(MINUTE_MS),
            ViewKind::Request => None,
        }
    }
}

/// Renders and parses millisecond timestamps in a fixed UTC offset.
///
/// Every view of one deployment shares the same offset, so calendar
/// positions (day boundaries, hour of day) agree between aggregation,
/// display and drill-down decoding.
///
/// The offset does not follow daylight saving time. Deployments in a zone
/// with DST see local midnight and hour labels shifted by one hour for the
/// part of the year their configured offset does not cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampFormatter {
    offset: FixedOffset,
}

impl TimestampFormatter {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Formatter for UTC.
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Create from an offset east of UTC expressed in minutes.
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, String> {
        FixedOffset::east_opt(minutes * 60)
            .map(Self::new)
            .ok_or_else(|| format!("UTC offset of {} minutes is out of range", minutes))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Convert epoch milliseconds to a local date-time.
    pub fn to_local(&self, ms: i64) -> Option<DateTime<FixedOffset>> {
        self.offset.timestamp_millis_opt(ms).single()
    }

    /// Human-readable timestamp, second precision.
    pub fn display(&self, ms: i64) -> String {
        self.format_with(ms, DISPLAY_FORMAT)
    }

    /// Millisecond-precise timestamp that [`parse_precise`](Self::parse_precise) inverts.
    pub fn precise(&self, ms: i64) -> String {
        self.format_with(ms, PRECISE_FORMAT)
    }

    /// Parse a string produced by [`precise`](Self::precise) back to epoch milliseconds.
    pub fn parse_precise(&self, text: &str) -> Option<i64> {
        DateTime::parse_from_str(text, PRECISE_FORMAT)
            .ok()
            .map(|dt| dt.timestamp_millis())
    }

    /// Hour-of-day label, e.g. `"5 AM"`.
    pub fn hour_label(&self, ms: i64) -> String {
        self.format_with(ms, HOUR_LABEL_FORMAT)
    }

    /// Calendar date label, e.g. `"2024-03-01"`.
    pub fn date_label(&self, ms: i64) -> String {
        self.format_with(ms, DATE_LABEL_FORMAT)
    }

    /// Local hour of day (0-23).
    pub fn hour_of_day(&self, ms: i64) -> u32 {
        self.to_local(ms).map(|dt| dt.hour()).unwrap_or(0)
    }

    /// Epoch milliseconds of the local midnight that starts the day after `now`.
    pub fn next_local_midnight(&self, now: DateTime<Utc>) -> Option<i64> {
        let tomorrow = now.with_timezone(&self.offset).date_naive() + Duration::days(1);
        let midnight = tomorrow.and_hms_opt(0, 0, 0)?;
        self.offset
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.timestamp_millis())
    }

    fn format_with(&self, ms: i64, pattern: &str) -> String {
        match self.to_local(ms) {
            Some(dt) => dt.format(pattern).to_string(),
            None => ms.to_string(),
        }
    }
}

impl Default for TimestampFormatter {
    fn default() -> Self {
        Self::utc()
    }
}
