//! Feed timestamp parsing and clock formatting.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// 2025-01-01T00:00:00Z, stands in for timestamps the feed or a file leaves out
pub(crate) fn placeholder_instant() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_735_689_600)
}

/// Naive layouts accepted in feed timestamps, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a feed timestamp into an absolute instant.
///
/// Strings carrying an offset (`Z`, `+01:00`, ...) are taken as-is. Naive
/// strings are read as wall-clock time in `naive_zone`. A bare date means
/// midnight. Returns `None` for anything else, including wall-clock times
/// that do not exist in `naive_zone`.
pub fn parse_timestamp(value: &str, naive_zone: Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    naive_zone
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// 12-hour clock without a leading zero on the hour: `8:00 PM`, `12:05 AM`.
pub fn format_clock(hour: u32, minute: u32) -> String {
    let hour_12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if hour < 12 { "AM" } else { "PM" };
    format!("{}:{:02} {}", hour_12, minute, meridiem)
}

/// Format an instant as a 12-hour wall-clock time in `zone`.
pub fn format_time(instant: &DateTime<Utc>, zone: Tz) -> String {
    let local = instant.with_timezone(&zone);
    format_clock(local.hour(), local.minute())
}
