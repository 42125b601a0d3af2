//! Timestamp handling shared by the model and the repositories.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// Naive layouts accepted in addition to RFC 3339. Naive values are read as UTC.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Current wall-clock time, truncated to the microsecond storage precision.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Parse an ISO-8601-like timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`, `2024-05-01T10:00:00+05:30`),
/// naive date-times (`2024-05-01T10:00:00`, `2024-05-01 10:00:00.250`,
/// `2024-05-01T10:00`) and bare dates (`2024-05-01`, midnight UTC).
/// Sub-microsecond digits are dropped.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    parse_utc(raw.trim()).map(|ts| ts.trunc_subsecs(6))
}

fn parse_utc(raw: &str) -> Option<Timestamp> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Storage encoding: microseconds since the UNIX epoch.
pub fn to_micros(ts: &Timestamp) -> i64 {
    ts.timestamp_micros()
}

/// Inverse of [`to_micros`]. `None` if out of chrono's range.
pub fn from_micros(micros: i64) -> Option<Timestamp> {
    DateTime::<Utc>::from_timestamp_micros(micros)
}
