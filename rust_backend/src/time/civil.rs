use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Naive timestamp layouts accepted in the reference tables, tried in order.
/// All of them are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse one reference-table timestamp into a UTC instant.
///
/// Accepts RFC 3339 (any offset) and the pandas-style
/// `YYYY-MM-DD HH:MM:SS.ffffff` layout the tables are written in.
///
/// # Example
/// ```
/// use dawn_calendar::time::parse_reference_timestamp;
/// let t = parse_reference_timestamp("2024-01-25 17:54:00.000000").unwrap();
/// assert_eq!(t.to_rfc3339(), "2024-01-25T17:54:00+00:00");
/// ```
pub fn parse_reference_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // "2024-01-25 17:54:00+00:00" is not RFC 3339 because of the space
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = trimmed.trim_end_matches('Z');
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Express a UTC instant in the civil zone, keeping the explicit offset.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> DateTime<FixedOffset> {
    instant.with_timezone(&tz).fixed_offset()
}

/// Civil date of a UTC instant in the given zone.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// 00:00 UTC on the given date.
pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Instant `hours` after 00:00 UTC of `date`. Ephemeris routines report
/// event times this way, and the offset may fall outside `0..24`.
pub fn hours_after_utc_midnight(date: NaiveDate, hours: f64) -> Option<DateTime<Utc>> {
    if !hours.is_finite() {
        return None;
    }
    let millis = (hours * 3_600_000.0).round() as i64;
    utc_midnight(date).checked_add_signed(Duration::milliseconds(millis))
}

/// `HH:MM` rendering used by the plain-text outputs, `--:--` when absent.
pub fn format_hhmm(instant: Option<&DateTime<FixedOffset>>) -> String {
    instant.map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string())
}
