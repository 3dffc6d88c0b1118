//! Query time window: parsing user supplied instants and resolving the
//! `[start, end)` range a run queries.

use chrono::{
    DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use serde::Serializer;
use std::time::Duration;
use thiserror::Error;

const ISO8601_UTC: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("unrecognised time '{0}' (expected RFC 3339, YYYY-MM-DD or YYYYMMDD with optional offset)")]
    Unrecognised(String),
    #[error("invalid UTC offset '{offset}' in '{input}'")]
    InvalidOffset { input: String, offset: String },
    #[error("'{0}' does not exist in the given offset")]
    Nonexistent(String),
    #[error("duration {0:?} is too large for a time window")]
    DurationOutOfRange(Duration),
}

/// The `[start, end)` range every query of a run is scoped to.
///
/// Both instants are whole seconds in UTC. A window may be empty or inverted
/// when built; the quota guard rejects those before anything is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: truncate_to_second(start),
            end: truncate_to_second(end),
        }
    }

    /// The window of length `before` ending at `end`
    pub fn ending_at(end: DateTime<Utc>, before: Duration) -> Result<Self, TimeParseError> {
        let span = ChronoDuration::from_std(before)
            .map_err(|_| TimeParseError::DurationOutOfRange(before))?;
        let start = end
            .checked_sub_signed(span)
            .ok_or(TimeParseError::DurationOutOfRange(before))?;
        Ok(Self::new(start, end))
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `end - start`; zero or negative for an empty or inverted window
    pub fn duration(&self) -> ChronoDuration {
        self.end - self.start
    }

    pub fn start_unix(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_unix(&self) -> i64 {
        self.end.timestamp()
    }
}

fn truncate_to_second(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(instant.timestamp(), 0).unwrap_or(instant)
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SSZ`
pub fn iso8601_utc(instant: &DateTime<Utc>) -> String {
    instant.format(ISO8601_UTC).to_string()
}

/// serde adapter writing instants with [`iso8601_utc`]
pub fn serialize_iso8601_utc<S: Serializer>(
    instant: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&instant.format(ISO8601_UTC))
}

/// Parse a user supplied instant.
///
/// Accepted forms:
/// - RFC 3339: `2020-08-16T00:00:00+09:00`, `2020-08-16T00:00:00Z`
/// - naive date-time, read as UTC: `2020-08-16T00:00:00`
/// - date, midnight UTC: `2020-08-16`, `20200816`
/// - date with offset, midnight in that offset: `2020-08-16+09:00`, `20200816+09:00`
pub fn parse_time(input: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let input = input.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }

    let (date, offset) = split_date(input)
        .ok_or_else(|| TimeParseError::Unrecognised(input.to_string()))?;

    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| TimeParseError::Unrecognised(input.to_string()))?;

    if offset.is_empty() || offset == "Z" {
        return Ok(midnight.and_utc());
    }

    let offset_value = parse_offset(offset).ok_or_else(|| TimeParseError::InvalidOffset {
        input: input.to_string(),
        offset: offset.to_string(),
    })?;

    offset_value
        .from_local_datetime(&midnight)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| TimeParseError::Nonexistent(input.to_string()))
}

/// Split `2020-08-16+09:00` / `20200816+09:00` into the date and whatever follows it
fn split_date(input: &str) -> Option<(NaiveDate, &str)> {
    for (format, width) in [("%Y-%m-%d", 10), ("%Y%m%d", 8)] {
        if !input.is_char_boundary(width.min(input.len())) || input.len() < width {
            continue;
        }
        let (date, rest) = input.split_at(width);
        if let Ok(date) = NaiveDate::parse_from_str(date, format) {
            return Some((date, rest));
        }
    }
    None
}

/// Parse `+09:00`, `-0530` or `+09`
fn parse_offset(offset: &str) -> Option<FixedOffset> {
    let (sign, digits) = match offset.as_bytes().first()? {
        b'+' => (1, &offset[1..]),
        b'-' => (-1, &offset[1..]),
        _ => return None,
    };

    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };

    if minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// How the window was asked for, before resolution against the clock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSpec {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub before: Option<Duration>,
}

impl WindowSpec {
    /// Resolve against `now`: `end` defaults to `now`, and exactly one of
    /// `start` or `before` fixes the other edge.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<TimeWindow, WindowSpecError> {
        let end = self.end.unwrap_or(now);
        match (self.start, self.before) {
            (Some(start), None) => Ok(TimeWindow::new(start, end)),
            (None, Some(before)) => Ok(TimeWindow::ending_at(end, before)?),
            (Some(_), Some(_)) => Err(WindowSpecError::Conflicting),
            (None, None) => Err(WindowSpecError::Missing),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowSpecError {
    #[error("time window needs either --start or --before")]
    Missing,
    #[error("--start and --before cannot be combined")]
    Conflicting,
    #[error(transparent)]
    Time(#[from] TimeParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_formats() {
        let cases = [
            ("2020-08-16", "2020-08-16T00:00:00Z"),
            ("2020-08-16+09:00", "2020-08-15T15:00:00Z"),
            ("2020-08-16T00:00:00+09:00", "2020-08-15T15:00:00Z"),
            ("2020-08-16T00:00:00Z", "2020-08-16T00:00:00Z"),
            ("20200816", "2020-08-16T00:00:00Z"),
            ("20200816+09:00", "2020-08-15T15:00:00Z"),
            ("2020-08-16T12:30:00", "2020-08-16T12:30:00Z"),
            ("2020-08-16-0530", "2020-08-16T05:30:00Z"),
        ];

        for (input, expected) in cases {
            let parsed = parse_time(input).unwrap_or_else(|e| panic!("{}: {}", input, e));
            assert_eq!(iso8601_utc(&parsed), expected, "input: {}", input);
        }
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(matches!(
            parse_time("yesterday"),
            Err(TimeParseError::Unrecognised(_))
        ));
        assert!(matches!(
            parse_time("2020-08-16+9h"),
            Err(TimeParseError::InvalidOffset { .. })
        ));
        assert!(matches!(
            parse_time("2020-13-01"),
            Err(TimeParseError::Unrecognised(_))
        ));
    }

    #[test]
    fn test_window_truncates_to_seconds() {
        let start = DateTime::from_timestamp(1_597_536_000, 999_000_000).unwrap();
        let end = DateTime::from_timestamp(1_597_539_600, 1).unwrap();
        let window = TimeWindow::new(start, end);

        assert_eq!(window.start_unix(), 1_597_536_000);
        assert_eq!(window.end_unix(), 1_597_539_600);
        assert_eq!(window.duration(), ChronoDuration::hours(1));
    }

    #[test]
    fn test_window_spec_before() {
        let now = parse_time("2020-08-16T12:00:00Z").unwrap();
        let spec = WindowSpec {
            before: Some(Duration::from_secs(3600)),
            ..Default::default()
        };

        let window = spec.resolve(now).unwrap();

        assert_eq!(iso8601_utc(&window.start()), "2020-08-16T11:00:00Z");
        assert_eq!(iso8601_utc(&window.end()), "2020-08-16T12:00:00Z");
    }

    #[test]
    fn test_window_spec_explicit_range() {
        let now = parse_time("2030-01-01").unwrap();
        let spec = WindowSpec {
            start: Some(parse_time("2020-08-16").unwrap()),
            end: Some(parse_time("2020-08-17").unwrap()),
            before: None,
        };

        let window = spec.resolve(now).unwrap();

        assert_eq!(window.duration(), ChronoDuration::days(1));
    }

    #[test]
    fn test_window_spec_requires_exactly_one_edge() {
        let now = Utc::now();
        assert_eq!(
            WindowSpec::default().resolve(now),
            Err(WindowSpecError::Missing)
        );
        let both = WindowSpec {
            start: Some(now),
            end: None,
            before: Some(Duration::from_secs(60)),
        };
        assert_eq!(both.resolve(now), Err(WindowSpecError::Conflicting));
    }

    #[test]
    fn test_inverted_window_is_representable() {
        let start = parse_time("2020-08-17").unwrap();
        let end = parse_time("2020-08-16").unwrap();
        let window = TimeWindow::new(start, end);
        assert!(window.duration() < ChronoDuration::zero());
    }
}
