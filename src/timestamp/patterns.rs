//! Stock timestamp patterns and base-datetime inference.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::pattern::{FieldKind, RegexPattern};

use super::merge_timestamp;

fn full_ts_pattern(regex: &str) -> RegexPattern {
    RegexPattern::new("ts", regex)
        .with_field("year", FieldKind::Int)
        .with_field("month", FieldKind::Int)
        .with_field("day", FieldKind::Int)
        .with_field("hour", FieldKind::Int)
        .with_field("minute", FieldKind::Int)
        .with_field("second", FieldKind::Int)
        .with_field("millisecond", FieldKind::Int)
}

fn time_of_day_pattern(regex: &str) -> RegexPattern {
    RegexPattern::new("ts", regex)
        .with_field("hour", FieldKind::Int)
        .with_field("minute", FieldKind::Int)
        .with_field("second", FieldKind::Int)
        .with_field("millisecond", FieldKind::Int)
}

/// The stock timestamp pattern library.
///
/// Covers the formats commonly seen in application logs: bare
/// time-of-day with milliseconds, ISO-8601 with `T` or space separators,
/// a `GMT+08:00` vendor format, offset-suffixed ISO, and a double-space
/// date/time variant without milliseconds. Order matters; more specific
/// patterns come first.
#[must_use]
pub fn default_ts_patterns() -> Vec<RegexPattern> {
    vec![
        time_of_day_pattern(r"(\d+):(\d+):(\d+)\.(\d\d\d)[ \[]"),
        full_ts_pattern(r"(\d+)-(\d+)-(\d+)T(\d+):(\d+):(\d+)\.(\d\d\d)"),
        full_ts_pattern(r"(\d+)-(\d+)-(\d+) (\d+):(\d+):(\d+)\.(\d\d\d)"),
        full_ts_pattern(r"(\d+)-(\d+)-(\d+) GMT\+08:00 (\d+):(\d+):(\d+).(\d+)"),
        full_ts_pattern(r"(\d+)-(\d+)-(\d+)T(\d+):(\d+):(\d+).(\d+)\+08:00"),
        RegexPattern::new("ts", r"(\d+)-(\d+)-(\d+)  (\d+):(\d+):(\d+)")
            .with_field("year", FieldKind::Int)
            .with_field("month", FieldKind::Int)
            .with_field("day", FieldKind::Int)
            .with_field("hour", FieldKind::Int)
            .with_field("minute", FieldKind::Int)
            .with_field("second", FieldKind::Int),
        time_of_day_pattern(r"(\d+):(\d+):(\d+)\.(\d\d\d)"),
    ]
}

/// Infer the base datetime for a log stream from its path.
///
/// Rotated logs often carry their date in the file name while lines
/// only print the time of day. A `YYYY-MM-DD` fragment in the path
/// overrides the date part of `now`; otherwise `now` is used as-is.
#[must_use]
pub fn infer_base_datetime(path: &Path, now: NaiveDateTime) -> NaiveDateTime {
    let date_pattern = RegexPattern::new("date_in_path", r"(\d+)-(\d+)-(\d+)")
        .with_field("year", FieldKind::Int)
        .with_field("month", FieldKind::Int)
        .with_field("day", FieldKind::Int);

    date_pattern
        .match_line(&path.to_string_lossy())
        .and_then(|fields| merge_timestamp(now, &fields))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use std::path::PathBuf;

    use crate::timestamp::TimestampResolver;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 8, 13)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_default_patterns_cover_iso_with_millis() {
        let mut resolver = TimestampResolver::new(base());
        let resolved = resolver
            .resolve(&default_ts_patterns(), "2022-08-13 12:00:00.000 1234,1")
            .unwrap();
        assert_eq!(
            resolved,
            NaiveDate::from_ymd_opt(2022, 8, 13)
                .unwrap()
                .and_hms_milli_opt(12, 0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_default_patterns_cover_time_of_day() {
        let mut resolver = TimestampResolver::new(base());
        let resolved = resolver
            .resolve(&default_ts_patterns(), "03:04:05.678 level=info")
            .unwrap();
        assert_eq!(resolved.hour(), 3);
        assert_eq!(resolved.and_utc().timestamp_subsec_millis(), 678);
        // The date comes from the base.
        assert_eq!(
            resolved.date(),
            NaiveDate::from_ymd_opt(2022, 8, 13).unwrap()
        );
    }

    #[test]
    fn test_base_datetime_from_path() {
        let now = base();
        let inferred =
            infer_base_datetime(&PathBuf::from("/var/log/app/2021-03-09.log"), now);
        assert_eq!(
            inferred.date(),
            NaiveDate::from_ymd_opt(2021, 3, 9).unwrap()
        );
    }

    #[test]
    fn test_base_datetime_without_date_in_path() {
        let now = base();
        assert_eq!(infer_base_datetime(&PathBuf::from("/var/log/app.log"), now), now);
    }
}
