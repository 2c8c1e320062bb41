//! Timestamp inference for log lines.
//!
//! Log lines rarely carry a full date: many formats print only the time
//! of day, and plenty of lines carry data with no timestamp at all. The
//! merger overlays whatever calendar components a timestamp pattern
//! captured onto a base timestamp; the resolver adds the carry-forward
//! policy on top.

mod patterns;

pub use patterns::{default_ts_patterns, infer_base_datetime};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::pattern::RegexPattern;
use crate::point::FieldMap;

fn component(fields: &FieldMap, key: &str, default: i64) -> i64 {
    fields.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

/// Overlay partial calendar fields onto `base`.
///
/// Recognized keys are `year`, `month`, `day`, `hour`, `minute`,
/// `second` and `millisecond`; absent components fall back to the base's
/// value, except `millisecond` which zero-fills. Returns `None` when the
/// merged components do not form a valid timestamp.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn merge_timestamp(base: NaiveDateTime, fields: &FieldMap) -> Option<NaiveDateTime> {
    let year = component(fields, "year", i64::from(base.year()));
    let month = component(fields, "month", i64::from(base.month()));
    let day = component(fields, "day", i64::from(base.day()));
    let hour = component(fields, "hour", i64::from(base.hour()));
    let minute = component(fields, "minute", i64::from(base.minute()));
    let second = component(fields, "second", i64::from(base.second()));
    let millisecond = component(fields, "millisecond", 0);

    let in_u32 = |v: i64| (0..=i64::from(u32::MAX)).contains(&v);
    if !(0..=9999).contains(&year) || !in_u32(month) || !in_u32(day) {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;
    if !in_u32(hour) || !in_u32(minute) || !in_u32(second) || !(0..=999).contains(&millisecond) {
        return None;
    }
    date.and_hms_milli_opt(hour as u32, minute as u32, second as u32, millisecond as u32)
}

/// Resolves a timestamp for each line of one stream.
///
/// Evaluates timestamp patterns in declared order and merges the first
/// match onto the base. Lines without their own timestamp reuse the most
/// recently resolved one; before anything has resolved, they resolve to
/// nothing.
#[derive(Debug)]
pub struct TimestampResolver {
    base: NaiveDateTime,
    prev: Option<NaiveDateTime>,
}

impl TimestampResolver {
    /// Create a resolver with the given base timestamp.
    #[must_use]
    pub fn new(base: NaiveDateTime) -> Self {
        Self { base, prev: None }
    }

    /// The base timestamp partial matches are merged onto.
    #[must_use]
    pub fn base(&self) -> NaiveDateTime {
        self.base
    }

    /// The most recently resolved timestamp, if any.
    #[must_use]
    pub fn last_resolved(&self) -> Option<NaiveDateTime> {
        self.prev
    }

    /// Resolve the timestamp for `line` against `ts_patterns`.
    ///
    /// First matching pattern wins. A match that does not merge into a
    /// valid timestamp is treated like no match at all, falling back to
    /// the carried-forward value.
    pub fn resolve(&mut self, ts_patterns: &[RegexPattern], line: &str) -> Option<NaiveDateTime> {
        for pattern in ts_patterns {
            let Some(fields) = pattern.match_line(line) else {
                continue;
            };
            if fields.is_empty() {
                continue;
            }
            if let Some(resolved) = merge_timestamp(self.base, &fields) {
                self.prev = Some(resolved);
                return Some(resolved);
            }
            break;
        }
        self.prev
    }
}
