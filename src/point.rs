//! Datapoint value objects shared across the extraction pipeline.
//!
//! A [`DataPoint`] is one extracted, timestamped record. A stream of
//! datapoints ends with a single terminal meta-datapoint (see
//! [`DataPoint::terminal`]).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single extracted scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Integer field.
    Int(i64),
    /// Floating-point field.
    Float(f64),
    /// Verbatim text field.
    Str(String),
}

impl FieldValue {
    /// Integer view of the value, if it has one.
    ///
    /// Floats truncate; strings parse.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(v) if v.is_finite() => Some(*v as i64),
            Self::Float(_) => None,
            Self::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Float view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Field name to value mapping produced by a pattern match.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Marks an extracted field as doubling as an indexed tag downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSpec {
    /// Field whose value supplies the tag.
    pub field: String,
    /// Tag name used for indexing.
    pub tag: String,
}

impl TagSpec {
    /// Associate `field` with the indexed tag `tag`.
    #[must_use]
    pub fn new(field: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            tag: tag.into(),
        }
    }
}

/// Metadata carried alongside a datapoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointMeta {
    /// Name of the pattern that produced the datapoint.
    pub name: String,
    /// Unique pattern id (`name` or `name@version`).
    pub id: String,
    /// Tag associations of the producing pattern.
    pub tags: Vec<TagSpec>,
    /// Source identifier assigned by a database sink, if any.
    pub source: Option<String>,
}

/// One extracted, timestamped record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Type of this datapoint (the producing pattern's name).
    pub name: String,
    /// Absolute point in time the record refers to.
    pub timestamp: NaiveDateTime,
    /// Extracted field values.
    pub value: FieldMap,
    /// Which fields double as indexed tags.
    pub tags: Vec<TagSpec>,
    /// Metadata (pattern id, tags, sink annotations).
    pub meta: PointMeta,
}

impl DataPoint {
    /// Create a datapoint.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        timestamp: NaiveDateTime,
        value: FieldMap,
        tags: Vec<TagSpec>,
        meta: PointMeta,
    ) -> Self {
        Self {
            name: name.into(),
            timestamp,
            value,
            tags,
            meta,
        }
    }

    /// Terminal meta-datapoint signalling end-of-stream to sinks.
    ///
    /// Carries no name, values or tags; the timestamp is the current
    /// wall clock.
    #[must_use]
    pub fn terminal() -> Self {
        Self {
            name: String::new(),
            timestamp: Utc::now().naive_utc(),
            value: FieldMap::new(),
            tags: Vec::new(),
            meta: PointMeta::default(),
        }
    }

    /// Whether this is the terminal meta-datapoint.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.name.is_empty()
    }

    /// Timestamp in milliseconds since the Unix epoch.
    #[must_use]
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.and_utc().timestamp_millis()
    }

    /// Timestamp in seconds since the Unix epoch.
    #[must_use]
    pub fn timestamp_s(&self) -> i64 {
        self.timestamp.and_utc().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 8, 13)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 500)
            .unwrap()
    }

    #[test]
    fn test_terminal_datapoint_is_empty() {
        let dp = DataPoint::terminal();
        assert!(dp.is_terminal());
        assert!(dp.value.is_empty());
        assert!(dp.tags.is_empty());
        assert_eq!(dp.meta, PointMeta::default());
    }

    #[test]
    fn test_data_datapoint_is_not_terminal() {
        let dp = DataPoint::new(
            "rtt",
            sample_timestamp(),
            FieldMap::new(),
            Vec::new(),
            PointMeta::default(),
        );
        assert!(!dp.is_terminal());
    }

    #[test]
    fn test_timestamp_conversions() {
        let dp = DataPoint::new(
            "rtt",
            sample_timestamp(),
            FieldMap::new(),
            Vec::new(),
            PointMeta::default(),
        );
        assert_eq!(dp.timestamp_ms(), 1_660_392_000_500);
        assert_eq!(dp.timestamp_s(), 1_660_392_000);
    }

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::Int(42).as_i64(), Some(42));
        assert_eq!(FieldValue::Float(3.9).as_i64(), Some(3));
        assert_eq!(FieldValue::Str("17".into()).as_i64(), Some(17));
        assert_eq!(FieldValue::Str("abc".into()).as_i64(), None);
        assert_eq!(FieldValue::Float(f64::NAN).as_i64(), None);
        assert_eq!(FieldValue::Int(2).as_f64(), Some(2.0));
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Int(5).to_string(), "5");
        assert_eq!(FieldValue::Str("node-a".into()).to_string(), "node-a");
    }
}
