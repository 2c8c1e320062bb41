//! Running min/max tracking of datapoint timestamps.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime};
use tokio::sync::Mutex;

use crate::point::DataPoint;

use super::{DataSink, SinkError};

/// Margin added on both ends of the tracked range for display.
const DISPLAY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Default)]
struct TimeRange {
    min_ms: Option<i64>,
    max_ms: Option<i64>,
}

/// Tracks the minimum and maximum timestamp seen on the stream.
///
/// The exposed bounds are widened by a fixed 60 second margin on each
/// side, which gives time-range selections in downstream UIs some
/// breathing room. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct TimeTracker {
    range: Arc<Mutex<TimeRange>>,
}

impl TimeTracker {
    /// Create a tracker that has seen nothing yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest timestamp seen, widened by the display margin.
    pub async fn min_timestamp(&self) -> Option<NaiveDateTime> {
        let ms = self.range.lock().await.min_ms?;
        Some(DateTime::from_timestamp_millis(ms)?.naive_utc() - Duration::seconds(DISPLAY_MARGIN_SECS))
    }

    /// Latest timestamp seen, widened by the display margin.
    pub async fn max_timestamp(&self) -> Option<NaiveDateTime> {
        let ms = self.range.lock().await.max_ms?;
        Some(DateTime::from_timestamp_millis(ms)?.naive_utc() + Duration::seconds(DISPLAY_MARGIN_SECS))
    }
}

#[async_trait]
impl DataSink for TimeTracker {
    async fn on_data(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        let ms = point.timestamp_ms();
        let mut range = self.range.lock().await;
        range.min_ms = Some(range.min_ms.map_or(ms, |min| min.min(ms)));
        range.max_ms = Some(range.max_ms.map_or(ms, |max| max.max(ms)));
        Ok(point)
    }

    async fn finish(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{FieldMap, PointMeta};
    use chrono::NaiveDate;

    fn point_at(hour: u32) -> DataPoint {
        DataPoint::new(
            "p",
            NaiveDate::from_ymd_opt(2022, 8, 13)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            FieldMap::new(),
            Vec::new(),
            PointMeta::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_tracker_has_no_bounds() {
        let tracker = TimeTracker::new();
        assert!(tracker.min_timestamp().await.is_none());
        assert!(tracker.max_timestamp().await.is_none());
    }

    #[tokio::test]
    async fn test_bounds_are_widened_by_margin() {
        let tracker = TimeTracker::new();
        let mut sink = tracker.clone();

        sink.on_data(point_at(8)).await.unwrap();
        sink.on_data(point_at(14)).await.unwrap();
        sink.on_data(point_at(11)).await.unwrap();

        let min = tracker.min_timestamp().await.unwrap();
        let max = tracker.max_timestamp().await.unwrap();
        assert_eq!(
            min,
            NaiveDate::from_ymd_opt(2022, 8, 13)
                .unwrap()
                .and_hms_opt(7, 59, 0)
                .unwrap()
        );
        assert_eq!(
            max,
            NaiveDate::from_ymd_opt(2022, 8, 13)
                .unwrap()
                .and_hms_opt(14, 1, 0)
                .unwrap()
        );
    }
}
