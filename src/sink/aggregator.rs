//! In-memory datapoint aggregation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::point::{DataPoint, FieldMap, FieldValue};

use super::{DataSink, SinkError};

/// Collects every datapoint's value map in arrival order.
///
/// Each stored map carries an injected `timestamp` key holding the
/// datapoint's epoch milliseconds. Clones share the same storage, so a
/// handle kept outside the loader observes everything the chained sink
/// collected.
#[derive(Debug, Clone, Default)]
pub struct DataAggregator {
    points: Arc<Mutex<Vec<FieldMap>>>,
}

impl DataAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the accumulated value maps, in arrival order.
    pub async fn points(&self) -> Vec<FieldMap> {
        self.points.lock().await.clone()
    }

    /// Number of datapoints collected so far.
    pub async fn len(&self) -> usize {
        self.points.lock().await.len()
    }

    /// Whether nothing has been collected yet.
    pub async fn is_empty(&self) -> bool {
        self.points.lock().await.is_empty()
    }
}

#[async_trait]
impl DataSink for DataAggregator {
    async fn on_data(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        let mut value = point.value.clone();
        value.insert(
            "timestamp".to_string(),
            FieldValue::Int(point.timestamp_ms()),
        );
        self.points.lock().await.push(value);
        Ok(point)
    }

    async fn finish(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        Ok(point)
    }
}
