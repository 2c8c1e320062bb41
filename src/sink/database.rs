//! Batched forwarding to a time-series store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use rand::Rng;

use crate::point::DataPoint;
use crate::store::{TimeSeriesStore, WritePoint};

use super::{DataSink, SinkError};

/// Default number of rows buffered before an automatic flush.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

const SOURCE_ID_LEN: usize = 10;
const SOURCE_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_source_id() -> String {
    let mut rng = rand::rng();
    (0..SOURCE_ID_LEN)
        .map(|_| SOURCE_ID_CHARSET[rng.random_range(0..SOURCE_ID_CHARSET.len())] as char)
        .collect()
}

/// Buffers datapoints and forwards them to a time-series store.
///
/// Rows are written in batches: the buffer flushes as soon as it reaches
/// the batch size, and once more on `finish` for whatever remains. Each
/// sink instance carries a source identifier (random 10-character string
/// unless supplied) written as an implicit `source` tag, which keeps
/// concurrent runs into the same measurement distinguishable.
#[derive(Debug)]
pub struct DatabaseSink<S: TimeSeriesStore> {
    store: S,
    source_id: String,
    batch_size: usize,
    buffer: Vec<WritePoint>,
}

impl<S: TimeSeriesStore> DatabaseSink<S> {
    /// Create a sink writing to `store` with a random source id.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            source_id: random_source_id(),
            batch_size: DEFAULT_BATCH_SIZE,
            buffer: Vec::new(),
        }
    }

    /// Use a caller-supplied source identifier.
    #[must_use]
    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Override the automatic flush threshold.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The source identifier tagged onto every row.
    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Number of rows currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        tracing::debug!(rows = self.buffer.len(), "flushing datapoint batch");
        for row in self.buffer.drain(..) {
            self.store.insert(row).await?;
        }
        self.store.finish().await?;
        Ok(())
    }
}

#[async_trait]
impl<S: TimeSeriesStore> DataSink for DatabaseSink<S> {
    async fn on_data(&mut self, mut point: DataPoint) -> Result<DataPoint, SinkError> {
        let mut tags = BTreeMap::new();
        tags.insert("source".to_string(), self.source_id.clone());
        for spec in &point.tags {
            if let Some(value) = point.value.get(&spec.field) {
                tags.insert(spec.tag.clone(), value.to_string());
            }
        }

        self.buffer.push(WritePoint {
            table: point.name.clone(),
            timestamp: point.timestamp,
            fields: point.value.clone(),
            tags,
        });
        if self.buffer.len() >= self.batch_size {
            self.flush().await?;
        }

        point.meta.source = Some(self.source_id.clone());
        Ok(point)
    }

    async fn finish(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        self.flush().await?;
        Ok(point)
    }
}
