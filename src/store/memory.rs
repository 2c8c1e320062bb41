//! In-process store recording every write.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, TimeSeriesStore, WritePoint};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<WritePoint>,
    flushes: usize,
}

/// Store that keeps rows in memory, for tests and dry runs.
///
/// Clones share the same underlying state, so a handle kept outside a
/// sink observes everything the sink wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rows written so far, in write order.
    pub async fn rows(&self) -> Vec<WritePoint> {
        self.state.lock().await.rows.clone()
    }

    /// Number of times [`TimeSeriesStore::finish`] was called.
    pub async fn flush_count(&self) -> usize {
        self.state.lock().await.flushes
    }
}

#[async_trait]
impl TimeSeriesStore for MemoryStore {
    async fn insert(&mut self, point: WritePoint) -> Result<(), StoreError> {
        self.state.lock().await.rows.push(point);
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), StoreError> {
        self.state.lock().await.flushes += 1;
        Ok(())
    }
}
