//! Time-series store seam used by the database sink.
//!
//! The store itself is an external collaborator; this module only
//! defines the capability the sink writes against, plus an in-process
//! implementation for tests and dry runs.

mod memory;

pub use memory::MemoryStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::point::FieldMap;

/// One row bound for a time-series store.
#[derive(Debug, Clone, PartialEq)]
pub struct WritePoint {
    /// Target table/measurement.
    pub table: String,
    /// Row timestamp.
    pub timestamp: NaiveDateTime,
    /// Field values.
    pub fields: FieldMap,
    /// Indexed tag values.
    pub tags: BTreeMap<String, String>,
}

/// Capability of a time-series database client.
#[async_trait]
pub trait TimeSeriesStore: Send {
    /// Queue one row for writing.
    async fn insert(&mut self, point: WritePoint) -> Result<(), StoreError>;

    /// Force all queued rows out.
    async fn finish(&mut self) -> Result<(), StoreError>;
}

/// Errors surfaced by a time-series store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A write was rejected.
    #[error("Write failed: {0}")]
    Write(String),
}
