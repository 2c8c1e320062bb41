//! Stream consumers for extracted datapoints.
//!
//! Every sink implements the two-operation [`DataSink`] capability. A
//! loader routes each datapoint through all registered sinks in order;
//! a sink may annotate the datapoint before handing it to the next one.

mod aggregator;
mod bypass;
mod database;
mod error;
mod match_report;
mod time_tracker;

pub use aggregator::DataAggregator;
pub use bypass::BypassSink;
pub use database::{DatabaseSink, DEFAULT_BATCH_SIZE};
pub use error::SinkError;
pub use match_report::MatchReporter;
pub use time_tracker::TimeTracker;

use async_trait::async_trait;

use crate::point::DataPoint;

/// Capability implemented by every stream consumer.
#[async_trait]
pub trait DataSink: Send {
    /// Observe one datapoint, returning it (possibly annotated) for the
    /// next sink in the chain.
    async fn on_data(&mut self, point: DataPoint) -> Result<DataPoint, SinkError>;

    /// The stream is complete; `point` is the terminal meta-datapoint.
    ///
    /// This is the last call a sink receives; teardown such as flushing
    /// buffered writes happens here.
    async fn finish(&mut self, point: DataPoint) -> Result<DataPoint, SinkError>;
}
