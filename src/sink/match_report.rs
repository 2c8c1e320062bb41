//! Per-pattern match counting with a console summary.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use owo_colors::OwoColorize;
use tokio::sync::Mutex;

use crate::point::DataPoint;

use super::{DataSink, SinkError};

/// Counts datapoints per pattern id and prints a summary on finish.
///
/// Only datapoints carrying a non-empty `meta.id` are counted, so the
/// terminal meta-datapoint never shows up in the report. Clones share
/// the same counters.
#[derive(Debug, Clone, Default)]
pub struct MatchReporter {
    counts: Arc<Mutex<BTreeMap<String, u64>>>,
}

impl MatchReporter {
    /// Create a reporter with empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the per-pattern-id occurrence counts.
    pub async fn counts(&self) -> BTreeMap<String, u64> {
        self.counts.lock().await.clone()
    }
}

#[async_trait]
impl DataSink for MatchReporter {
    async fn on_data(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        if !point.meta.id.is_empty() {
            let mut counts = self.counts.lock().await;
            *counts.entry(point.meta.id.clone()).or_insert(0) += 1;
        }
        Ok(point)
    }

    async fn finish(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        let counts = self.counts.lock().await;
        println!("{}", "Pattern Match Result:".green().bold());
        for (id, count) in counts.iter() {
            println!("  {id:<28} : {count}");
        }
        Ok(point)
    }
}
