//! Pass-through sink.

use async_trait::async_trait;

use crate::point::DataPoint;

use super::{DataSink, SinkError};

/// Sink that forwards every datapoint untouched.
///
/// Useful as a chain placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct BypassSink;

#[async_trait]
impl DataSink for BypassSink {
    async fn on_data(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        Ok(point)
    }

    async fn finish(&mut self, point: DataPoint) -> Result<DataPoint, SinkError> {
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forwards_points_untouched() {
        let mut sink = BypassSink;
        let terminal = DataPoint::terminal();

        assert_eq!(sink.on_data(terminal.clone()).await.unwrap(), terminal);
        assert_eq!(sink.finish(terminal.clone()).await.unwrap(), terminal);
    }
}
