//! Sink error types.

use crate::store::StoreError;

/// Errors that can occur while a sink consumes the stream.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    /// The downstream time-series store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
