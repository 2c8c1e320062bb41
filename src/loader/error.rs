//! Loader error types.

use std::path::PathBuf;

use crate::sink::SinkError;

/// Errors that can occur during a loading session.
#[derive(thiserror::Error, Debug)]
pub enum LoaderError {
    /// `start()` was called before a pattern group was set.
    #[error("Pattern group not set before start")]
    PatternGroupNotSet,

    /// Watched file was deleted.
    #[error("Watched file deleted: {0}")]
    FileDeleted(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The live-watch filename filter does not compile.
    #[error("Invalid watch filter: {0}")]
    InvalidFilter(#[from] regex::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A sink rejected the stream.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_group_not_set_display() {
        assert_eq!(
            LoaderError::PatternGroupNotSet.to_string(),
            "Pattern group not set before start"
        );
    }

    #[test]
    fn test_file_deleted_display() {
        let err = LoaderError::FileDeleted(PathBuf::from("/tmp/app.log"));
        assert_eq!(err.to_string(), "Watched file deleted: /tmp/app.log");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LoaderError = io_err.into();
        assert!(matches!(err, LoaderError::Io(_)));
    }
}
