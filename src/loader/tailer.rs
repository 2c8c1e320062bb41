//! Incremental plain-text log tailer.
//!
//! Reads newly appended lines from a growing file without duplicating
//! previously returned bytes.

use std::collections::VecDeque;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use super::error::LoaderError;

/// Incremental line reader that tracks a byte cursor per file.
///
/// Pull-based and non-blocking: [`LogTailer::next_line`] returns `None`
/// when no new complete line is currently available. The file is
/// re-opened and re-stat'ed on each refill, so appends between calls are
/// picked up. A size decrease below the cursor is treated as truncation
/// or rotation; the cursor resets to zero and reading restarts from the
/// beginning.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    offset: u64,
    only_new: bool,
    primed: bool,
    pending: VecDeque<String>,
}

impl LogTailer {
    /// Create a tailer for `path`.
    ///
    /// With `only_new` set, the cursor starts at the current end of the
    /// file on first use and historical content is ignored; otherwise it
    /// starts at the beginning.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, only_new: bool) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            only_new,
            primed: false,
            pending: VecDeque::new(),
        }
    }

    /// Current byte offset of the cursor.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The path being tailed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next available line, or `None` when nothing new is complete yet.
    ///
    /// Only newline-terminated lines are returned; an unterminated tail
    /// stays pending until its newline arrives, so a line mid-write is
    /// never delivered in fragments. Line content is decoded lossily,
    /// with the trailing newline stripped.
    ///
    /// # Errors
    ///
    /// Returns an error when the file has been deleted, is unreadable,
    /// or an I/O error occurs while reading.
    pub async fn next_line(&mut self) -> Result<Option<String>, LoaderError> {
        if let Some(line) = self.pending.pop_front() {
            return Ok(Some(line));
        }
        self.refill().await?;
        Ok(self.pending.pop_front())
    }

    /// Reset the cursor to the beginning of the file.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.pending.clear();
    }

    async fn refill(&mut self) -> Result<(), LoaderError> {
        let file = match File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoaderError::FileDeleted(self.path.clone()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(LoaderError::PermissionDenied(self.path.clone()));
            }
            Err(e) => return Err(LoaderError::Io(e)),
        };

        let file_len = file.metadata().await?.len();

        if !self.primed {
            self.primed = true;
            if self.only_new {
                self.offset = file_len;
                return Ok(());
            }
        }

        if file_len < self.offset {
            tracing::warn!(
                path = %self.path.display(),
                old_offset = self.offset,
                new_len = file_len,
                "file truncated, resetting cursor"
            );
            self.offset = 0;
        }
        if file_len == self.offset {
            return Ok(());
        }

        let mut file = file;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let bytes_read = reader.read_until(b'\n', &mut buf).await?;
            if bytes_read == 0 {
                break;
            }
            if buf.last() != Some(&b'\n') {
                // Incomplete tail; leave it for the next refill.
                break;
            }
            self.offset += bytes_read as u64;

            let line = String::from_utf8_lossy(&buf);
            self.pending
                .push_back(line.trim_end_matches(['\n', '\r']).to_string());
        }

        Ok(())
    }
}
