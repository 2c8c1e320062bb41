//! Live log watching with notify integration.
//!
//! Watches a file or directory for modifications and emits newly
//! appended lines over a channel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::{self, RecursiveMode},
    DebounceEventResult, DebouncedEvent,
};
use regex::Regex;
use tokio::sync::mpsc;

use super::error::LoaderError;
use super::tailer::LogTailer;

/// Events emitted by the log watcher.
#[derive(Debug)]
pub enum WatchEvent {
    /// A line was appended to a watched file.
    Line {
        /// File the line came from.
        path: PathBuf,
        /// Line content, newline stripped.
        line: String,
    },
    /// An error occurred during watching.
    Error(LoaderError),
}

/// Watches a path for changes and tails matching files.
///
/// Uses a debounced notify watcher on its own bridge thread. A
/// [`LogTailer`] is created for each matching path on its first modify
/// event; every event handler drains that tailer synchronously, so
/// lines arrive in append order.
pub struct LogWatcher {
    watch_path: PathBuf,
    stop_tx: std_mpsc::Sender<()>,
    bridge_handle: thread::JoinHandle<()>,
}

impl LogWatcher {
    /// Start watching `watch_path`.
    ///
    /// Only paths whose string form matches `filter` are tailed. With
    /// `only_new` set, content present before a file's first event is
    /// skipped. Returns the watcher and a receiver for line events.
    ///
    /// # Errors
    ///
    /// Returns an error if the file watcher cannot be created.
    ///
    /// # Panics
    ///
    /// Panics if the tokio runtime cannot be created in the bridge
    /// thread.
    pub fn new(
        watch_path: PathBuf,
        filter: Regex,
        only_new: bool,
        debounce: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>), LoaderError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();
        let (notify_tx, notify_rx) = std_mpsc::channel();

        let mut debouncer = new_debouncer(debounce, None, move |result| {
            let _ = notify_tx.send(result);
        })?;

        let watch_target = if watch_path.is_file() {
            watch_path.parent().unwrap_or(&watch_path).to_path_buf()
        } else {
            watch_path.clone()
        };
        debouncer.watch(&watch_target, RecursiveMode::NonRecursive)?;

        // Bridge thread: converts notify events into line events.
        let bridge_handle = thread::spawn(move || {
            let mut tailers: HashMap<PathBuf, LogTailer> = HashMap::new();
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime for bridge thread");

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(std_mpsc::TryRecvError::Disconnected) => break,
                    Err(std_mpsc::TryRecvError::Empty) => {}
                }

                match notify_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(result) => Self::handle_debounce_result(
                        result,
                        &filter,
                        only_new,
                        &mut tailers,
                        &event_tx,
                        &runtime,
                    ),
                    Err(std_mpsc::RecvTimeoutError::Timeout) => {}
                    Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }

            // Keep the debouncer alive until the thread exits.
            drop(debouncer);
        });

        Ok((
            Self {
                watch_path,
                stop_tx,
                bridge_handle,
            },
            event_rx,
        ))
    }

    fn handle_debounce_result(
        result: DebounceEventResult,
        filter: &Regex,
        only_new: bool,
        tailers: &mut HashMap<PathBuf, LogTailer>,
        event_tx: &mpsc::UnboundedSender<WatchEvent>,
        runtime: &tokio::runtime::Runtime,
    ) {
        match result {
            Ok(events) => {
                for event in &events {
                    Self::handle_notify_event(event, filter, only_new, tailers, event_tx, runtime);
                }
            }
            Err(errors) => {
                for error in errors {
                    let _ = event_tx.send(WatchEvent::Error(LoaderError::Notify(error)));
                }
            }
        }
    }

    fn handle_notify_event(
        event: &DebouncedEvent,
        filter: &Regex,
        only_new: bool,
        tailers: &mut HashMap<PathBuf, LogTailer>,
        event_tx: &mpsc::UnboundedSender<WatchEvent>,
        runtime: &tokio::runtime::Runtime,
    ) {
        use notify::EventKind;

        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return;
        }

        for path in &event.paths {
            if !filter.is_match(&path.to_string_lossy()) {
                continue;
            }
            let tailer = tailers
                .entry(path.clone())
                .or_insert_with(|| LogTailer::new(path.clone(), only_new));

            loop {
                match runtime.block_on(tailer.next_line()) {
                    Ok(Some(line)) => {
                        let _ = event_tx.send(WatchEvent::Line {
                            path: path.clone(),
                            line,
                        });
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = event_tx.send(WatchEvent::Error(e));
                        break;
                    }
                }
            }
        }
    }

    /// The path being watched.
    #[must_use]
    pub fn watch_path(&self) -> &PathBuf {
        &self.watch_path
    }

    /// Stop watching and wait for the bridge thread to exit.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.bridge_handle.join();
    }
}
