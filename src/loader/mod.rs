//! Log-to-datapoint loading sessions.
//!
//! A [`LogFileLoader`] reads lines from a static file or a live-tailed
//! path, applies a pattern group, and feeds extracted datapoints through
//! an ordered chain of sinks. The stream ends with exactly one terminal
//! meta-datapoint delivered to every sink's `finish`.

mod error;
mod tailer;
mod watch;

pub use error::LoaderError;
pub use tailer::LogTailer;
pub use watch::{LogWatcher, WatchEvent};

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use regex::Regex;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::pattern::{PatternGroup, RegexPattern};
use crate::point::{DataPoint, PointMeta};
use crate::sink::{DataSink, MatchReporter, TimeTracker};
use crate::timestamp::{default_ts_patterns, infer_base_datetime, TimestampResolver};

/// How many lines between progress log records in static mode.
const PROGRESS_EVERY: u64 = 10_000;

/// Loads datapoints out of a log file and feeds them to sinks.
///
/// Static mode streams the file once and completes at end of input.
/// Live mode (see [`LogFileLoader::with_live_watch`]) watches the path
/// and keeps reading appended lines until the cancellation token fires.
/// A [`TimeTracker`] sink is installed on construction; grab a handle
/// via [`LogFileLoader::time_tracker`] before starting.
pub struct LogFileLoader {
    path: PathBuf,
    live_filter: Option<String>,
    only_new: bool,
    base_datetime: Option<NaiveDateTime>,
    poll_interval: Duration,
    group: Option<PatternGroup>,
    sinks: Vec<Box<dyn DataSink>>,
    time_tracker: TimeTracker,
    match_reporter: Option<MatchReporter>,
    cancel: CancellationToken,
}

impl LogFileLoader {
    /// Create a loader for `path` in static-file mode.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let time_tracker = TimeTracker::new();
        Self {
            path: path.into(),
            live_filter: None,
            only_new: false,
            base_datetime: None,
            poll_interval: Duration::from_secs(1),
            group: None,
            sinks: vec![Box::new(time_tracker.clone())],
            time_tracker,
            match_reporter: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Switch to live-watch mode.
    ///
    /// `filter` is a regex applied to the string form of modified paths;
    /// only matching files are tailed.
    #[must_use]
    pub fn with_live_watch(mut self, filter: impl Into<String>) -> Self {
        self.live_filter = Some(filter.into());
        self
    }

    /// In live mode, only report lines appended after the watch starts.
    #[must_use]
    pub fn with_only_new(mut self, only_new: bool) -> Self {
        self.only_new = only_new;
        self
    }

    /// Override the base timestamp partial matches merge onto.
    ///
    /// Defaults to the current time, with the date part replaced by a
    /// `YYYY-MM-DD` fragment found in the log path, if any.
    #[must_use]
    pub fn with_base_datetime(mut self, base: NaiveDateTime) -> Self {
        self.base_datetime = Some(base);
        self
    }

    /// Debounce interval of the live-watch observer.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Install a [`MatchReporter`] sink that prints a per-pattern match
    /// summary when the stream finishes.
    #[must_use]
    pub fn with_match_report(mut self) -> Self {
        let reporter = MatchReporter::new();
        self.sinks.push(Box::new(reporter.clone()));
        self.match_reporter = Some(reporter);
        self
    }

    /// Set the pattern group applied to every line.
    ///
    /// Required before [`LogFileLoader::start`]. If the group declares
    /// no timestamp patterns, the stock library from
    /// [`default_ts_patterns`] is used.
    #[must_use]
    pub fn set_pattern_group(mut self, group: PatternGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Register a sink at the end of the chain.
    #[must_use]
    pub fn add_sink(mut self, sink: Box<dyn DataSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Handle to the loader's time-tracker sink.
    #[must_use]
    pub fn time_tracker(&self) -> TimeTracker {
        self.time_tracker.clone()
    }

    /// Handle to the match reporter, when one was installed.
    #[must_use]
    pub fn match_reporter(&self) -> Option<MatchReporter> {
        self.match_reporter.clone()
    }

    /// Token that stops a live watch when cancelled.
    ///
    /// Static-file sessions ignore it and run to end of input.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the loading session to completion.
    ///
    /// Returns the terminal meta-datapoint after it has passed through
    /// every sink's `finish`.
    ///
    /// # Errors
    ///
    /// Fails fast with [`LoaderError::PatternGroupNotSet`] when no
    /// pattern group was set. I/O failures opening or reading the input
    /// are fatal and surface here; unmatched lines never are.
    pub async fn start(mut self) -> Result<DataPoint, LoaderError> {
        let group = self.group.take().ok_or(LoaderError::PatternGroupNotSet)?;

        let now = Utc::now().naive_utc();
        let base = self
            .base_datetime
            .unwrap_or_else(|| infer_base_datetime(&self.path, now));
        let mut resolver = TimestampResolver::new(base);

        let fallback_ts = if group.ts_patterns().is_empty() {
            Some(default_ts_patterns())
        } else {
            None
        };
        let ts_patterns: &[RegexPattern] =
            fallback_ts.as_deref().unwrap_or_else(|| group.ts_patterns());

        match self.live_filter.take() {
            Some(filter) => {
                self.run_live(ts_patterns, group.patterns(), &mut resolver, &filter)
                    .await?;
            }
            None => {
                self.run_static(ts_patterns, group.patterns(), &mut resolver)
                    .await?;
            }
        }

        let mut terminal = DataPoint::terminal();
        for sink in &mut self.sinks {
            terminal = sink.finish(terminal).await?;
        }
        Ok(terminal)
    }

    async fn run_static(
        &mut self,
        ts_patterns: &[RegexPattern],
        data_patterns: &[RegexPattern],
        resolver: &mut TimestampResolver,
    ) -> Result<(), LoaderError> {
        let total = count_lines(&self.path).await?;
        tracing::info!(path = %self.path.display(), lines = total, "parsing log file");

        let file = File::open(&self.path).await?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut seen = 0u64;

        loop {
            buf.clear();
            let bytes_read = reader.read_until(b'\n', &mut buf).await?;
            if bytes_read == 0 {
                break;
            }
            seen += 1;
            if seen % PROGRESS_EVERY == 0 {
                tracing::debug!(seen, total, "parse progress");
            }

            let line = String::from_utf8_lossy(&buf);
            self.process_line(
                ts_patterns,
                data_patterns,
                resolver,
                line.trim_end_matches(['\n', '\r']),
            )
            .await?;
        }
        Ok(())
    }

    async fn run_live(
        &mut self,
        ts_patterns: &[RegexPattern],
        data_patterns: &[RegexPattern],
        resolver: &mut TimestampResolver,
        filter: &str,
    ) -> Result<(), LoaderError> {
        let filter = Regex::new(filter)?;
        let (watcher, mut rx) = LogWatcher::new(
            self.path.clone(),
            filter,
            self.only_new,
            self.poll_interval,
        )?;
        tracing::info!(path = %self.path.display(), "watching for log changes");

        let cancel = self.cancel.clone();
        let result = loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!("watch cancelled via token");
                    break Ok(());
                }
                event = rx.recv() => match event {
                    Some(WatchEvent::Line { line, .. }) => {
                        if let Err(e) = self
                            .process_line(ts_patterns, data_patterns, resolver, &line)
                            .await
                        {
                            break Err(e);
                        }
                    }
                    Some(WatchEvent::Error(e)) => break Err(e),
                    None => break Ok(()),
                },
            }
        };
        watcher.stop();
        result
    }

    /// Process one line: resolve its timestamp, then emit one datapoint
    /// per matching data pattern.
    ///
    /// Lines that fail all patterns, or that have no resolvable and no
    /// carried-forward timestamp, are silently skipped.
    async fn process_line(
        &mut self,
        ts_patterns: &[RegexPattern],
        data_patterns: &[RegexPattern],
        resolver: &mut TimestampResolver,
        line: &str,
    ) -> Result<(), LoaderError> {
        let Some(timestamp) = resolver.resolve(ts_patterns, line) else {
            return Ok(());
        };

        for pattern in data_patterns {
            let Some(fields) = pattern.match_line(line) else {
                continue;
            };
            if fields.is_empty() {
                continue;
            }

            let point = DataPoint::new(
                pattern.name(),
                timestamp,
                fields,
                pattern.tags().to_vec(),
                PointMeta {
                    name: pattern.name().to_string(),
                    id: pattern.unique_id(),
                    tags: pattern.tags().to_vec(),
                    source: None,
                },
            );
            self.dispatch(point).await?;
        }
        Ok(())
    }

    async fn dispatch(&mut self, mut point: DataPoint) -> Result<(), LoaderError> {
        for sink in &mut self.sinks {
            point = sink.on_data(point).await?;
        }
        Ok(())
    }
}

async fn count_lines(path: &Path) -> Result<u64, LoaderError> {
    let file = File::open(path).await?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut count = 0u64;
    loop {
        buf.clear();
        let bytes_read = reader.read_until(b'\n', &mut buf).await?;
        if bytes_read == 0 {
            break;
        }
        count += 1;
    }
    Ok(count)
}
