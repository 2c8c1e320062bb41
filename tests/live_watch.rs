//! Live-watch extraction against a growing log file.

use std::io::Write;
use std::time::Duration;

use tempfile::TempDir;

use logsift::loader::{LoaderError, LogFileLoader};
use logsift::pattern::{FieldKind, PatternGroup, PatternGroupBuilder, RegexPattern};
use logsift::sink::DataAggregator;

fn ab_group() -> PatternGroup {
    PatternGroupBuilder::new("test")
        .add_pattern(
            RegexPattern::new("ab", r"(\d+),(\d+)")
                .with_field("a", FieldKind::Int)
                .with_field("b", FieldKind::Int),
        )
        .build()
}

#[tokio::test]
async fn watch_extracts_appended_lines_until_cancelled() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("app.log");
    std::fs::write(&log_path, "").unwrap();

    let aggregator = DataAggregator::new();
    let loader = LogFileLoader::new(temp_dir.path())
        .with_live_watch(r".*\.log$")
        .with_poll_interval(Duration::from_millis(100))
        .set_pattern_group(ab_group())
        .add_sink(Box::new(aggregator.clone()));
    let cancel = loader.cancel_token();

    let session = tokio::spawn(loader.start());
    tokio::time::sleep(Duration::from_millis(200)).await;

    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&log_path)
            .unwrap();
        writeln!(file, "2022-08-13 12:00:00.000 1,2").unwrap();
        writeln!(file, "3,4").unwrap();
    }

    // Wait for the watcher to deliver; tolerate slow CI filesystems.
    let mut delivered = 0;
    for _ in 0..50 {
        delivered = aggregator.len().await;
        if delivered >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    cancel.cancel();
    let result = session.await.unwrap();

    match result {
        Ok(terminal) => {
            assert!(terminal.is_terminal());
            if delivered >= 2 {
                let points = aggregator.points().await;
                // Carry-forward applies across watched lines too.
                assert_eq!(points[0].get("timestamp"), points[1].get("timestamp"));
            }
        }
        // Systems with exhausted watch handles cannot run this test.
        Err(LoaderError::Notify(e)) => eprintln!("Skipping test due to system limit: {e}"),
        Err(e) => panic!("Unexpected error: {e}"),
    }
}

#[tokio::test]
async fn watch_only_new_skips_existing_content() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("app.log");
    std::fs::write(&log_path, "2022-08-13 12:00:00.000 7,8\n").unwrap();

    let aggregator = DataAggregator::new();
    let loader = LogFileLoader::new(temp_dir.path())
        .with_live_watch(r".*\.log$")
        .with_only_new(true)
        .with_poll_interval(Duration::from_millis(100))
        .set_pattern_group(ab_group())
        .add_sink(Box::new(aggregator.clone()));
    let cancel = loader.cancel_token();

    let session = tokio::spawn(loader.start());
    tokio::time::sleep(Duration::from_millis(200)).await;

    // The first append triggers the event that primes the tailer at
    // end-of-file; only lines appended after that are reported.
    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&log_path)
            .unwrap();
        writeln!(file, "2022-08-13 12:00:01.000 9,10").unwrap();
    }
    tokio::time::sleep(Duration::from_millis(500)).await;
    {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&log_path)
            .unwrap();
        writeln!(file, "2022-08-13 12:00:02.000 11,12").unwrap();
    }

    let mut delivered = 0;
    for _ in 0..50 {
        delivered = aggregator.len().await;
        if delivered >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    cancel.cancel();
    let result = session.await.unwrap();

    match result {
        Ok(terminal) => {
            assert!(terminal.is_terminal());
            if delivered >= 1 {
                // Content present before the watch started never shows up.
                let points = aggregator.points().await;
                assert!(points
                    .iter()
                    .all(|p| p.get("a") != Some(&logsift::point::FieldValue::Int(7))));
            }
        }
        Err(LoaderError::Notify(e)) => eprintln!("Skipping test due to system limit: {e}"),
        Err(e) => panic!("Unexpected error: {e}"),
    }
}
