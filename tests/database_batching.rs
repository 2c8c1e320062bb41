//! Batched database writing through the full pipeline.

use std::io::Write;

use tempfile::NamedTempFile;

use logsift::loader::LogFileLoader;
use logsift::pattern::{FieldKind, PatternGroup, PatternGroupBuilder, RegexPattern};
use logsift::sink::DatabaseSink;
use logsift::store::MemoryStore;

fn counter_group() -> PatternGroup {
    PatternGroupBuilder::new("counters")
        .add_pattern(
            RegexPattern::new("counter", r"count=(\d+)")
                .with_field("count", FieldKind::Int)
                .with_version("1.0"),
        )
        .build()
}

#[tokio::test]
async fn one_automatic_flush_then_remainder_on_finish() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "2022-08-13 12:00:00.000 start").unwrap();
    for i in 0..1001 {
        writeln!(file, "count={i}").unwrap();
    }
    file.flush().unwrap();

    let store = MemoryStore::new();
    let sink = DatabaseSink::new(store.clone()).with_source("batch-test");

    LogFileLoader::new(file.path())
        .set_pattern_group(counter_group())
        .add_sink(Box::new(sink))
        .start()
        .await
        .unwrap();

    // 1000 rows went out in the automatic flush, the 1001st on finish.
    let rows = store.rows().await;
    assert_eq!(rows.len(), 1001);
    assert_eq!(store.flush_count().await, 2);
    assert_eq!(rows[0].table, "counter");
    assert_eq!(
        rows[0].tags.get("source").map(String::as_str),
        Some("batch-test")
    );
}

#[tokio::test]
async fn under_threshold_everything_waits_for_finish() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "2022-08-13 12:00:00.000 count=1").unwrap();
    writeln!(file, "count=2").unwrap();
    file.flush().unwrap();

    let store = MemoryStore::new();
    let sink = DatabaseSink::new(store.clone());

    LogFileLoader::new(file.path())
        .set_pattern_group(counter_group())
        .add_sink(Box::new(sink))
        .start()
        .await
        .unwrap();

    assert_eq!(store.rows().await.len(), 2);
    assert_eq!(store.flush_count().await, 1);
}
