mod common;

use std::time::Duration;

use serde_json::json;

use common::{MapExtractor, MemoryAttachmentStore, MemoryContentSource, TestHarness};
use wordtally::batch::BatchCoordinator;
use wordtally::cache::{CacheStore, MemoryCache, SqliteCache, ATTACHMENTS_KEY, CONTENT_KEY};
use wordtally::content::{ContentAggregator, ContentFilter};
use wordtally::fields::FieldExtractor;
use wordtally::{load_config, DocumentFormat, WordTally};

fn in_memory_tally(cache: Box<dyn CacheStore>, ttl: Duration) -> WordTally {
    let content = MemoryContentSource::default()
        .with_record("1", "article", &["one two three", "four"])
        .with_record("2", "page", &["five six", ""]);
    let attachments = MemoryAttachmentStore::default()
        .with_attachment("10", "a.pdf")
        .with_attachment("11", "b.pdf");
    let extractor = MapExtractor::default()
        .with_text("a.pdf", "seven eight")
        .with_text("b.pdf", "nine");

    WordTally::new(
        Box::new(content),
        Box::new(attachments),
        cache,
        ContentAggregator::new(ContentFilter::default(), FieldExtractor::default()),
        BatchCoordinator::new(DocumentFormat::Pdf, Box::new(extractor)),
        ttl,
    )
}

#[test]
fn test_combined_total() {
    let tally = in_memory_tally(Box::new(MemoryCache::new()), Duration::from_secs(60));

    assert_eq!(tally.combined_total().unwrap(), None);

    tally.refresh_content().unwrap();
    assert_eq!(tally.combined_total().unwrap(), Some(6));

    let progress = tally.run_pdf_batch(1).unwrap();
    assert_eq!(progress.running_total, 3);
    assert_eq!(tally.combined_total().unwrap(), Some(9));
}

#[test]
fn test_summary_serializes() {
    let tally = in_memory_tally(Box::new(MemoryCache::new()), Duration::from_secs(60));
    tally.save_pdf_total(3).unwrap();

    let summary = serde_json::to_value(tally.summary().unwrap()).unwrap();
    assert_eq!(summary["content"], json!(null));
    assert_eq!(summary["attachments_total"], json!(3));
    assert_eq!(summary["combined_total"], json!(3));
}

#[test]
fn test_save_overwrites_previous_total() {
    let tally = in_memory_tally(Box::new(MemoryCache::new()), Duration::from_secs(60));

    tally.save_pdf_total(100).unwrap();
    tally.save_pdf_total(3).unwrap();

    assert_eq!(tally.cached_pdf_total().unwrap(), Some(3));
}

#[test]
fn test_refresh_replaces_content_entry() {
    let cache = SqliteCache::open_in_memory().unwrap();
    cache
        .put(CONTENT_KEY, json!({"stale": true}), Duration::from_secs(60))
        .unwrap();
    let tally = in_memory_tally(Box::new(cache.clone()), Duration::from_secs(60));

    let result = tally.refresh_content().unwrap();

    assert_eq!(result.total_words, 6);
    assert_eq!(tally.cached_content().unwrap(), Some(result));
    assert!(cache.get(ATTACHMENTS_KEY).unwrap().is_none());
}

#[test]
fn test_cached_values_expire_after_ttl() {
    let tally = in_memory_tally(Box::new(MemoryCache::new()), Duration::from_millis(50));

    tally.refresh_content().unwrap();
    tally.save_pdf_total(3).unwrap();
    assert_eq!(tally.combined_total().unwrap(), Some(9));

    std::thread::sleep(Duration::from_millis(120));

    assert!(tally.cached_content().unwrap().is_none());
    assert_eq!(tally.cached_pdf_total().unwrap(), None);
    assert_eq!(tally.combined_total().unwrap(), None);
}

#[test]
fn test_sqlite_ttl_from_config_file() {
    let harness = TestHarness::new();
    harness.write_record(
        "1",
        json!({"category": "post", "status": "publish", "title": "Short lived"}),
    );

    let config_path = harness.base().join("wordtally.json");
    std::fs::write(
        &config_path,
        serde_json::to_string(&json!({
            "version": "1.0",
            "content": {"directory": harness.records_dir},
            "attachments": {"directory": harness.media_dir},
            "cache": {"path": harness.cache_path, "ttl_secs": 1}
        }))
        .unwrap(),
    )
    .unwrap();

    let config = load_config(&config_path).unwrap();
    let tally = WordTally::from_config(&config).unwrap();

    assert_eq!(tally.refresh_content().unwrap().total_words, 2);
    assert!(tally.cached_content().unwrap().is_some());

    std::thread::sleep(Duration::from_millis(1_100));
    assert!(tally.cached_content().unwrap().is_none());
}
