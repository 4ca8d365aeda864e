//! Database integration tests with DuckDB
//!
//! Runs both load modes against DuckDB databases on disk, one sink session
//! per run, the way the CLI does.

use flatsink::database::DuckDbSink;
use flatsink::decode::DecoderFormat;
use flatsink::handler::{full_refresh_handler, incremental_upsert_handler, ResponseStatus};
use flatsink::source::{FileSource, MemorySource};
use flatsink::LoadConfig;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn config(dir: &TempDir, table: &str) -> LoadConfig {
    LoadConfig::default()
        .with_database(dir.path().join("load.duckdb").display().to_string())
        .with_table(table)
}

fn rows(config: &LoadConfig, order_by: &str) -> Vec<serde_json::Value> {
    DuckDbSink::open(config)
        .unwrap()
        .fetch_rows(order_by)
        .unwrap()
}

// ============================================================================
// Full Refresh
// ============================================================================

#[test]
fn test_full_refresh_from_jsonl_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("items.jsonl");
    std::fs::write(
        &path,
        "{\"uuid\": \"a\", \"price\": {\"amount\": 10, \"currency\": \"EUR\"}}\n\
         {\"uuid\": \"b\", \"price\": {\"amount\": 12, \"currency\": \"USD\"}}\n\
         {\"uuid\": \"c\", \"price\": {\"amount\": 7, \"currency\": \"EUR\"}}\n",
    )
    .unwrap();
    let config = config(&dir, "items").with_batch_size(2);
    let source = FileSource::new(&path, DecoderFormat::Jsonl);

    let response = full_refresh_handler(&config, &source, DuckDbSink::open);

    assert_eq!(response.status_code, 200, "{}", response.body);
    assert_eq!(response.stats.as_ref().unwrap().batches, 2);
    assert_eq!(
        rows(&config, "uuid"),
        vec![
            json!({"price_amount": 10, "price_currency": "EUR", "uuid": "a"}),
            json!({"price_amount": 12, "price_currency": "USD", "uuid": "b"}),
            json!({"price_amount": 7, "price_currency": "EUR", "uuid": "c"}),
        ]
    );
}

#[test]
fn test_full_refresh_replaces_rows() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "items");

    let first = MemorySource::new(vec![json!({"uuid": "a"}), json!({"uuid": "b"})]);
    full_refresh_handler(&config, &first, DuckDbSink::open);

    let second = MemorySource::new(vec![json!({"uuid": "c"})]);
    let response = full_refresh_handler(&config, &second, DuckDbSink::open);

    assert_eq!(response.status_code, 200, "{}", response.body);
    assert_eq!(rows(&config, "uuid"), vec![json!({"uuid": "c"})]);
}

#[test]
fn test_empty_source_leaves_table_untouched() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "items");

    let source = MemorySource::new(vec![json!({"uuid": "a"})]);
    full_refresh_handler(&config, &source, DuckDbSink::open);

    let response = full_refresh_handler(&config, &MemorySource::new(vec![]), DuckDbSink::open);

    assert_eq!(response.status, ResponseStatus::EmptySource);
    assert_eq!(rows(&config, "uuid"), vec![json!({"uuid": "a"})]);
}

#[test]
fn test_new_columns_are_added_between_runs() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "events");

    let first = MemorySource::new(vec![json!({"uuid": "1", "kind": "click"})]);
    full_refresh_handler(&config, &first, DuckDbSink::open);

    let second = MemorySource::new(vec![json!({"uuid": "2", "kind": "view", "meta": {"ms": 30}})]);
    let response = full_refresh_handler(&config, &second, DuckDbSink::open);

    assert_eq!(response.status_code, 200, "{}", response.body);
    assert_eq!(
        rows(&config, "uuid"),
        vec![json!({"kind": "view", "meta_ms": 30, "uuid": "2"})]
    );
}

#[test]
fn test_schema_qualified_table() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "staging.items");

    let source = MemorySource::new(vec![json!({"uuid": "a", "n": 1})]);
    let response = full_refresh_handler(&config, &source, DuckDbSink::open);

    assert_eq!(response.status_code, 200, "{}", response.body);
    assert_eq!(rows(&config, "uuid"), vec![json!({"n": 1, "uuid": "a"})]);
}

#[test]
fn test_full_refresh_widens_mixed_values() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "items").with_batch_size(1);

    let source = MemorySource::new(vec![
        json!({"uuid": "a", "v": 1, "w": 1}),
        json!({"uuid": "b", "v": "not a number", "w": 2.75}),
    ]);
    let response = full_refresh_handler(&config, &source, DuckDbSink::open);

    assert_eq!(response.status_code, 200, "{}", response.body);
    assert_eq!(
        rows(&config, "uuid"),
        vec![
            json!({"uuid": "a", "v": "1", "w": 1.0}),
            json!({"uuid": "b", "v": "not a number", "w": 2.75}),
        ]
    );
}

#[test]
fn test_full_refresh_case_conflict_keeps_existing_rows() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "people");

    let first = MemorySource::new(vec![json!({"uuid": "a", "name": 1})]);
    full_refresh_handler(&config, &first, DuckDbSink::open);

    let second = MemorySource::new(vec![json!({"uuid": "b", "Name": 1, "name": 2})]);
    let response = full_refresh_handler(&config, &second, DuckDbSink::open);

    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("differ only by case"), "{}", response.body);
    assert_eq!(rows(&config, "uuid"), vec![json!({"name": 1, "uuid": "a"})]);
}

// ============================================================================
// Incremental Upsert
// ============================================================================

#[test]
fn test_upsert_updates_and_inserts() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "people");

    let first = MemorySource::new(vec![
        json!({"uuid": "1", "name": "Ann", "age": 30}),
        json!({"uuid": "2", "name": "Bob", "age": 40}),
    ]);
    incremental_upsert_handler(&config, &first, DuckDbSink::open);

    let second = MemorySource::new(vec![
        json!({"uuid": "2", "name": "Bob", "age": 41}),
        json!({"uuid": "3", "name": "Cy", "age": 22}),
    ]);
    let response = incremental_upsert_handler(&config, &second, DuckDbSink::open);

    let stats = response.stats.as_ref().unwrap();
    assert_eq!((stats.matched, stats.inserted), (1, 1));
    assert_eq!(
        rows(&config, "uuid"),
        vec![
            json!({"age": 30, "name": "Ann", "uuid": "1"}),
            json!({"age": 41, "name": "Bob", "uuid": "2"}),
            json!({"age": 22, "name": "Cy", "uuid": "3"}),
        ]
    );
}

#[test]
fn test_upsert_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "people");
    let source = MemorySource::new(vec![
        json!({"uuid": "1", "address": {"city": "Oslo"}}),
        json!({"uuid": "2", "address": {"city": "Rome"}}),
    ]);

    incremental_upsert_handler(&config, &source, DuckDbSink::open);
    let after_first = rows(&config, "uuid");

    let response = incremental_upsert_handler(&config, &source, DuckDbSink::open);
    assert_eq!(response.stats.as_ref().unwrap().matched, 2);
    assert_eq!(rows(&config, "uuid"), after_first);
}

#[test]
fn test_upsert_without_key_column_fails() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "people");
    let source = MemorySource::new(vec![json!({"id": 1})]);

    let response = incremental_upsert_handler(&config, &source, DuckDbSink::open);

    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("Key column 'uuid'"));
}

#[test]
fn test_upsert_case_conflict_fails_before_merging() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "people");
    let source = MemorySource::new(vec![json!({"uuid": "a", "Name": 1, "name": 2})]);

    let response = incremental_upsert_handler(&config, &source, DuckDbSink::open);

    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("differ only by case"), "{}", response.body);
    assert!(rows(&config, "uuid").is_empty());
}

#[test]
fn test_upsert_widens_key_and_value_columns() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, "people");

    let first = MemorySource::new(vec![json!({"uuid": 1, "score": 10})]);
    incremental_upsert_handler(&config, &first, DuckDbSink::open);

    let second = MemorySource::new(vec![
        json!({"uuid": 1, "score": 10.5}),
        json!({"uuid": "two", "score": 3}),
    ]);
    let response = incremental_upsert_handler(&config, &second, DuckDbSink::open);

    assert_eq!(response.status_code, 200, "{}", response.body);
    let stats = response.stats.as_ref().unwrap();
    assert_eq!((stats.matched, stats.inserted), (1, 1));
    assert_eq!(
        rows(&config, "uuid"),
        vec![
            json!({"score": 10.5, "uuid": "1"}),
            json!({"score": 3.0, "uuid": "two"}),
        ]
    );
}

#[test]
fn test_unreachable_database_is_sink_unavailable() {
    let config = LoadConfig::default().with_database("/no/such/dir/load.duckdb");
    let source = MemorySource::new(vec![json!({"uuid": "a"})]);

    let response = full_refresh_handler(&config, &source, DuckDbSink::open);

    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("Sink unavailable"));
    assert_eq!(source.scan_count(), 0);
}
