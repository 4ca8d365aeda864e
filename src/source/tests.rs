//! Tests for sources

use super::*;
use crate::decode::DecoderFormat;
use crate::error::Error;
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;

fn collect(source: &dyn Source) -> Vec<serde_json::Value> {
    source
        .scan()
        .unwrap()
        .collect::<crate::error::Result<Vec<_>>>()
        .unwrap()
}

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_memory_source_restarts() {
    let source = MemorySource::new(vec![json!({"id": 1}), json!({"id": 2})]);

    let mut first = source.scan().unwrap();
    assert_eq!(first.next().unwrap().unwrap(), json!({"id": 1}));
    drop(first);

    assert_eq!(collect(&source), vec![json!({"id": 1}), json!({"id": 2})]);
    assert_eq!(source.scan_count(), 2);
    assert_eq!(source.len(), 2);
}

#[test]
fn test_memory_source_empty() {
    let source = MemorySource::default();
    assert!(source.is_empty());
    assert!(collect(&source).is_empty());
}

#[test]
fn test_file_source_jsonl_streams_lines() {
    let file = temp_file("{\"id\": 1}\n\n{\"id\": 2, \"nested\": {\"a\": [1]}}\n");
    let source = FileSource::new(file.path(), DecoderFormat::Jsonl);

    assert_eq!(
        collect(&source),
        vec![json!({"id": 1}), json!({"id": 2, "nested": {"a": [1]}})]
    );
    // Restartable
    assert_eq!(collect(&source).len(), 2);
}

#[test]
fn test_file_source_jsonl_error_carries_line() {
    let file = temp_file("{\"id\": 1}\nnot json\n");
    let source = FileSource::new(file.path(), DecoderFormat::Jsonl);

    let results: Vec<_> = source.scan().unwrap().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert!(err.to_string().contains(":2:"));
}

#[test]
fn test_file_source_json_document() {
    let file = temp_file(r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#);
    let source = FileSource::new(file.path(), DecoderFormat::Json);
    assert_eq!(collect(&source).len(), 3);
}

#[test]
fn test_file_source_dynamo_document() {
    let file = temp_file(
        r#"{"Things": [{"PutRequest": {"Item": {"uuid": {"S": "a"}, "n": {"N": "7"}}}}]}"#,
    );
    let source = FileSource::new(file.path(), DecoderFormat::Dynamo);
    assert_eq!(collect(&source), vec![json!({"uuid": "a", "n": 7})]);
}

#[test]
fn test_file_source_missing_file() {
    let source = FileSource::new("/definitely/not/here.jsonl", DecoderFormat::Jsonl);
    assert!(matches!(source.scan(), Err(Error::FileNotFound { .. })));
}

#[test]
fn test_file_source_describe() {
    let source = FileSource::new("data.jsonl", DecoderFormat::Jsonl);
    assert_eq!(source.describe(), "file data.jsonl");
    assert_eq!(source.path().to_str(), Some("data.jsonl"));
}
