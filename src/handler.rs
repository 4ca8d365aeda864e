//! Load entry points
//!
//! One entry point per load mode. Each opens a sink session, runs the engine
//! and turns the result into a [`LoadResponse`]. The session is dropped
//! before the response is returned, whatever the outcome.

use crate::config::LoadConfig;
use crate::engine::{LoadEngine, LoadOutcome, LoadPhase, LoadStats};
use crate::error::Result;
use crate::sink::Sink;
use crate::source::Source;
use crate::types::LoadMode;
use serde::Serialize;

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Rows were loaded
    Succeeded,
    /// The source had no records
    EmptySource,
    /// The run failed
    Failed,
}

/// Structured response of an entry point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    /// HTTP-style status code (200 or 500)
    pub status_code: u16,
    /// Run status
    pub status: ResponseStatus,
    /// Human-readable summary
    pub body: String,
    /// Run statistics (loaded runs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<LoadStats>,
    /// Phase a failed run stopped in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_phase: Option<LoadPhase>,
}

impl LoadResponse {
    fn loaded(mode: LoadMode, stats: LoadStats) -> Self {
        let body = match mode {
            LoadMode::FullRefresh => format!("Full load succeeded: {} rows", stats.rows_loaded),
            LoadMode::IncrementalUpsert => format!(
                "Upsert succeeded: {} rows ({} matched, {} inserted, {} skipped)",
                stats.rows_loaded, stats.matched, stats.inserted, stats.rows_skipped
            ),
        };
        Self {
            status_code: 200,
            status: ResponseStatus::Succeeded,
            body,
            stats: Some(stats),
            failed_phase: None,
        }
    }

    fn empty_source() -> Self {
        Self {
            status_code: 200,
            status: ResponseStatus::EmptySource,
            body: "No data: source is empty".to_string(),
            stats: None,
            failed_phase: None,
        }
    }

    fn failed(mode: LoadMode, message: String, phase: Option<LoadPhase>) -> Self {
        let body = match mode {
            LoadMode::FullRefresh => format!("Full load failed: {message}"),
            LoadMode::IncrementalUpsert => format!("Upsert failed: {message}"),
        };
        Self {
            status_code: 500,
            status: ResponseStatus::Failed,
            body,
            stats: None,
            failed_phase: phase,
        }
    }

    /// Whether the run did not fail (loaded or empty source)
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Truncate-and-reload entry point
pub fn full_refresh_handler<F, K>(
    config: &LoadConfig,
    source: &dyn Source,
    open_sink: F,
) -> LoadResponse
where
    F: FnOnce(&LoadConfig) -> Result<K>,
    K: Sink,
{
    run(LoadMode::FullRefresh, config, source, open_sink)
}

/// Merge-by-key entry point
pub fn incremental_upsert_handler<F, K>(
    config: &LoadConfig,
    source: &dyn Source,
    open_sink: F,
) -> LoadResponse
where
    F: FnOnce(&LoadConfig) -> Result<K>,
    K: Sink,
{
    run(LoadMode::IncrementalUpsert, config, source, open_sink)
}

fn run<F, K>(
    mode: LoadMode,
    config: &LoadConfig,
    source: &dyn Source,
    open_sink: F,
) -> LoadResponse
where
    F: FnOnce(&LoadConfig) -> Result<K>,
    K: Sink,
{
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        return LoadResponse::failed(mode, e.to_string(), None);
    }

    let mut sink = match open_sink(config) {
        Ok(sink) => sink,
        Err(e) => {
            tracing::error!("Could not open sink: {}", e);
            return LoadResponse::failed(mode, e.to_string(), None);
        }
    };

    let mut engine = LoadEngine::new(config.clone());
    let result = match mode {
        LoadMode::FullRefresh => engine.full_refresh(source, &mut sink),
        LoadMode::IncrementalUpsert => engine.incremental_upsert(source, &mut sink),
    };
    drop(sink);

    match result {
        Ok(LoadOutcome::Loaded(stats)) => LoadResponse::loaded(mode, stats),
        Ok(LoadOutcome::EmptySource) => LoadResponse::empty_source(),
        Err(e) => {
            tracing::error!("{} failed during {}: {}", mode, engine.phase(), e);
            LoadResponse::failed(mode, e.to_string(), Some(engine.phase()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::sink::MemorySink;
    use crate::source::MemorySource;
    use serde_json::json;

    fn memory_sink(config: &LoadConfig) -> Result<MemorySink> {
        Ok(MemorySink::new(config.table.clone()))
    }

    #[test]
    fn test_full_refresh_success() {
        let source = MemorySource::new(vec![json!({"uuid": "1"}), json!({"uuid": "2"})]);
        let response = full_refresh_handler(&LoadConfig::default(), &source, memory_sink);

        assert_eq!(response.status_code, 200);
        assert_eq!(response.status, ResponseStatus::Succeeded);
        assert_eq!(response.body, "Full load succeeded: 2 rows");
        assert_eq!(response.stats.as_ref().unwrap().rows_loaded, 2);
        assert!(response.is_success());
    }

    #[test]
    fn test_upsert_success() {
        let source = MemorySource::new(vec![json!({"uuid": "1", "v": 1})]);
        let response = incremental_upsert_handler(&LoadConfig::default(), &source, memory_sink);

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.body,
            "Upsert succeeded: 1 rows (0 matched, 1 inserted, 0 skipped)"
        );
    }

    #[test]
    fn test_empty_source() {
        let source = MemorySource::new(vec![]);
        let response = full_refresh_handler(&LoadConfig::default(), &source, memory_sink);

        assert_eq!(response.status_code, 200);
        assert_eq!(response.status, ResponseStatus::EmptySource);
        assert!(response.stats.is_none());
    }

    #[test]
    fn test_sink_unavailable() {
        let source = MemorySource::new(vec![json!({"uuid": "1"})]);
        let response = full_refresh_handler(&LoadConfig::default(), &source, |_| {
            Err::<MemorySink, _>(Error::sink_unavailable("connection refused"))
        });

        assert_eq!(response.status_code, 500);
        assert_eq!(response.status, ResponseStatus::Failed);
        assert!(response.body.contains("connection refused"));
        assert_eq!(source.scan_count(), 0);
    }

    #[test]
    fn test_invalid_config_does_not_open_sink() {
        let source = MemorySource::new(vec![json!({"uuid": "1"})]);
        let config = LoadConfig::default().with_batch_size(0);
        let response = full_refresh_handler(&config, &source, |_| -> Result<MemorySink> {
            panic!("sink must not be opened")
        });

        assert_eq!(response.status_code, 500);
    }

    #[test]
    fn test_key_column_missing_reports_phase() {
        let source = MemorySource::new(vec![json!({"id": 1})]);
        let response = incremental_upsert_handler(&LoadConfig::default(), &source, memory_sink);

        assert_eq!(response.status_code, 500);
        assert_eq!(response.failed_phase, Some(LoadPhase::SchemaInferred));
        assert!(response.body.starts_with("Upsert failed"));
    }

    #[test]
    fn test_response_json_keys() {
        let source = MemorySource::new(vec![json!({"uuid": "1"})]);
        let response = full_refresh_handler(&LoadConfig::default(), &source, memory_sink);
        let value: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();

        assert_eq!(value["statusCode"], json!(200));
        assert_eq!(value["status"], json!("succeeded"));
        assert_eq!(value["stats"]["rowsLoaded"], json!(1));
        assert_eq!(value["stats"]["mode"], json!("full_refresh"));
        assert!(value.get("failedPhase").is_none());
    }
}
