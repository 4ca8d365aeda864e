//! Load engine module
//!
//! Drives one load run from a source into a sink.
//!
//! # Overview
//!
//! The engine module provides:
//! - `LoadEngine` - runs the full-refresh and incremental-upsert state machines
//! - `LoadPhase` - `Start → TableEnsured → SchemaInferred → Streaming → Drained → Done`
//! - `LoadStats` / `LoadOutcome` - what a run did
//!
//! Both modes share the `TableEnsured → SchemaInferred` prefix. An empty
//! source ends the run there: nothing is written, truncated or merged.

mod types;

pub use types::{LoadOutcome, LoadPhase, LoadStats};

use crate::batch::Batcher;
use crate::config::LoadConfig;
use crate::error::{Error, Result};
use crate::flatten::Flattener;
use crate::row::{project_counting, Row};
use crate::schema::{inferrer_for, ColumnInferrer, ColumnSet};
use crate::sink::Sink;
use crate::source::Source;
use crate::types::{LoadMode, NestedRecord};
use std::time::Instant;

/// Load engine for one configuration
pub struct LoadEngine {
    /// Run configuration
    config: LoadConfig,
    /// Flattener built from the config
    flattener: Flattener,
    /// Column set strategy
    inferrer: Box<dyn ColumnInferrer>,
    /// Current phase of the last run
    phase: LoadPhase,
    /// Statistics of the last run
    stats: LoadStats,
}

impl LoadEngine {
    /// Create an engine for a validated config
    pub fn new(config: LoadConfig) -> Self {
        Self {
            flattener: config.flattener(),
            inferrer: inferrer_for(config.schema_strategy),
            config,
            phase: LoadPhase::Start,
            stats: LoadStats::default(),
        }
    }

    /// Use a custom column set strategy
    #[must_use]
    pub fn with_inferrer(mut self, inferrer: Box<dyn ColumnInferrer>) -> Self {
        self.inferrer = inferrer;
        self
    }

    /// Get the config
    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Phase the last run reached (where it stopped on failure)
    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Statistics of the last run
    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// Replace the relation's contents with every source record
    pub fn full_refresh(&mut self, source: &dyn Source, sink: &mut dyn Sink) -> Result<LoadOutcome> {
        let start = Instant::now();
        self.begin(LoadMode::FullRefresh, source, sink);

        let Some(columns) = self.prepare(source, sink)? else {
            return Ok(self.finish_empty());
        };

        sink.bind_columns(&columns)?;
        sink.truncate()?;
        self.enter(LoadPhase::Streaming);

        let mut batcher = Batcher::new(self.config.batch_size);
        for record in source.scan()? {
            let row = self.to_row(&record?, &columns);
            if batcher.append(row) {
                self.stats.rows_loaded += batcher.flush(sink, &columns)?;
            }
        }

        self.stats.rows_loaded += batcher.flush(sink, &columns)?;
        self.stats.batches = batcher.flushes();
        self.enter(LoadPhase::Drained);

        Ok(self.finish(start))
    }

    /// Merge every source record into the relation by the key column
    pub fn incremental_upsert(
        &mut self,
        source: &dyn Source,
        sink: &mut dyn Sink,
    ) -> Result<LoadOutcome> {
        let start = Instant::now();
        self.begin(LoadMode::IncrementalUpsert, source, sink);

        let Some(columns) = self.prepare(source, sink)? else {
            return Ok(self.finish_empty());
        };

        let key_column = self.resolve_key_column(&columns)?;

        sink.bind_columns(&columns)?;
        self.enter(LoadPhase::Streaming);

        for (index, record) in source.scan()?.enumerate() {
            let row = self.to_row(&record?, &columns);
            if row.non_null(&key_column).is_none() {
                tracing::warn!("Skipping record {index}: no value for key column '{key_column}'");
                self.stats.rows_skipped += 1;
                continue;
            }

            let outcome = sink.merge_row(&row, &columns, &key_column)?;
            self.stats.add_merge(outcome);
        }

        Ok(self.finish(start))
    }

    // ========================================================================
    // Run steps
    // ========================================================================

    fn begin(&mut self, mode: LoadMode, source: &dyn Source, sink: &dyn Sink) {
        self.phase = LoadPhase::Start;
        self.stats = LoadStats::new(mode);
        tracing::info!(
            "Starting {} from {} into {}",
            mode,
            source.describe(),
            sink.describe()
        );
    }

    /// Ensure the relation and infer the column set (`None` for an empty source)
    fn prepare(&mut self, source: &dyn Source, sink: &mut dyn Sink) -> Result<Option<ColumnSet>> {
        sink.ensure_relation_exists()?;
        self.enter(LoadPhase::TableEnsured);

        let Some(columns) = self.inferrer.infer(source.scan()?, &self.flattener)? else {
            return Ok(None);
        };

        self.stats.columns = columns.len();
        self.enter(LoadPhase::SchemaInferred);
        tracing::info!(
            "Inferred {} columns ({} strategy)",
            columns.len(),
            self.inferrer.name()
        );
        tracing::debug!("Columns: {:?}", columns.as_slice());

        Ok(Some(columns))
    }

    /// Flat column holding the configured key: the name as given, or as a
    /// top-level field written through the key encoding
    fn resolve_key_column(&self, columns: &ColumnSet) -> Result<String> {
        let configured = &self.config.key_column;
        if columns.contains(configured) {
            return Ok(configured.clone());
        }
        let encoded = self.flattener.encode_key(configured);
        if columns.contains(&encoded) {
            return Ok(encoded.into_owned());
        }
        Err(Error::key_column_missing(configured.clone()))
    }

    fn to_row(&mut self, record: &NestedRecord, columns: &ColumnSet) -> Row {
        let flattened = self.flattener.flatten_reporting(record);
        self.stats.collisions += flattened.collisions;

        let projection = project_counting(&flattened.record, columns);
        self.stats.projection.add(projection.stats);
        projection.row
    }

    fn enter(&mut self, phase: LoadPhase) {
        tracing::debug!("Load phase {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    fn finish_empty(&mut self) -> LoadOutcome {
        self.enter(LoadPhase::Done);
        tracing::info!("Source is empty, nothing loaded");
        LoadOutcome::EmptySource
    }

    fn finish(&mut self, start: Instant) -> LoadOutcome {
        self.enter(LoadPhase::Done);
        self.stats.set_duration(start.elapsed().as_millis() as u64);

        if self.stats.collisions > 0 {
            tracing::warn!(
                "{} flat key collision(s); later leaves overwrote earlier ones",
                self.stats.collisions
            );
        }
        if !self.stats.projection.is_lossless() {
            tracing::warn!(
                "Projection dropped {} field(s) and null-filled {} field(s)",
                self.stats.projection.dropped,
                self.stats.projection.defaulted
            );
        }

        tracing::info!(
            "Loaded {} rows ({} matched, {} inserted, {} skipped, {} batches) in {}ms",
            self.stats.rows_loaded,
            self.stats.matched,
            self.stats.inserted,
            self.stats.rows_skipped,
            self.stats.batches,
            self.stats.duration_ms
        );

        LoadOutcome::Loaded(self.stats.clone())
    }
}
