//! Engine types
//!
//! Run phases, statistics and outcomes for the load engine.

use crate::row::ProjectionStats;
use crate::types::{LoadMode, MergeOutcome};
use serde::Serialize;
use std::fmt;

/// Where a load run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// Nothing done yet
    #[default]
    Start,
    /// Destination relation exists
    TableEnsured,
    /// Column set derived
    SchemaInferred,
    /// Rows being written or merged
    Streaming,
    /// Source exhausted, last batch flushed
    Drained,
    /// Run finished
    Done,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadPhase::Start => "start",
            LoadPhase::TableEnsured => "table_ensured",
            LoadPhase::SchemaInferred => "schema_inferred",
            LoadPhase::Streaming => "streaming",
            LoadPhase::Drained => "drained",
            LoadPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Statistics from a load run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStats {
    /// Load mode of the run
    pub mode: Option<LoadMode>,
    /// Columns in the inferred column set
    pub columns: usize,
    /// Rows written (full refresh) or merged (upsert)
    pub rows_loaded: usize,
    /// Batches written (full refresh)
    pub batches: usize,
    /// Merges that updated an existing row
    pub matched: usize,
    /// Merges that inserted a new row
    pub inserted: usize,
    /// Records skipped for a missing key value
    pub rows_skipped: usize,
    /// Leaves overwritten by a colliding flat key
    pub collisions: usize,
    /// Fields dropped or null-filled by projection
    pub projection: ProjectionStats,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl LoadStats {
    /// Create stats for a run in `mode`
    pub fn new(mode: LoadMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    /// Count a merge result
    pub fn add_merge(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Matched => self.matched += 1,
            MergeOutcome::Inserted => self.inserted += 1,
        }
        self.rows_loaded += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

/// Result of a run that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Rows were loaded
    Loaded(LoadStats),
    /// The source had no records; nothing was written or truncated
    EmptySource,
}

impl LoadOutcome {
    /// Check if the source was empty
    pub fn is_empty_source(&self) -> bool {
        matches!(self, Self::EmptySource)
    }

    /// Stats of a loaded run
    pub fn stats(&self) -> Option<&LoadStats> {
        match self {
            Self::Loaded(stats) => Some(stats),
            Self::EmptySource => None,
        }
    }

    /// Rows loaded (zero for an empty source)
    pub fn rows_loaded(&self) -> usize {
        self.stats().map_or(0, |s| s.rows_loaded)
    }
}
