//! Sink module
//!
//! The tabular destination a load run writes to.
//!
//! # Overview
//!
//! - `Sink` - capabilities the load engine drives
//! - `MemorySink` - in-process sink that records every call
//!
//! The DuckDB-backed sink lives in [`crate::database`].

mod memory;

pub use memory::{MemorySink, SinkCall};

use crate::error::Result;
use crate::row::Row;
use crate::schema::ColumnSet;
use crate::types::MergeOutcome;

/// A tabular destination for projected rows
///
/// A sink value is one session: it is opened before a run and dropped when
/// the run ends, on success or failure.
pub trait Sink {
    /// Create the destination relation if it does not exist yet
    fn ensure_relation_exists(&mut self) -> Result<()>;

    /// Make sure the relation can receive every column of `columns`
    fn bind_columns(&mut self, columns: &ColumnSet) -> Result<()>;

    /// Remove every row from the relation
    fn truncate(&mut self) -> Result<()>;

    /// Write all rows together, returning the number written
    fn write_batch(&mut self, rows: &[Row], columns: &ColumnSet) -> Result<usize>;

    /// Update the row whose `key_column` matches, or insert it
    fn merge_row(&mut self, row: &Row, columns: &ColumnSet, key_column: &str)
        -> Result<MergeOutcome>;

    /// Human-readable description (for logging)
    fn describe(&self) -> String;
}
