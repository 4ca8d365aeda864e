//! In-memory sink

use super::Sink;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::schema::ColumnSet;
use crate::types::{JsonValue, MergeOutcome};

/// A call made against a [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    /// `ensure_relation_exists`
    EnsureRelation,
    /// `bind_columns` with the column count
    BindColumns(usize),
    /// `truncate`
    Truncate,
    /// `write_batch` with the row count
    WriteBatch(usize),
    /// `merge_row` with the key column
    MergeRow(String),
}

/// Sink that keeps rows in memory and records every call
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Relation name (for logging)
    name: String,
    /// Whether the relation was created
    relation_exists: bool,
    /// Columns the relation can hold
    columns: Vec<String>,
    /// Stored rows
    rows: Vec<Row>,
    /// Every call in order
    calls: Vec<SinkCall>,
    /// Fail the nth (1-based) write or merge call
    fail_on_call: Option<usize>,
    /// Write and merge calls so far
    write_calls: usize,
}

impl MemorySink {
    /// Create an empty memory sink
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Fail the nth write or merge call (1-based)
    #[must_use]
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Stored rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Recorded calls
    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    /// Columns the relation holds
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether `ensure_relation_exists` has run
    pub fn relation_exists(&self) -> bool {
        self.relation_exists
    }

    /// Number of `write_batch` calls
    pub fn write_batch_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::WriteBatch(_)))
            .count()
    }

    /// Number of `merge_row` calls
    pub fn merge_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SinkCall::MergeRow(_)))
            .count()
    }

    /// Find a stored row by column value
    pub fn find(&self, column: &str, value: &JsonValue) -> Option<&Row> {
        self.rows.iter().find(|r| r.get(column) == Some(value))
    }

    fn require_relation(&self) -> Result<()> {
        if self.relation_exists {
            Ok(())
        } else {
            Err(Error::write_failure(format!(
                "relation '{}' does not exist",
                self.name
            )))
        }
    }

    fn check_injected_failure(&mut self) -> Result<()> {
        self.write_calls += 1;
        if self.fail_on_call == Some(self.write_calls) {
            return Err(Error::write_failure(format!(
                "injected failure on call {}",
                self.write_calls
            )));
        }
        Ok(())
    }
}

impl Sink for MemorySink {
    fn ensure_relation_exists(&mut self) -> Result<()> {
        self.calls.push(SinkCall::EnsureRelation);
        self.relation_exists = true;
        Ok(())
    }

    fn bind_columns(&mut self, columns: &ColumnSet) -> Result<()> {
        self.calls.push(SinkCall::BindColumns(columns.len()));
        self.require_relation()?;
        for column in columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
        Ok(())
    }

    fn truncate(&mut self) -> Result<()> {
        self.calls.push(SinkCall::Truncate);
        self.require_relation()?;
        self.rows.clear();
        Ok(())
    }

    fn write_batch(&mut self, rows: &[Row], _columns: &ColumnSet) -> Result<usize> {
        self.calls.push(SinkCall::WriteBatch(rows.len()));
        self.require_relation()?;
        self.check_injected_failure()?;
        self.rows.extend_from_slice(rows);
        Ok(rows.len())
    }

    fn merge_row(
        &mut self,
        row: &Row,
        _columns: &ColumnSet,
        key_column: &str,
    ) -> Result<MergeOutcome> {
        self.calls.push(SinkCall::MergeRow(key_column.to_string()));
        self.require_relation()?;
        self.check_injected_failure()?;

        let key = row
            .non_null(key_column)
            .ok_or_else(|| Error::write_failure(format!("row has no '{key_column}' value")))?;

        match self
            .rows
            .iter_mut()
            .find(|r| r.get(key_column) == Some(key))
        {
            Some(existing) => {
                *existing = row.clone();
                Ok(MergeOutcome::Matched)
            }
            None => {
                self.rows.push(row.clone());
                Ok(MergeOutcome::Inserted)
            }
        }
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }
}
