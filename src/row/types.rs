//! Row types

use crate::schema::ColumnSet;
use crate::types::{FlatKey, JsonValue};
use serde::Serialize;
use std::collections::BTreeMap;

static NULL: JsonValue = JsonValue::Null;

/// A record aligned to a column set
///
/// Cells are kept in column order (the column set is sorted the same way).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<FlatKey, JsonValue>,
}

impl Row {
    /// Build a row from cells
    pub fn from_cells(cells: BTreeMap<FlatKey, JsonValue>) -> Self {
        Self { cells }
    }

    /// Value of a column
    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.cells.get(column)
    }

    /// Value of a column, treating null as absent
    pub fn non_null(&self, column: &str) -> Option<&JsonValue> {
        self.cells.get(column).filter(|v| !v.is_null())
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over (column, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Values in the order of `columns`, null where the row lacks a column
    pub fn values_for<'a>(&'a self, columns: &'a ColumnSet) -> impl Iterator<Item = &'a JsonValue> {
        columns
            .iter()
            .map(|c| self.cells.get(c).unwrap_or(&NULL))
    }

    /// Consume the row into its cells
    pub fn into_cells(self) -> BTreeMap<FlatKey, JsonValue> {
        self.cells
    }
}

/// Fields lost or filled in while projecting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionStats {
    /// Flat keys not in the column set
    pub dropped: usize,
    /// Columns the flat record did not have
    pub defaulted: usize,
}

impl ProjectionStats {
    /// Add another projection's counts
    pub fn add(&mut self, other: ProjectionStats) {
        self.dropped += other.dropped;
        self.defaulted += other.defaulted;
    }

    /// Whether nothing was dropped or defaulted
    pub fn is_lossless(&self) -> bool {
        self.dropped == 0 && self.defaulted == 0
    }
}
