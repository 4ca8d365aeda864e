//! Column set type

use crate::types::{FlatKey, FlatRecord};
use serde::Serialize;

/// Ordered, deduplicated, lexicographically sorted list of flat keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnSet {
    columns: Vec<FlatKey>,
}

impl ColumnSet {
    /// Build a column set from any keys, sorting and removing duplicates
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FlatKey>,
    {
        let mut columns: Vec<FlatKey> = keys.into_iter().map(Into::into).collect();
        columns.sort();
        columns.dedup();
        Self { columns }
    }

    /// Build a column set from the keys of a flat record
    pub fn from_record(record: &FlatRecord) -> Self {
        // BTreeMap keys are already sorted and unique
        Self {
            columns: record.keys().cloned().collect(),
        }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether there are no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether the column is part of the set
    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// Index of a column
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns
            .binary_search_by(|c| c.as_str().cmp(column))
            .ok()
    }

    /// Iterate over column names in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Columns as a slice
    pub fn as_slice(&self) -> &[FlatKey] {
        &self.columns
    }

    /// Every column except `key`, in order
    pub fn excluding<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.iter().filter(move |c| *c != key)
    }
}

impl<'a> IntoIterator for &'a ColumnSet {
    type Item = &'a FlatKey;
    type IntoIter = std::slice::Iter<'a, FlatKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
