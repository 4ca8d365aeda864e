//! In-memory source

use super::{RecordIter, Source};
use crate::error::Result;
use crate::types::NestedRecord;
use std::cell::Cell;

/// Source backed by a vector of records
#[derive(Debug, Default)]
pub struct MemorySource {
    records: Vec<NestedRecord>,
    scans: Cell<usize>,
}

impl MemorySource {
    /// Create a source over `records`
    pub fn new(records: Vec<NestedRecord>) -> Self {
        Self {
            records,
            scans: Cell::new(0),
        }
    }

    /// Number of scans started so far
    pub fn scan_count(&self) -> usize {
        self.scans.get()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the source holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Source for MemorySource {
    fn scan(&self) -> Result<RecordIter<'_>> {
        self.scans.set(self.scans.get() + 1);
        Ok(Box::new(self.records.iter().cloned().map(Ok)))
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}
