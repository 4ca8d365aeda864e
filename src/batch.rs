//! Row batching for full-refresh loads
//!
//! The batcher holds rows until the caller flushes them to a sink as one
//! write. It never retries: a failed flush propagates and the rows stay held.

use crate::error::Result;
use crate::row::Row;
use crate::schema::ColumnSet;
use crate::sink::Sink;

/// Default rows per batch
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Accumulates rows up to a threshold
#[derive(Debug)]
pub struct Batcher {
    /// Held rows
    rows: Vec<Row>,
    /// Flush threshold
    capacity: usize,
    /// Successful non-empty flushes
    flushes: usize,
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl Batcher {
    /// Create a batcher that fills up at `capacity` rows (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            rows: Vec::with_capacity(capacity),
            capacity,
            flushes: 0,
        }
    }

    /// Add a row, returning true when the batch has reached its threshold
    pub fn append(&mut self, row: Row) -> bool {
        self.rows.push(row);
        self.is_full()
    }

    /// Whether the threshold is reached
    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    /// Rows currently held
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are held
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flush threshold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of flushes that reached the sink
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Hand held rows to the sink as one write and clear them
    ///
    /// An empty batch is not sent.
    pub fn flush(&mut self, sink: &mut dyn Sink, columns: &ColumnSet) -> Result<usize> {
        if self.rows.is_empty() {
            return Ok(0);
        }

        let written = sink.write_batch(&self.rows, columns)?;
        tracing::debug!(
            "Flushed batch {} ({} rows) to {}",
            self.flushes + 1,
            written,
            sink.describe()
        );

        self.rows.clear();
        self.flushes += 1;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::row::project;
    use crate::sink::{MemorySink, SinkCall};
    use serde_json::json;
    use test_case::test_case;

    fn rows(n: usize, columns: &ColumnSet) -> Vec<Row> {
        (0..n)
            .map(|i| project(&flatten(&json!({ "id": i })), columns))
            .collect()
    }

    fn drive(n: usize, threshold: usize) -> MemorySink {
        let columns = ColumnSet::from_keys(["id"]);
        let mut sink = MemorySink::new("t");
        sink.ensure_relation_exists().unwrap();
        let mut batcher = Batcher::new(threshold);

        for row in rows(n, &columns) {
            if batcher.append(row) {
                batcher.flush(&mut sink, &columns).unwrap();
            }
        }
        batcher.flush(&mut sink, &columns).unwrap();
        sink
    }

    #[test_case(10, 5, &[5, 5] ; "exact multiple")]
    #[test_case(12, 5, &[5, 5, 2] ; "with remainder")]
    #[test_case(3, 5, &[3] ; "under threshold")]
    #[test_case(0, 5, &[] ; "no rows")]
    #[test_case(4, 1, &[1, 1, 1, 1] ; "threshold of one")]
    fn test_flush_counts(n: usize, threshold: usize, expected: &[usize]) {
        let sink = drive(n, threshold);

        let writes: Vec<usize> = sink
            .calls()
            .iter()
            .filter_map(|c| match c {
                SinkCall::WriteBatch(count) => Some(*count),
                _ => None,
            })
            .collect();

        assert_eq!(writes, expected);
        assert_eq!(sink.rows().len(), n);
    }

    #[test]
    fn test_append_reports_full() {
        let columns = ColumnSet::from_keys(["id"]);
        let mut batcher = Batcher::new(2);
        let mut input = rows(2, &columns).into_iter();

        assert!(!batcher.append(input.next().unwrap()));
        assert!(batcher.append(input.next().unwrap()));
        assert_eq!(batcher.len(), 2);
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let columns = ColumnSet::from_keys(["id"]);
        let mut sink = MemorySink::new("t");
        let mut batcher = Batcher::default();

        assert_eq!(batcher.flush(&mut sink, &columns).unwrap(), 0);
        assert!(sink.calls().is_empty());
        assert_eq!(batcher.flushes(), 0);
        assert_eq!(batcher.capacity(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_failed_flush_keeps_rows() {
        let columns = ColumnSet::from_keys(["id"]);
        let mut sink = MemorySink::new("t").failing_on(1);
        sink.ensure_relation_exists().unwrap();
        let mut batcher = Batcher::new(10);
        for row in rows(3, &columns) {
            batcher.append(row);
        }

        assert!(batcher.flush(&mut sink, &columns).is_err());
        assert_eq!(batcher.len(), 3);
        assert_eq!(batcher.flushes(), 0);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        assert_eq!(Batcher::new(0).capacity(), 1);
    }
}
