//! Column set inference strategies

use super::types::ColumnSet;
use crate::error::Result;
use crate::flatten::Flattener;
use crate::source::RecordIter;
use crate::types::{NestedRecord, SchemaStrategy};
use std::collections::BTreeSet;

/// Derives a column set from a record stream
///
/// Returns `Ok(None)` when the stream yields no records.
pub trait ColumnInferrer {
    /// Strategy name (for logging)
    fn name(&self) -> &'static str;

    /// Consume as much of `records` as the strategy needs
    fn infer(&self, records: RecordIter<'_>, flattener: &Flattener) -> Result<Option<ColumnSet>>;
}

/// Uses the keys of the first record only
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleFirst;

impl ColumnInferrer for SampleFirst {
    fn name(&self) -> &'static str {
        "sample"
    }

    fn infer(
        &self,
        mut records: RecordIter<'_>,
        flattener: &Flattener,
    ) -> Result<Option<ColumnSet>> {
        match records.next() {
            Some(sample) => {
                let sample = sample?;
                Ok(Some(ColumnSet::from_record(&flattener.flatten(&sample))))
            }
            None => Ok(None),
        }
    }
}

/// Uses the union of keys over every record
#[derive(Debug, Clone, Copy, Default)]
pub struct FullScanUnion;

impl ColumnInferrer for FullScanUnion {
    fn name(&self) -> &'static str {
        "full_scan"
    }

    fn infer(&self, records: RecordIter<'_>, flattener: &Flattener) -> Result<Option<ColumnSet>> {
        let mut keys = BTreeSet::new();
        let mut seen = 0usize;

        for record in records {
            let record = record?;
            keys.extend(flattener.flatten(&record).into_keys());
            seen += 1;
        }

        if seen == 0 {
            return Ok(None);
        }

        tracing::debug!("Union of {} keys over {} records", keys.len(), seen);
        Ok(Some(ColumnSet::from_keys(keys)))
    }
}

/// Get the inferrer for a configured strategy
pub fn inferrer_for(strategy: SchemaStrategy) -> Box<dyn ColumnInferrer> {
    match strategy {
        SchemaStrategy::Sample => Box::new(SampleFirst),
        SchemaStrategy::FullScan => Box::new(FullScanUnion),
    }
}

/// Infer the column set from one sample record (default separator)
pub fn infer_columns(sample: &NestedRecord) -> ColumnSet {
    ColumnSet::from_record(&Flattener::default().flatten(sample))
}
