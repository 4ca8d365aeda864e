//! Row projector

use super::types::{ProjectionStats, Row};
use crate::schema::ColumnSet;
use crate::types::{FlatRecord, JsonValue};
use std::collections::BTreeMap;

/// A projected row with the fields it lost or defaulted
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// The aligned row
    pub row: Row,
    /// Dropped and null-filled field counts
    pub stats: ProjectionStats,
}

/// Project a flat record onto a column set
pub fn project(flat: &FlatRecord, columns: &ColumnSet) -> Row {
    project_counting(flat, columns).row
}

/// Project a flat record onto a column set, counting dropped and defaulted fields
pub fn project_counting(flat: &FlatRecord, columns: &ColumnSet) -> Projection {
    let mut cells = BTreeMap::new();
    let mut stats = ProjectionStats::default();

    for column in columns {
        let value = match flat.get(column) {
            Some(value) => value.clone(),
            None => {
                stats.defaulted += 1;
                JsonValue::Null
            }
        };
        cells.insert(column.clone(), value);
    }

    stats.dropped = flat.keys().filter(|k| !columns.contains(k)).count();

    Projection {
        row: Row::from_cells(cells),
        stats,
    }
}
