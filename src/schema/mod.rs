//! Schema inference module
//!
//! Derives the column set a load run writes against.
//!
//! # Strategies
//!
//! - **Sample** (default): flatten the first record of a fresh scan and use its
//!   sorted keys. Later records are projected onto that fixed set, so leaves
//!   they add are dropped and leaves they omit become null.
//! - **Full scan**: consume one whole scan and use the sorted union of keys.
//!   Costs an extra pass over the source.
//!
//! Either way the column set is fixed for the rest of the run.

mod inference;
mod types;

pub use inference::{
    infer_columns, inferrer_for, ColumnInferrer, FullScanUnion, SampleFirst,
};
pub use types::ColumnSet;
