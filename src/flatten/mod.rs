//! Record flattening module
//!
//! Turns a nested record into a flat mapping of path keys to scalar leaves.
//!
//! # Overview
//!
//! - Mapping entries extend the path with their key
//! - Sequence elements extend the path with their zero-based index
//! - Scalars and nulls are leaves
//!
//! ```text
//! {"a": {"b": 1}}      → {"a_b": 1}
//! {"x": [{"y": 2}]}    → {"x_0_y": 2}
//! ```
//!
//! Empty mappings and empty sequences produce no entries.

mod flattener;

pub use flattener::{flatten, Flattened, Flattener, DEFAULT_SEPARATOR};
