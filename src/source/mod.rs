//! Source module
//!
//! A source produces a fresh, finite, ordered record sequence on every
//! `scan()` call. Scans restart from the beginning; nothing assumes random
//! access or two scans being active at once.
//!
//! # Overview
//!
//! - `Source` - the scan capability the load engine consumes
//! - `MemorySource` - records held in memory
//! - `FileSource` - a file decoded on every scan (lines are streamed)

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;

use crate::error::Result;
use crate::types::NestedRecord;

/// Lazy record sequence produced by one scan
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<NestedRecord>> + 'a>;

/// A restartable record source
pub trait Source {
    /// Start a new scan from the first record
    fn scan(&self) -> Result<RecordIter<'_>>;

    /// Human-readable description (for logging)
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests;
