//! CLI module
//!
//! Command-line interface for running loads.
//!
//! # Commands
//!
//! - `full-refresh` - Truncate the table and reload every record
//! - `upsert` - Merge records into the table by key
//! - `infer` - Print the inferred column set
//! - `flatten` - Print flattened records

mod commands;
mod runner;

pub use commands::{Cli, Commands, InputArgs, OutputFormat, ShapeArgs};
pub use runner::Runner;
