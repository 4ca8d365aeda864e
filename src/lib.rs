// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]

//! # flatsink
//!
//! Loads schema-less nested records into a table whose columns are derived
//! from the records themselves.
//!
//! ## Features
//!
//! - **Flattening**: nested mappings and sequences become path-keyed leaves
//!   (`{"a": {"b": 1}}` → `a_b`), with an escaped key encoding that rules out
//!   separator collisions
//! - **Column inference**: from the first record, or the union over a full scan
//! - **Full refresh**: truncate and reload in batches
//! - **Incremental upsert**: merge every record by a key column
//! - **Sources**: JSON, JSON Lines and DynamoDB-typed JSON files
//! - **Sinks**: DuckDB (file or in-memory) and an in-process memory sink
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use flatsink::database::DuckDbSink;
//! use flatsink::decode::DecoderFormat;
//! use flatsink::handler::full_refresh_handler;
//! use flatsink::source::FileSource;
//! use flatsink::LoadConfig;
//!
//! let config = LoadConfig::from_env()?.with_table("items");
//! let source = FileSource::new("items.jsonl", DecoderFormat::Jsonl);
//!
//! let response = full_refresh_handler(&config, &source, DuckDbSink::open);
//! println!("{}", response.body);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │   full_refresh_handler()        incremental_upsert_handler() │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                  LoadEngine (TableEnsured → SchemaInferred →
//!                              Streaming → Drained → Done)
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬───────────┐
//! │  Source  │  Flatten  │    Schema     │    Row    │   Sink    │
//! ├──────────┼───────────┼───────────────┼───────────┼───────────┤
//! │ Memory   │ Plain     │ SampleFirst   │ Project   │ Memory    │
//! │ File     │ Escaped   │ FullScanUnion │ Batcher   │ DuckDB    │
//! └──────────┴───────────┴───────────────┴───────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Nested record flattening
pub mod flatten;

/// Column set inference
pub mod schema;

/// Row projection
pub mod row;

/// Row batching
pub mod batch;

/// Record decoders (JSON, JSON Lines, DynamoDB)
pub mod decode;

/// Record sources
pub mod source;

/// Sink trait and memory sink
pub mod sink;

/// DuckDB sink
pub mod database;

/// Load configuration
pub mod config;

/// Load engine
pub mod engine;

/// Load entry points
pub mod handler;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::LoadConfig;
pub use engine::{LoadEngine, LoadOutcome, LoadStats};
pub use handler::{full_refresh_handler, incremental_upsert_handler, LoadResponse};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
