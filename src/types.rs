//! Common types used throughout flatsink
//!
//! This module contains shared type definitions, type aliases,
//! and small enums used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A nested, schema-less record as produced by a source
pub type NestedRecord = JsonValue;

/// A path-joined key naming one leaf of a nested record
pub type FlatKey = String;

/// One entry per leaf of a nested record, ordered by key
pub type FlatRecord = BTreeMap<FlatKey, JsonValue>;

// ============================================================================
// Load Mode
// ============================================================================

/// How rows are written to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Truncate the relation and reload every record in batches
    FullRefresh,
    /// Merge every record into the relation by key
    IncrementalUpsert,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::FullRefresh => write!(f, "full_refresh"),
            LoadMode::IncrementalUpsert => write!(f, "incremental_upsert"),
        }
    }
}

// ============================================================================
// Flattening
// ============================================================================

/// How literal mapping keys are written into a flat key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
    /// Keys are joined as-is. A key containing the separator can collide
    /// with a nested path.
    #[default]
    Plain,
    /// Backslash and separator occurrences inside a key are escaped with a
    /// backslash, so distinct paths always produce distinct flat keys.
    Escaped,
}

impl std::str::FromStr for KeyEncoding {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(KeyEncoding::Plain),
            "escaped" => Ok(KeyEncoding::Escaped),
            other => Err(crate::error::Error::invalid_value(
                "key_encoding",
                format!("expected 'plain' or 'escaped', got '{other}'"),
            )),
        }
    }
}

// ============================================================================
// Schema Strategy
// ============================================================================

/// Which records the column set is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaStrategy {
    /// Only the first record of a fresh scan
    #[default]
    Sample,
    /// The union of keys over one full scan
    FullScan,
}

impl std::str::FromStr for SchemaStrategy {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sample" | "sample_first" => Ok(SchemaStrategy::Sample),
            "full_scan" | "union" => Ok(SchemaStrategy::FullScan),
            other => Err(crate::error::Error::invalid_value(
                "schema_strategy",
                format!("expected 'sample' or 'full_scan', got '{other}'"),
            )),
        }
    }
}

// ============================================================================
// Merge Outcome
// ============================================================================

/// Result of merging one row into the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// A row with the same key existed and was overwritten
    Matched,
    /// No row had the key, the full row was inserted
    Inserted,
}
