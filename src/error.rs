//! Error types for flatsink
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! An empty source is not an error: it is reported as a load outcome.

use thiserror::Error;

/// The main error type for flatsink
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Source error: {message}")]
    Source { message: String },

    #[error("Failed to decode records: {message}")]
    Decode { message: String },

    // ============================================================================
    // Sink Errors
    // ============================================================================
    #[error("Sink unavailable: {message}")]
    SinkUnavailable { message: String },

    #[error("Write failed: {message}")]
    WriteFailure { message: String },

    #[error("Key column '{column}' not present in inferred columns")]
    KeyColumnMissing { column: String },

    #[error("Columns '{first}' and '{second}' differ only by case")]
    ColumnConflict { first: String, second: String },

    #[error("Invalid identifier '{identifier}'")]
    InvalidIdentifier { identifier: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a source error
    pub fn scan_failed(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a sink unavailable error
    pub fn sink_unavailable(message: impl Into<String>) -> Self {
        Self::SinkUnavailable {
            message: message.into(),
        }
    }

    /// Create a write failure error
    pub fn write_failure(message: impl Into<String>) -> Self {
        Self::WriteFailure {
            message: message.into(),
        }
    }

    /// Create a key column missing error
    pub fn key_column_missing(column: impl Into<String>) -> Self {
        Self::KeyColumnMissing {
            column: column.into(),
        }
    }

    /// Create a column conflict error
    pub fn column_conflict(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::ColumnConflict {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(identifier: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
        }
    }

    /// Check if this error happened while talking to the sink
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            Error::SinkUnavailable { .. } | Error::WriteFailure { .. }
        )
    }
}

/// Result type alias for flatsink
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
