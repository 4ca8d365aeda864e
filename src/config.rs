//! Load configuration
//!
//! A `LoadConfig` is built once at process start (defaults, then a YAML file,
//! then environment variables, then CLI flags) and passed into the engine.
//! Nothing below this module reads the environment.

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::{Error, Result};
use crate::flatten::{Flattener, DEFAULT_SEPARATOR};
use crate::types::{KeyEncoding, SchemaStrategy};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// `table` or `schema.table`
static TABLE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$").unwrap()
});

/// Environment variable names
pub mod env {
    /// Destination table
    pub const TABLE: &str = "FLATSINK_TABLE";
    /// Sink database path
    pub const DATABASE: &str = "FLATSINK_DATABASE";
    /// Rows per batch
    pub const BATCH_SIZE: &str = "FLATSINK_BATCH_SIZE";
    /// Merge key column
    pub const KEY_COLUMN: &str = "FLATSINK_KEY_COLUMN";
    /// Flat key separator
    pub const SEPARATOR: &str = "FLATSINK_SEPARATOR";
    /// `plain` or `escaped`
    pub const KEY_ENCODING: &str = "FLATSINK_KEY_ENCODING";
    /// `sample` or `full_scan`
    pub const SCHEMA_STRATEGY: &str = "FLATSINK_SCHEMA_STRATEGY";
}

/// Configuration for one load run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Destination relation
    pub table: String,

    /// Sink database (file path or `:memory:`)
    pub database: String,

    /// Rows per full-refresh write
    pub batch_size: usize,

    /// Column that identifies a record in upsert mode
    ///
    /// Either a flat column name or a top-level field name. A field name is
    /// passed through the key encoding, so `user_id` finds the column
    /// `user\_id` under escaped encoding.
    pub key_column: String,

    /// Joins flat key segments
    pub separator: String,

    /// How literal keys are written into flat keys
    pub key_encoding: KeyEncoding,

    /// Which records the column set is derived from
    pub schema_strategy: SchemaStrategy,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            table: "records".to_string(),
            database: ":memory:".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            key_column: "uuid".to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            key_encoding: KeyEncoding::default(),
            schema_strategy: SchemaStrategy::default(),
        }
    }
}

impl LoadConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a config from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup (see [`env`])
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(table) = lookup(env::TABLE) {
            self.table = table;
        }
        if let Some(database) = lookup(env::DATABASE) {
            self.database = database;
        }
        if let Some(size) = lookup(env::BATCH_SIZE) {
            self.batch_size = size.trim().parse().map_err(|_| {
                Error::invalid_value("batch_size", format!("'{size}' is not a number"))
            })?;
        }
        if let Some(key) = lookup(env::KEY_COLUMN) {
            self.key_column = key;
        }
        if let Some(separator) = lookup(env::SEPARATOR) {
            self.separator = separator;
        }
        if let Some(encoding) = lookup(env::KEY_ENCODING) {
            self.key_encoding = encoding.parse()?;
        }
        if let Some(strategy) = lookup(env::SCHEMA_STRATEGY) {
            self.schema_strategy = strategy.parse()?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Set the destination table
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set the sink database
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the batch size
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the merge key column
    #[must_use]
    pub fn with_key_column(mut self, key: impl Into<String>) -> Self {
        self.key_column = key.into();
        self
    }

    /// Set the separator
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the key encoding
    #[must_use]
    pub fn with_key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.key_encoding = encoding;
        self
    }

    /// Set the schema strategy
    #[must_use]
    pub fn with_schema_strategy(mut self, strategy: SchemaStrategy) -> Self {
        self.schema_strategy = strategy;
        self
    }

    /// Check the config for values no run can use
    pub fn validate(&self) -> Result<()> {
        if self.table.is_empty() {
            return Err(Error::missing_field("table"));
        }
        if !TABLE_IDENTIFIER.is_match(&self.table) {
            return Err(Error::invalid_identifier(&self.table));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_value("batch_size", "must be at least 1"));
        }
        if self.key_column.is_empty() {
            return Err(Error::missing_field("key_column"));
        }
        if self.separator.is_empty() {
            return Err(Error::invalid_value("separator", "must not be empty"));
        }
        if self.key_encoding == KeyEncoding::Escaped && self.separator.contains('\\') {
            return Err(Error::invalid_value(
                "separator",
                "must not contain a backslash with escaped key encoding",
            ));
        }
        if self.database.is_empty() {
            return Err(Error::missing_field("database"));
        }
        Ok(())
    }

    /// Build the flattener this config describes
    pub fn flattener(&self) -> Flattener {
        Flattener::new(self.separator.clone()).with_key_encoding(self.key_encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoadConfig::default();
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.separator, "_");
        assert_eq!(config.key_column, "uuid");
        assert_eq!(config.database, ":memory:");
        assert_eq!(config.key_encoding, KeyEncoding::Plain);
        assert_eq!(config.schema_strategy, SchemaStrategy::Sample);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = LoadConfig::new()
            .with_table("analytics.events")
            .with_batch_size(50)
            .with_key_column("id")
            .with_separator(".")
            .with_key_encoding(KeyEncoding::Escaped)
            .with_schema_strategy(SchemaStrategy::FullScan)
            .with_database("/tmp/x.duckdb");

        assert_eq!(config.table, "analytics.events");
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.key_column, "id");
        assert_eq!(config.flattener().separator(), ".");
        assert_eq!(config.flattener().key_encoding(), KeyEncoding::Escaped);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = LoadConfig::default()
            .with_env_overrides(lookup(&[
                (env::TABLE, "staging.items"),
                (env::BATCH_SIZE, " 25 "),
                (env::KEY_COLUMN, "pk"),
                (env::SCHEMA_STRATEGY, "full_scan"),
                (env::KEY_ENCODING, "escaped"),
            ]))
            .unwrap();

        assert_eq!(config.table, "staging.items");
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.key_column, "pk");
        assert_eq!(config.schema_strategy, SchemaStrategy::FullScan);
        assert_eq!(config.key_encoding, KeyEncoding::Escaped);
        assert_eq!(config.separator, "_");
    }

    #[test]
    fn test_env_bad_batch_size() {
        let result = LoadConfig::default().with_env_overrides(lookup(&[(env::BATCH_SIZE, "lots")]));
        assert!(matches!(result, Err(Error::InvalidConfigValue { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(LoadConfig::new().with_table("").validate().is_err());
        assert!(LoadConfig::new()
            .with_table("drop table x; --")
            .validate()
            .is_err());
        assert!(LoadConfig::new().with_table("db.main.items").validate().is_err());
        assert!(LoadConfig::new().with_batch_size(0).validate().is_err());
        assert!(LoadConfig::new().with_separator("").validate().is_err());
        assert!(LoadConfig::new().with_key_column("").validate().is_err());
        assert!(LoadConfig::new()
            .with_separator("\\")
            .with_key_encoding(KeyEncoding::Escaped)
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r"
table: nested_items
batch_size: 100
key_column: id
schema_strategy: full_scan
";
        let config = LoadConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.table, "nested_items");
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.key_column, "id");
        assert_eq!(config.schema_strategy, SchemaStrategy::FullScan);
        assert_eq!(config.separator, "_");
    }

    #[test]
    fn test_from_yaml_unknown_field() {
        assert!(LoadConfig::from_yaml("tabel: oops\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "table: from_file\nseparator: \"__\"").unwrap();

        let config = LoadConfig::from_file(file.path()).unwrap();
        assert_eq!(config.table, "from_file");
        assert_eq!(config.separator, "__");
    }

    #[test]
    fn test_from_file_missing() {
        let result = LoadConfig::from_file("/no/such/config.yaml");
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }
}
