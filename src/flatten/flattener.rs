//! Flattener implementation

use crate::types::{FlatRecord, JsonValue, KeyEncoding};
use std::borrow::Cow;

/// Separator used when none is configured
pub const DEFAULT_SEPARATOR: &str = "_";

/// A flattened record together with the number of key collisions seen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened {
    /// The flat record
    pub record: FlatRecord,
    /// Leaves that overwrote an earlier leaf with the same flat key
    pub collisions: usize,
}

/// Flattens nested records into path-keyed leaves
#[derive(Debug, Clone)]
pub struct Flattener {
    /// Joins path segments
    separator: String,
    /// How literal keys are written
    encoding: KeyEncoding,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl Flattener {
    /// Create a flattener with the given separator and plain key encoding
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            encoding: KeyEncoding::Plain,
        }
    }

    /// Set the key encoding
    #[must_use]
    pub fn with_key_encoding(mut self, encoding: KeyEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Get the separator
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Get the key encoding
    pub fn key_encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Flatten a whole record
    pub fn flatten(&self, record: &JsonValue) -> FlatRecord {
        self.flatten_with_prefix(record, "")
    }

    /// Flatten a subtree whose path so far is `prefix`
    pub fn flatten_with_prefix(&self, node: &JsonValue, prefix: &str) -> FlatRecord {
        let mut out = Flattened::default();
        self.walk(node, prefix.to_string(), &mut out);
        out.record
    }

    /// Flatten a record and count separator collisions
    pub fn flatten_reporting(&self, record: &JsonValue) -> Flattened {
        let mut out = Flattened::default();
        self.walk(record, String::new(), &mut out);
        out
    }

    fn walk(&self, node: &JsonValue, prefix: String, out: &mut Flattened) {
        match node {
            JsonValue::Object(map) => {
                for (key, value) in map {
                    let segment = self.encode_key(key);
                    self.walk(value, self.join(&prefix, &segment), out);
                }
            }
            JsonValue::Array(items) => {
                for (idx, value) in items.iter().enumerate() {
                    self.walk(value, self.join(&prefix, &idx.to_string()), out);
                }
            }
            leaf => {
                if out.record.insert(prefix, leaf.clone()).is_some() {
                    out.collisions += 1;
                }
            }
        }
    }

    fn join(&self, prefix: &str, segment: &str) -> String {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}{}{segment}", self.separator)
        }
    }

    /// A literal object key as it appears in a flat key
    pub fn encode_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match self.encoding {
            KeyEncoding::Plain => Cow::Borrowed(key),
            KeyEncoding::Escaped => {
                if !key.contains('\\') && !key.contains(self.separator.as_str()) {
                    return Cow::Borrowed(key);
                }
                let escaped = key
                    .replace('\\', "\\\\")
                    .replace(self.separator.as_str(), &format!("\\{}", self.separator));
                Cow::Owned(escaped)
            }
        }
    }
}

/// Flatten a record with the default separator and plain key encoding
pub fn flatten(record: &JsonValue) -> FlatRecord {
    Flattener::default().flatten(record)
}
