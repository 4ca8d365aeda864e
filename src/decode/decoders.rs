//! Decoder implementations
//!
//! Each decoder handles a specific file format.

use super::attribute::item_to_json;
use super::types::RecordDecoder;
use crate::error::{Error, Result};
use serde_json::{Map, Value};

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// Dotted path to the records (e.g. `data.items`)
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// Extract records from a JSON value using the path
    fn extract_records(&self, value: Value) -> Vec<Value> {
        let target = match &self.record_path {
            Some(path) => match extract_simple_path(&value, path) {
                Some(v) => v,
                None => return vec![],
            },
            None => value,
        };

        match target {
            Value::Array(arr) => arr,
            Value::Null => vec![],
            other => vec![other],
        }
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        if body.trim().is_empty() {
            return Ok(vec![]);
        }
        let value: Value = serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse JSON: {e}"),
        })?;
        Ok(self.extract_records(value))
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines decoder (one JSON record per line)
#[derive(Debug, Clone, Default)]
pub struct JsonlDecoder;

impl JsonlDecoder {
    /// Create a new JSONL decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonlDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        let mut records = Vec::new();

        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| Error::Decode {
                message: format!("Failed to parse JSONL at line {}: {e}", line_num + 1),
            })?;

            records.push(value);
        }

        Ok(records)
    }

    fn is_line_delimited(&self) -> bool {
        true
    }
}

// ============================================================================
// DynamoDB Decoder
// ============================================================================

/// Decoder for DynamoDB-typed JSON
///
/// Document mode accepts a batch-write request file
/// (`{"Table": [{"PutRequest": {"Item": {...}}}]}`), an array of items or
/// wrapped items, or a single item. Lines mode accepts one item, `{"Item": ...}`
/// or `{"PutRequest": ...}` per line.
#[derive(Debug, Clone, Default)]
pub struct DynamoDecoder {
    /// Only read requests under this table key (document mode)
    table: Option<String>,
    /// Feed line by line
    lines: bool,
}

impl DynamoDecoder {
    /// Decoder for a whole document
    pub fn document() -> Self {
        Self::default()
    }

    /// Decoder for export lines
    pub fn lines() -> Self {
        Self {
            table: None,
            lines: true,
        }
    }

    /// Only read requests for one table
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    fn decode_document(&self, value: &Value) -> Result<Vec<Value>> {
        match value {
            Value::Array(entries) => decode_entries(entries),
            Value::Object(map) if is_request_document(map) => {
                let mut records = Vec::new();
                for (table, entries) in map {
                    if self.table.as_ref().is_some_and(|t| t != table) {
                        continue;
                    }
                    if let Value::Array(entries) = entries {
                        records.extend(decode_entries(entries)?);
                    }
                }
                Ok(records)
            }
            Value::Object(_) => Ok(decode_entry(value)?.into_iter().collect()),
            other => Err(Error::decode(format!(
                "Expected a DynamoDB item document, got {}",
                json_type_name(other)
            ))),
        }
    }
}

impl RecordDecoder for DynamoDecoder {
    fn decode(&self, body: &str) -> Result<Vec<Value>> {
        if self.lines {
            let mut records = Vec::new();
            for (line_num, line) in body.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(line).map_err(|e| Error::Decode {
                    message: format!("Failed to parse DynamoDB line {}: {e}", line_num + 1),
                })?;
                records.extend(decode_entry(&value)?);
            }
            return Ok(records);
        }

        if body.trim().is_empty() {
            return Ok(vec![]);
        }
        let value: Value = serde_json::from_str(body).map_err(|e| Error::Decode {
            message: format!("Failed to parse DynamoDB JSON: {e}"),
        })?;
        self.decode_document(&value)
    }

    fn is_line_delimited(&self) -> bool {
        self.lines
    }
}

/// A table-keyed request document has only array values
fn is_request_document(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.values().all(Value::is_array)
}

fn decode_entries(entries: &[Value]) -> Result<Vec<Value>> {
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        records.extend(decode_entry(entry)?);
    }
    Ok(records)
}

/// Unwrap `PutRequest`/`Item` envelopes and convert the item
///
/// Delete requests carry no record and are skipped.
fn decode_entry(entry: &Value) -> Result<Option<Value>> {
    let Value::Object(map) = entry else {
        return Err(Error::decode(format!(
            "Expected a DynamoDB item object, got {}",
            json_type_name(entry)
        )));
    };

    if map.contains_key("DeleteRequest") {
        tracing::debug!("Skipping DeleteRequest entry");
        return Ok(None);
    }

    let item = if let Some(put) = map.get("PutRequest") {
        put.get("Item")
            .ok_or_else(|| Error::decode("PutRequest without Item"))?
    } else if let Some(item) = map.get("Item") {
        item
    } else {
        entry
    };

    match item {
        Value::Object(attributes) => item_to_json(attributes).map(Some),
        other => Err(Error::decode(format!(
            "Expected DynamoDB item attributes, got {}",
            json_type_name(other)
        ))),
    }
}

pub(super) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extract a value using simple dot notation (e.g. `data.items` or `pages[0].rows`)
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].trim_end_matches(']');

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index: usize = index_str.parse().ok()?;
            current = current.as_array()?.get(index)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}
