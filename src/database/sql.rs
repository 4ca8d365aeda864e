//! SQL helpers: identifier quoting, column typing and value conversion

use crate::types::JsonValue;
use duckdb::types::Value;

/// Column type chosen for a flat key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// `BOOLEAN`
    Boolean,
    /// `BIGINT`
    BigInt,
    /// `DOUBLE`
    Double,
    /// `VARCHAR`
    Varchar,
}

impl SqlType {
    /// Type for a JSON value, `None` for null
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(_) => Some(SqlType::Boolean),
            JsonValue::Number(n) if n.is_i64() => Some(SqlType::BigInt),
            JsonValue::Number(_) => Some(SqlType::Double),
            _ => Some(SqlType::Varchar),
        }
    }

    /// Type for a catalog `data_type`, `None` for types flatsink never creates
    pub fn from_sql(data_type: &str) -> Option<Self> {
        match data_type.to_ascii_uppercase().as_str() {
            "BOOLEAN" => Some(SqlType::Boolean),
            "TINYINT" | "SMALLINT" | "INTEGER" | "BIGINT" => Some(SqlType::BigInt),
            "FLOAT" | "DOUBLE" => Some(SqlType::Double),
            "VARCHAR" => Some(SqlType::Varchar),
            _ => None,
        }
    }

    /// Narrowest type holding values of both types
    ///
    /// Integers and floats meet at `DOUBLE`; any other mix is `VARCHAR`.
    #[must_use]
    pub fn widen(self, other: SqlType) -> SqlType {
        match (self, other) {
            (a, b) if a == b => a,
            (SqlType::BigInt, SqlType::Double) | (SqlType::Double, SqlType::BigInt) => {
                SqlType::Double
            }
            _ => SqlType::Varchar,
        }
    }

    /// Widened type of every non-null value, `None` when all are null
    pub fn for_values<'a>(values: impl IntoIterator<Item = &'a JsonValue>) -> Option<Self> {
        values
            .into_iter()
            .filter_map(SqlType::from_json)
            .reduce(SqlType::widen)
    }

    /// SQL spelling
    pub fn as_sql(self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE",
            SqlType::Varchar => "VARCHAR",
        }
    }
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Convert a JSON scalar to a DuckDB value
pub fn json_to_duckdb_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::BigInt(i)
            } else if let Some(u) = n.as_u64() {
                Value::UBigInt(u)
            } else {
                n.as_f64().map_or(Value::Null, Value::Double)
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        // Flattened rows hold scalars only
        other => Value::Text(other.to_string()),
    }
}

/// Convert a JSON scalar to a value of the column's type
///
/// Columns of unknown type take the value as-is.
pub fn json_to_typed_value(value: &JsonValue, column_type: Option<SqlType>) -> Value {
    match (column_type, value) {
        (_, JsonValue::Null) => Value::Null,
        (Some(SqlType::Varchar), JsonValue::String(s)) => Value::Text(s.clone()),
        (Some(SqlType::Varchar), other) => Value::Text(other.to_string()),
        (Some(SqlType::Double), JsonValue::Number(n)) => {
            n.as_f64().map_or(Value::Null, Value::Double)
        }
        _ => json_to_duckdb_value(value),
    }
}

/// Convert a DuckDB value to JSON
pub fn duckdb_value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::Number(i.into()),
        Value::SmallInt(i) => JsonValue::Number(i.into()),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::BigInt(i) => JsonValue::Number(i.into()),
        Value::HugeInt(i) => JsonValue::String(i.to_string()),
        Value::UTinyInt(i) => JsonValue::Number(i.into()),
        Value::USmallInt(i) => JsonValue::Number(i.into()),
        Value::UInt(i) => JsonValue::Number(i.into()),
        Value::UBigInt(i) => JsonValue::Number(i.into()),
        Value::Float(f) => {
            serde_json::Number::from_f64(f64::from(f)).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Double(f) => {
            serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Text(s) => JsonValue::String(s),
        Value::Timestamp(_, i) => {
            // Microseconds since epoch
            let secs = i / 1_000_000;
            let nsecs = ((i % 1_000_000) * 1000) as u32;
            chrono::DateTime::from_timestamp(secs, nsecs)
                .map(|dt| JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()))
                .unwrap_or(JsonValue::Number(i.into()))
        }
        other => JsonValue::String(format!("{other:?}")),
    }
}
