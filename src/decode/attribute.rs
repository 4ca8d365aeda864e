//! DynamoDB attribute value conversion
//!
//! Maps typed attribute values onto plain JSON:
//!
//! | Type   | JSON                                      |
//! |--------|-------------------------------------------|
//! | `S`    | string                                    |
//! | `N`    | integer, else float, else original string |
//! | `B`    | base64 string (validated)                 |
//! | `BOOL` | boolean                                   |
//! | `NULL` | null                                      |
//! | `M`    | object                                    |
//! | `L`    | array                                     |
//! | `SS`, `NS`, `BS` | array                           |

use super::decoders::json_type_name;
use crate::error::{Error, Result};
use base64::Engine as _;
use serde_json::{Map, Number, Value};

/// Convert an item (attribute name → attribute value) to a JSON object
pub fn item_to_json(item: &Map<String, Value>) -> Result<Value> {
    let mut out = Map::with_capacity(item.len());
    for (name, attribute) in item {
        let value = attribute_to_json(attribute).map_err(|e| match e {
            Error::Decode { message } => Error::decode(format!("attribute '{name}': {message}")),
            other => other,
        })?;
        out.insert(name.clone(), value);
    }
    Ok(Value::Object(out))
}

/// Convert one typed attribute value to JSON
pub fn attribute_to_json(attribute: &Value) -> Result<Value> {
    let Some(map) = attribute.as_object() else {
        return Err(Error::decode(format!(
            "expected a typed attribute object, got {}",
            json_type_name(attribute)
        )));
    };

    let mut entries = map.iter();
    let (Some((tag, inner)), None) = (entries.next(), entries.next()) else {
        return Err(Error::decode(format!(
            "expected exactly one type descriptor, got {}",
            map.len()
        )));
    };

    match tag.as_str() {
        "S" => expect_string(tag, inner).map(|s| Value::String(s.to_string())),
        "N" => number_to_json(inner),
        "B" => binary_to_json(inner),
        "BOOL" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| type_mismatch(tag, "boolean", inner)),
        "NULL" => Ok(Value::Null),
        "M" => match inner {
            Value::Object(item) => item_to_json(item),
            other => Err(type_mismatch(tag, "object", other)),
        },
        "L" => expect_array(tag, inner)?
            .iter()
            .map(attribute_to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        "SS" => expect_array(tag, inner)?
            .iter()
            .map(|v| expect_string(tag, v).map(|s| Value::String(s.to_string())))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        "NS" => expect_array(tag, inner)?
            .iter()
            .map(number_to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        "BS" => expect_array(tag, inner)?
            .iter()
            .map(binary_to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Err(Error::decode(format!("unknown type descriptor '{other}'"))),
    }
}

/// DynamoDB numbers arrive as strings; exports sometimes carry raw numbers
fn number_to_json(inner: &Value) -> Result<Value> {
    let text = match inner {
        Value::Number(n) => return Ok(Value::Number(n.clone())),
        Value::String(s) => s.trim(),
        other => return Err(type_mismatch("N", "string", other)),
    };

    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(Value::Number(u.into()));
    }
    if let Some(n) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Ok(Value::Number(n));
    }

    // Out of range for f64: keep the exact digits
    Ok(Value::String(text.to_string()))
}

fn binary_to_json(inner: &Value) -> Result<Value> {
    let encoded = expect_string("B", inner)?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| Error::decode(format!("invalid base64 in binary attribute: {e}")))?;
    Ok(Value::String(encoded.to_string()))
}

fn expect_string<'a>(tag: &str, inner: &'a Value) -> Result<&'a str> {
    inner
        .as_str()
        .ok_or_else(|| type_mismatch(tag, "string", inner))
}

fn expect_array<'a>(tag: &str, inner: &'a Value) -> Result<&'a Vec<Value>> {
    inner
        .as_array()
        .ok_or_else(|| type_mismatch(tag, "array", inner))
}

fn type_mismatch(tag: &str, expected: &str, got: &Value) -> Error {
    Error::decode(format!(
        "'{tag}' expects {expected}, got {}",
        json_type_name(got)
    ))
}
