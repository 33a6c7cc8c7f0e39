//! Tolerant decoding helpers.
//!
//! The local store persists booleans as 0/1 integers while the remote store
//! and legacy payloads may carry native booleans or the strings "0"/"1", so
//! reads normalize all of them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a boolean, accepting `true`, `1` and `"1"`.
pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(v) => Some(*v),
        Value::Number(n) => n
            .as_i64()
            .map(|v| v != 0)
            .or_else(|| n.as_f64().map(|v| v != 0.0)),
        Value::String(s) => match s.trim() {
            "1" | "true" | "TRUE" | "True" => Some(true),
            "0" | "false" | "FALSE" | "False" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Serde deserializer for boolean fields that may arrive as bool, 0/1 or "1".
///
/// Missing and unrecognized values decode as `false`.
pub fn tolerant_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_bool(&value).unwrap_or(false))
}
