//! Flattening of nested JSON objects into log record fields

use crate::value::{LogRecord, Value};
use serde_json::{Map, Value as Json};

/// Flatten a JSON object into a record with dot-notation keys
///
/// Examples:
/// - `{"user": {"name": "Alice"}}` → `user.name = "Alice"`
/// - `{"items": ["a", "b"]}` → `items.0 = "a"`, `items.1 = "b"`
/// - `{"users": [{"name": "Alice"}]}` → `users.0.name = "Alice"`
pub fn flatten_record(data: &Map<String, Json>) -> LogRecord {
    let mut fields = Vec::new();
    for (key, value) in data {
        flatten_recursive(value, key.clone(), &mut fields);
    }
    LogRecord::from_fields(fields)
}

/// Recursively flatten a JSON value into `(key, value)` pairs
fn flatten_recursive(value: &Json, prefix: String, fields: &mut Vec<(String, Value)>) {
    match value {
        Json::Object(obj) => {
            for (key, val) in obj {
                flatten_recursive(val, format!("{}.{}", prefix, key), fields);
            }
        }
        Json::Array(arr) => {
            for (index, val) in arr.iter().enumerate() {
                flatten_recursive(val, format!("{}.{}", prefix, index), fields);
            }
        }
        scalar => {
            if let Some(value) = Value::from_json(scalar) {
                fields.push((prefix, value));
            }
        }
    }
}
