//! Canonical JSON -- byte-stable serialization for signed payloads.
//!
//! Object keys are recursively sorted and no insignificant whitespace is
//! emitted, so two independent implementations signing the same logical
//! value produce byte-identical payloads regardless of key insertion order.

use serde_json::{Map, Value};

use crate::error::Result;

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Serialize `value` as canonical JSON bytes.
pub fn canonical_json(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&sort_keys(value))?)
}
