//! Loose request payloads.
//!
//! Handlers validate field *presence* before anything is typed, so bodies are first
//! read into a plain JSON object map. Clients send numbers as strings and vice versa;
//! the accessors here coerce between the two.

use serde_json::{Map, Value};

pub type Payload = Map<String, Value>;

/// Parses a request body into a payload. Empty bodies, invalid JSON and
/// non-object documents all yield `None`.
pub fn from_json_body(body: &[u8]) -> Option<Payload> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return None;
    }
    match serde_json::from_slice::<Value>(body).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Returns the field as text. Numbers and booleans are rendered, null counts as absent.
pub fn text(payload: &Payload, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Returns the field as an integer, accepting JSON integers and numeric strings.
pub fn integer(payload: &Payload, key: &str) -> Option<i64> {
    match payload.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Like [`integer`], narrowed to `i32` (database ids).
pub fn id(payload: &Payload, key: &str) -> Option<i32> {
    integer(payload, key).and_then(|v| i32::try_from(v).ok())
}

/// Interprets a checkbox-like field. Missing or unrecognised values are `false`.
pub fn flag(payload: &Payload, key: &str) -> bool {
    match payload.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}
