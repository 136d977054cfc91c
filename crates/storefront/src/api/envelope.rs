//! Response envelope handling.
//!
//! The backend is inconsistent about response shapes. Depending on the route
//! a list of brands can arrive as any of:
//!
//! ```json
//! [{ "_id": "b1", "name": "Loom" }]
//! { "success": true, "data": [{ "_id": "b1", "name": "Loom" }] }
//! { "success": true, "data": { "brands": [{ "_id": "b1", "name": "Loom" }] } }
//! ```
//!
//! and failures may come back with a 200 status and `"success": false`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::ApiError;

const MAX_MESSAGE_CHARS: usize = 200;

/// Parse a response body, treating an empty body as `null`.
///
/// # Errors
///
/// Returns `ApiError::Parse` if the body is not JSON.
pub fn parse_body(body: &str) -> Result<Value, ApiError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Strip a `{ success, data }` envelope, surfacing `success: false`.
///
/// Values that are not envelopes are returned untouched.
///
/// # Errors
///
/// Returns `ApiError::Rejected` when the envelope reports failure.
pub fn unwrap(value: Value) -> Result<Value, ApiError> {
    match value {
        Value::Object(mut map) if is_envelope(&map) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                return Err(ApiError::Rejected(
                    message_in(&map).unwrap_or_else(|| "request was not successful".to_string()),
                ));
            }
            Ok(map.remove("data").unwrap_or(Value::Object(map)))
        }
        other => Ok(other),
    }
}

/// Decode an enveloped or raw payload into `T`.
///
/// # Errors
///
/// Returns `ApiError::Rejected` for failed envelopes and `ApiError::Parse`
/// when the payload does not match `T`.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(unwrap(value)?)?)
}

/// Decode a list that may be a bare array, an enveloped array, or an object
/// holding a single array field (`{ "brands": [...] }`). `null` is empty.
///
/// # Errors
///
/// Returns `ApiError::UnexpectedShape` when no array can be found.
pub fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    match unwrap(value)? {
        Value::Null => Ok(Vec::new()),
        array @ Value::Array(_) => Ok(serde_json::from_value(array)?),
        Value::Object(mut map) => {
            let key = ["items", "results", "docs", "rows"]
                .into_iter()
                .find(|k| map.get(*k).is_some_and(Value::is_array))
                .map(str::to_string)
                .or_else(|| {
                    map.iter()
                        .find(|(_, v)| v.is_array())
                        .map(|(k, _)| k.clone())
                });
            match key.and_then(|k| map.remove(&k)) {
                Some(array) => Ok(serde_json::from_value(array)?),
                None => Err(ApiError::UnexpectedShape(
                    "expected a list in the response".to_string(),
                )),
            }
        }
        other => Err(ApiError::UnexpectedShape(format!(
            "expected a list, got {}",
            kind(&other)
        ))),
    }
}

/// Lift `{ "<key>": {...} }` to the inner document. Detail routes nest the
/// document under its type name on some endpoints and not on others.
#[must_use]
pub fn unnest(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Human-readable message from an error body: the JSON `message` or
/// `error` field, else the (truncated) raw text.
#[must_use]
pub fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body)
        && let Some(message) = message_in(&map)
    {
        return message;
    }
    let text: String = body.trim().chars().take(MAX_MESSAGE_CHARS).collect();
    if text.is_empty() {
        "no details provided".to_string()
    } else {
        text
    }
}

fn is_envelope(map: &Map<String, Value>) -> bool {
    map.get("success").is_some_and(Value::is_boolean) || map.contains_key("data")
}

fn message_in(map: &Map<String, Value>) -> Option<String> {
    ["message", "error", "msg"]
        .into_iter()
        .find_map(|k| map.get(k).and_then(Value::as_str))
        .map(str::to_string)
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
