//! Helpers that turn backend error payloads into `LlmError`.

use super::types::{ErrorCode, LlmError};
use crate::defaults::protocol::DEFAULT_ERROR_MESSAGE;
use serde_json::Value;

/// Human-readable text of an error payload, if it carries any.
fn payload_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => ["message", "detail", "error"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Array(_) => Some(v.to_string()),
                _ => None,
            }),
        Value::Array(_) => Some(detail.to_string()),
        _ => None,
    }
}

/// Code of an error payload: `code`, then `type`.
fn payload_code(detail: &Value) -> Option<ErrorCode> {
    let obj = detail.as_object()?;
    obj.get("code")
        .and_then(ErrorCode::from_value)
        .or_else(|| obj.get("type").and_then(ErrorCode::from_value))
}

impl LlmError {
    /// Build a `BackendError` from an error payload found inside a successful body
    /// or a stream line. `detail` is the value of the `error` field when present,
    /// otherwise the whole document.
    pub fn from_embedded_payload(detail: &Value) -> Self {
        Self::BackendError {
            code: payload_code(detail).unwrap_or_default(),
            message: payload_message(detail).unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
            details: Some(detail.clone()),
        }
    }
}
