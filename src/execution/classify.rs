//! Response classification.
//!
//! Decides how a response is consumed and turns non-2xx replies into a
//! normalized `LlmError::ApiError`.

use crate::defaults::protocol::DEFAULT_ERROR_MESSAGE;
use crate::error::{ErrorCode, LlmError};
use serde_json::Value;

/// How a response body is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionMode {
    /// Non-2xx status: read the body as an error document and stop.
    Error,
    /// Read the whole body as one JSON reply.
    SingleShot,
    /// Decode the body incrementally, line by line.
    Incremental,
}

pub fn consumption_mode(status: u16, stream: bool) -> ConsumptionMode {
    if !(200..300).contains(&status) {
        ConsumptionMode::Error
    } else if stream {
        ConsumptionMode::Incremental
    } else {
        ConsumptionMode::SingleShot
    }
}

/// Classify a non-2xx reply.
///
/// Code: `error.code`, then `error.type`, then `invalid_api_key` for 401,
/// then `unknown`. Message: `error.message`, then top-level `message`, then a
/// plain-string `error`, then a fixed default.
pub fn classify_http_error(status: u16, body_text: &str) -> LlmError {
    let parsed = serde_json::from_str::<Value>(body_text).ok();
    let error_obj = parsed
        .as_ref()
        .and_then(|doc| doc.get("error"))
        .filter(|v| !v.is_null());

    let code = error_obj
        .and_then(|e| {
            e.get("code")
                .and_then(ErrorCode::from_value)
                .or_else(|| e.get("type").and_then(ErrorCode::from_value))
        })
        .unwrap_or_else(|| {
            if status == 401 {
                ErrorCode::InvalidApiKey
            } else {
                ErrorCode::Unknown
            }
        });

    let message = error_obj
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| parsed.as_ref()?.get("message")?.as_str())
        .or_else(|| error_obj?.as_str())
        .unwrap_or(DEFAULT_ERROR_MESSAGE)
        .to_string();

    let details = match parsed {
        Some(json) => json,
        None => serde_json::json!({ "raw": body_text }),
    };
    LlmError::api_error_with_details(status, code, message, details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(status: u16, body: &str) -> (ErrorCode, String) {
        let info = classify_http_error(status, body).error_info();
        (info.code, info.message)
    }

    #[test]
    fn modes() {
        assert_eq!(consumption_mode(500, true), ConsumptionMode::Error);
        assert_eq!(consumption_mode(404, false), ConsumptionMode::Error);
        assert_eq!(consumption_mode(200, true), ConsumptionMode::Incremental);
        assert_eq!(consumption_mode(201, false), ConsumptionMode::SingleShot);
    }

    #[test]
    fn unauthorized_without_code_is_invalid_api_key() {
        let (code, message) = info(401, r#"{"error":{"message":"bad key"}}"#);
        assert_eq!(code, ErrorCode::InvalidApiKey);
        assert_eq!(message, "bad key");
    }

    #[test]
    fn explicit_code_wins_over_status() {
        let (code, _) = info(401, r#"{"error":{"message":"x","code":"token_expired"}}"#);
        assert_eq!(code, ErrorCode::Other("token_expired".into()));
    }

    #[test]
    fn type_is_used_when_code_is_null() {
        let (code, _) = info(
            400,
            r#"{"error":{"message":"x","type":"invalid_request_error","code":null}}"#,
        );
        assert_eq!(code, ErrorCode::InvalidRequestError);
    }

    #[test]
    fn top_level_message() {
        let (code, message) = info(500, r#"{"message":"model crashed"}"#);
        assert_eq!(code, ErrorCode::Unknown);
        assert_eq!(message, "model crashed");
    }

    #[test]
    fn string_error_field() {
        let (_, message) = info(503, r#"{"error":"Loading model"}"#);
        assert_eq!(message, "Loading model");
    }

    #[test]
    fn non_json_body_uses_default_message() {
        let err = classify_http_error(502, "<html>bad gateway</html>");
        assert_eq!(err.error_info().message, DEFAULT_ERROR_MESSAGE);
        match err {
            LlmError::ApiError {
                status, details, ..
            } => {
                assert_eq!(status, 502);
                assert_eq!(details.unwrap()["raw"], "<html>bad gateway</html>");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn unauthorized_non_json_body() {
        let (code, message) = info(401, "");
        assert_eq!(code, ErrorCode::InvalidApiKey);
        assert_eq!(message, DEFAULT_ERROR_MESSAGE);
    }
}
