//! Type Conversions for LlmError
//!
//! This module contains From trait implementations for converting
//! common error types into LlmError.

use super::types::LlmError;

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::TimeoutError(format!("Request timed out: {err}"));
        }
        if err.is_connect() {
            return Self::ConnectionError(format!("Connection error: {err}"));
        }
        Self::HttpError(format!("Failed to send request: {err}"))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LlmError = json_err.into();
        assert!(matches!(llm_err, LlmError::JsonError(_)));
    }

    #[tokio::test]
    async fn test_from_reqwest_connect_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = reqwest::get(format!("http://127.0.0.1:{port}/"))
            .await
            .unwrap_err();
        let llm_err: LlmError = err.into();
        match llm_err {
            LlmError::ConnectionError(msg) => assert!(msg.starts_with("Connection error: ")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_from_reqwest_builder_error() {
        let err = reqwest::Client::new()
            .post("not a url")
            .send()
            .await
            .unwrap_err();
        let llm_err: LlmError = err.into();
        assert!(matches!(llm_err, LlmError::HttpError(_)));
    }
}
