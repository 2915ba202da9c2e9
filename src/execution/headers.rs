//! HTTP Headers Utility
//!
//! Builds the header set of an inference request. Precedence, lowest first:
//! pipeline defaults, client-wide configured headers, per-request headers.

use crate::defaults::http::{ACCEPT_EVENT_STREAM, ACCEPT_JSON};
use crate::error::LlmError;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
    USER_AGENT,
};
use std::collections::HashMap;

/// HTTP header builder for inference requests
pub struct HttpHeaderBuilder {
    headers: HeaderMap,
}

impl HttpHeaderBuilder {
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    /// Add JSON content type
    pub fn with_json_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    /// `Accept: text/event-stream` when an event stream is wanted, JSON otherwise.
    pub fn with_accept(mut self, event_stream: bool) -> Self {
        let accept = if event_stream {
            ACCEPT_EVENT_STREAM
        } else {
            ACCEPT_JSON
        };
        self.headers.insert(ACCEPT, HeaderValue::from_static(accept));
        self
    }

    /// Ask intermediaries not to compress or cache a streaming body.
    pub fn with_stream_hints(mut self, disable_compression: bool) -> Self {
        self.headers
            .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        if disable_compression {
            self.headers
                .insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        }
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self, LlmError> {
        self.headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| LlmError::ConfigurationError(format!("Invalid user agent: {e}")))?,
        );
        Ok(self)
    }

    /// Add custom headers; they replace earlier values of the same name.
    pub fn with_custom_headers(
        mut self,
        custom_headers: &HashMap<String, String>,
    ) -> Result<Self, LlmError> {
        for (key, value) in custom_headers {
            let (name, value) = parse_header(key, value)?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

impl Default for HttpHeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_header(key: &str, value: &str) -> Result<(HeaderName, HeaderValue), LlmError> {
    let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
        LlmError::ConfigurationError(format!("Invalid header name '{key}': {e}"))
    })?;
    let value = HeaderValue::from_str(value).map_err(|e| {
        LlmError::ConfigurationError(format!("Invalid header value for '{key}': {e}"))
    })?;
    Ok((name, value))
}

/// Merge extra headers into base headers. Extra headers win on name clashes.
pub fn merge_headers(
    mut base: HeaderMap,
    extra: &HashMap<String, String>,
) -> Result<HeaderMap, LlmError> {
    for (key, value) in extra {
        let (name, value) = parse_header(key, value)?;
        base.insert(name, value);
    }
    Ok(base)
}
