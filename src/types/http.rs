//! HTTP and stream configuration types.
//!
//! `HttpConfig` controls how the reqwest-backed transport is built and which
//! default headers every request carries; `StreamLimits` bounds the memory the
//! streaming read loop may hold for one request.

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout for single-shot JSON requests and for reading error
    /// bodies. A successful stream is not bounded by it.
    #[serde(with = "duration_option_serde")]
    pub timeout: Option<Duration>,
    /// Connection timeout
    #[serde(with = "duration_option_serde")]
    pub connect_timeout: Option<Duration>,
    /// Headers added to every request, below per-request headers.
    pub headers: HashMap<String, String>,
    /// Proxy URL
    pub proxy: Option<String>,
    /// User agent
    pub user_agent: Option<String>,
    /// Whether to disable compression for streaming requests.
    ///
    /// When `true`, streaming requests set `Accept-Encoding: identity` to keep
    /// intermediaries from buffering the event stream.
    pub stream_disable_compression: bool,
}

/// Builder for `HttpConfig`
#[derive(Debug, Clone, Default)]
pub struct HttpConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    headers: HashMap<String, String>,
    proxy: Option<String>,
    user_agent: Option<String>,
    stream_disable_compression: Option<bool>,
}

impl HttpConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
    pub fn connect_timeout(mut self, connect_timeout: Option<Duration>) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
    pub fn user_agent<S: Into<String>>(mut self, user_agent: Option<S>) -> Self {
        self.user_agent = user_agent.map(|s| s.into());
        self
    }
    pub fn proxy<S: Into<String>>(mut self, proxy: Option<S>) -> Self {
        self.proxy = proxy.map(|s| s.into());
        self
    }
    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }
    pub fn stream_disable_compression(mut self, val: bool) -> Self {
        self.stream_disable_compression = Some(val);
        self
    }

    /// Build the configuration. Unset timeouts and user agent fall back to the defaults.
    pub fn build(self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            timeout: self.timeout.or(defaults.timeout),
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            headers: self.headers,
            proxy: self.proxy,
            user_agent: self.user_agent.or(defaults.user_agent),
            stream_disable_compression: self
                .stream_disable_compression
                .unwrap_or(defaults.stream_disable_compression),
        }
    }
}

impl HttpConfig {
    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::new()
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        let sdc = match std::env::var("INFERENCE_STREAM_DISABLE_COMPRESSION") {
            Ok(val) => {
                let v = val.trim().to_lowercase();
                !(v == "false" || v == "0" || v == "off" || v == "no")
            }
            Err(_) => true,
        };
        Self {
            timeout: Some(defaults::http::REQUEST_TIMEOUT),
            connect_timeout: Some(defaults::http::CONNECT_TIMEOUT),
            headers: HashMap::new(),
            proxy: None,
            user_agent: Some(defaults::http::USER_AGENT.to_string()),
            stream_disable_compression: sdc,
        }
    }
}

/// Memory bounds of the streaming read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLimits {
    /// A line longer than this without a terminator fails the stream.
    pub max_line_bytes: usize,
    /// A partial JSON payload larger than this is dropped.
    pub max_pending_json_bytes: usize,
    /// An error or single-shot body larger than this fails the request.
    pub max_body_bytes: usize,
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: defaults::limits::MAX_LINE_BYTES,
            max_pending_json_bytes: defaults::limits::MAX_PENDING_JSON_BYTES,
            max_body_bytes: defaults::limits::MAX_BODY_BYTES,
        }
    }
}

mod duration_option_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
