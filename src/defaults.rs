//! Default Configuration Values
//!
//! This module centralizes the default values used throughout the pipeline.
//! Having defaults in one place makes them easier to maintain, document, and adjust.

use std::time::Duration;

/// HTTP client default configurations
pub mod http {
    use super::*;

    /// Default request timeout for non-streaming requests
    ///
    /// Set to 60 seconds to accommodate large language models that may take
    /// 10-20 seconds to respond, plus network latency and proxy delays.
    /// Streaming reads are not bounded by this value.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Default connection timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("inference-stream/", env!("CARGO_PKG_VERSION"));

    /// `Accept` value sent when streaming is requested
    pub const ACCEPT_EVENT_STREAM: &str = "text/event-stream";

    /// `Accept` value sent for single-shot JSON replies
    pub const ACCEPT_JSON: &str = "application/json";
}

/// Buffering limits for the streaming read loop
pub mod limits {
    /// Longest line (in bytes) the line decoder will hold before a terminator arrives.
    pub const MAX_LINE_BYTES: usize = 1024 * 1024;

    /// Largest partial JSON payload the normalizer will keep concatenating.
    pub const MAX_PENDING_JSON_BYTES: usize = 4 * 1024 * 1024;

    /// Largest error or single-shot body read into memory.
    pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
}

/// Wire-level markers of the event-stream payloads
pub mod protocol {
    /// Event-stream field label carrying the JSON payload.
    pub const DATA_FIELD: &str = "data:";

    /// Payload that marks the end of the stream. Never parsed as JSON.
    pub const DONE_SENTINEL: &str = "[DONE]";

    /// Role label some legacy servers prepend to the first delta.
    pub const LEGACY_ROLE_PREFIX: &str = "assistant: ";

    /// Message used when a backend error carries no human-readable text.
    pub const DEFAULT_ERROR_MESSAGE: &str = "Error occurred.";
}
