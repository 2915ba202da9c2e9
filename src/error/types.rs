//! Core error types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Machine-readable error code surfaced to callers.
///
/// Known codes map to dedicated variants; anything else a backend reports is
/// passed through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    /// The backend rejected the credentials.
    InvalidApiKey,
    /// Generic authentication failure reported by the backend.
    AuthenticationError,
    /// Account quota or credits exhausted.
    InsufficientQuota,
    /// The request was malformed or referenced an unknown model.
    InvalidRequestError,
    /// No code could be determined.
    #[default]
    Unknown,
    /// Backend-specific code, kept as received.
    Other(String),
}

impl ErrorCode {
    /// Wire form of the code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidApiKey => "invalid_api_key",
            Self::AuthenticationError => "authentication_error",
            Self::InsufficientQuota => "insufficient_quota",
            Self::InvalidRequestError => "invalid_request_error",
            Self::Unknown => "unknown",
            Self::Other(code) => code,
        }
    }

    /// Map a backend-reported code to a known variant when possible.
    pub fn from_code(code: &str) -> Self {
        match code {
            "invalid_api_key" => Self::InvalidApiKey,
            "authentication_error" => Self::AuthenticationError,
            "insufficient_quota" => Self::InsufficientQuota,
            "invalid_request_error" => Self::InvalidRequestError,
            "unknown" | "" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    /// Read a code out of a JSON value. Numeric codes are stringified.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self::from_code(s)),
            serde_json::Value::Number(n) => Some(Self::from_code(&n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_code(&s))
    }
}

/// The `{message, code}` pair every failure is reduced to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub code: ErrorCode,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Main error type of the pipeline.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// Generic HTTP failure while sending or reading.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The connection could not be established.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request or a read timed out.
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// Non-2xx response from the backend.
    #[error("API error {status} [{code}]: {message}")]
    ApiError {
        status: u16,
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Error payload embedded in an otherwise successful body or stream.
    #[error("Backend error [{code}]: {message}")]
    BackendError {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// The byte stream broke or violated a buffering limit.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// A payload could not be interpreted.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Invalid client or request configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Invalid caller input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request was cancelled by the caller.
    #[error("Request cancelled")]
    Cancelled,

    /// Invariant violation inside the library.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    /// Build an `ApiError` without structured details.
    pub fn api_error(status: u16, code: ErrorCode, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Build an `ApiError` carrying the raw backend payload.
    pub fn api_error_with_details(
        status: u16,
        code: ErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::ApiError {
            status,
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// HTTP status if this error came from a non-2xx response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error code surfaced to the caller.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ApiError { code, .. } | Self::BackendError { code, .. } => code.clone(),
            _ => ErrorCode::Unknown,
        }
    }

    /// Reduce this error to the caller-facing `{message, code}` contract.
    pub fn error_info(&self) -> ErrorInfo {
        match self {
            Self::ApiError { code, message, .. } | Self::BackendError { code, message, .. } => {
                ErrorInfo::new(message.clone(), code.clone())
            }
            other => ErrorInfo::new(other.to_string(), ErrorCode::Unknown),
        }
    }

    /// Whether the caller may reasonably retry. The pipeline itself never does.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::TimeoutError(_) => true,
            Self::ApiError { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
