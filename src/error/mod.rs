//! Error Handling Module
//!
//! Every failure of the pipeline ends up as one `LlmError`, which callers can
//! reduce to the `{message, code}` contract through [`LlmError::error_info`].
//!
//! # Example
//!
//! ```rust,ignore
//! use inference_stream::error::{ErrorCode, LlmError};
//!
//! let error = LlmError::api_error(401, ErrorCode::InvalidApiKey, "bad key");
//! assert_eq!(error.error_info().code, ErrorCode::InvalidApiKey);
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod helpers;
pub mod types;

pub use types::*;
