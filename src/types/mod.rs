//! Request and configuration types.

pub mod http;
pub mod request;

pub use http::{HttpConfig, HttpConfigBuilder, StreamLimits};
pub use request::{BeforeSendHook, InferenceRequest, ModelRef, ModelRuntimeParams, effective_stream};
