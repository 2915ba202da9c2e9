//! # inference-stream
//!
//! Streaming response pipeline for chat-completion style model servers.
#![deny(unsafe_code)]

//! One request flows through five stages:
//!
//! - **Transport**: a POST through an injectable [`execution::HttpTransport`]
//!   (reqwest by default), cancellable at any point.
//! - **Classification**: non-2xx replies become structured errors; 2xx replies
//!   are read either as one JSON document or as an incremental event stream.
//! - **Line decoding**: transport frames are reassembled into complete lines.
//! - **Normalization**: each line or document becomes a text delta, or an
//!   error when the backend embeds one in an otherwise successful body.
//! - **Emission**: deltas accumulate into a growing reply, delivered as
//!   [`StreamEvent::Text`] items followed by exactly one
//!   [`StreamEvent::Finished`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use inference_stream::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LlmError> {
//!     let client = InferenceClient::builder().build()?;
//!     let request = InferenceRequest::new(
//!         "http://localhost:8000/v1/chat/completions",
//!         serde_json::json!({"messages": [{"role": "user", "content": "Hello"}]}),
//!         ModelRef::new("llama-3").with_parameters(ModelRuntimeParams::streaming()),
//!     )
//!     .with_header("Authorization", "Bearer sk-...");
//!
//!     let InferenceStreamHandle { mut stream, .. } = client.invoke(request);
//!     while let Some(event) = stream.next().await {
//!         match event {
//!             StreamEvent::Text(text) => println!("{text}"),
//!             StreamEvent::Finished(outcome) => println!("done: {outcome:?}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod streaming;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use client::{InferenceClient, InferenceClientBuilder};
pub use error::{ErrorCode, ErrorInfo, LlmError};
pub use streaming::{InferenceStream, InferenceStreamHandle, StreamEvent, StreamOutcome};
pub use types::{InferenceRequest, ModelRef, ModelRuntimeParams};

/// Commonly used types
pub mod prelude {
    pub use crate::client::{InferenceClient, InferenceClientBuilder};
    pub use crate::error::{ErrorCode, ErrorInfo, LlmError};
    pub use crate::execution::{HttpInterceptor, HttpRequestContext, HttpTransport, LoggingInterceptor};
    pub use crate::streaming::{
        InferenceStream, InferenceStreamHandle, ResponseNormalizer, StreamEvent, StreamOutcome,
        TextStream,
    };
    pub use crate::types::{
        BeforeSendHook, HttpConfig, InferenceRequest, ModelRef, ModelRuntimeParams, StreamLimits,
    };
    pub use crate::utils::CancelHandle;
}

static_assertions::assert_impl_all!(InferenceStream: Send);
static_assertions::assert_impl_all!(InferenceStreamHandle: Send);
static_assertions::assert_impl_all!(InferenceClient: Send, Sync, Clone);
static_assertions::assert_impl_all!(InferenceRequest: Send, Sync, Clone);
