//! Inference request types.
//!
//! An [`InferenceRequest`] is built by the caller, handed to
//! [`InferenceClient::invoke`](crate::client::InferenceClient::invoke) by value
//! and discarded after the terminal outcome.

use crate::error::LlmError;
use crate::streaming::ResponseNormalizer;
use crate::utils::cancel::CancelHandle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Hook to reshape the JSON request body before it is sent.
///
/// The pipeline reads the `stream` flag from the shaped body, so a hook that
/// sets `"stream": false` switches the request to single-shot mode.
pub type BeforeSendHook =
    Arc<dyn Fn(&serde_json::Value) -> Result<serde_json::Value, LlmError> + Send + Sync>;

/// Runtime parameters of a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRuntimeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

impl ModelRuntimeParams {
    pub fn streaming() -> Self {
        Self {
            stream: Some(true),
            ..Default::default()
        }
    }

    pub fn non_streaming() -> Self {
        Self {
            stream: Some(false),
            ..Default::default()
        }
    }
}

/// Model identifier plus its runtime parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ModelRuntimeParams>,
}

impl ModelRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: ModelRuntimeParams) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Explicit `stream` setting of the runtime parameters, if any.
    pub fn stream_param(&self) -> Option<bool> {
        self.parameters.as_ref().and_then(|p| p.stream)
    }
}

/// One generation request.
#[derive(Clone)]
pub struct InferenceRequest {
    /// Absolute endpoint URL.
    pub url: String,
    /// JSON request body.
    pub body: serde_json::Value,
    pub model: ModelRef,
    /// Extra headers. They override the pipeline's defaults.
    pub headers: HashMap<String, String>,
    /// Cancellation handle bound to the network call.
    pub cancel: Option<CancelHandle>,
    /// Caller-supplied normalizer replacing the default payload parsing.
    pub normalizer: Option<Arc<dyn ResponseNormalizer>>,
    pub before_send: Option<BeforeSendHook>,
}

impl InferenceRequest {
    pub fn new(url: impl Into<String>, body: serde_json::Value, model: ModelRef) -> Self {
        Self {
            url: url.into(),
            body,
            model,
            headers: HashMap::new(),
            cancel: None,
            normalizer: None,
            before_send: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn ResponseNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    pub fn with_before_send(mut self, hook: BeforeSendHook) -> Self {
        self.before_send = Some(hook);
        self
    }

    /// Whether the caller asked for an event stream (drives the `Accept` header).
    pub fn wants_event_stream(&self) -> bool {
        self.model.stream_param() == Some(true)
    }
}

/// Whether the response should be consumed as a stream.
///
/// Streaming is the default; an explicit `false` in either the (possibly
/// reshaped) body or the model parameters disables it.
pub fn effective_stream(body: &serde_json::Value, model: &ModelRef) -> bool {
    let body_disables = body.get("stream").and_then(|v| v.as_bool()) == Some(false);
    !(body_disables || model.stream_param() == Some(false))
}

impl fmt::Debug for InferenceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceRequest")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("cancel", &self.cancel.is_some())
            .field("normalizer", &self.normalizer.is_some())
            .field("before_send", &self.before_send.is_some())
            .finish_non_exhaustive()
    }
}
