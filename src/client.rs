//! Inference client
//!
//! Entry point of the pipeline. A client owns the transport, the HTTP
//! configuration, the stream limits and the interceptors; each `invoke` turns
//! one [`InferenceRequest`] into a lazy [`crate::streaming::InferenceStream`].
//!
//! ```rust,ignore
//! use inference_stream::prelude::*;
//!
//! let client = InferenceClient::builder().http_debug(true).build()?;
//! let request = InferenceRequest::new(url, body, ModelRef::new("gpt-4o-mini"));
//! let text = client.invoke(request).stream.collect_text().await?;
//! ```

use crate::error::LlmError;
use crate::execution::executor::RequestExecutor;
use crate::execution::interceptor::{HttpInterceptor, LoggingInterceptor};
use crate::execution::transport::{HttpTransport, ReqwestTransport};
use crate::streaming::InferenceStreamHandle;
use crate::types::{HttpConfig, InferenceRequest, StreamLimits};
use std::sync::Arc;

/// Client for streaming inference requests. Cheap to clone.
#[derive(Clone)]
pub struct InferenceClient {
    executor: Arc<RequestExecutor>,
}

impl InferenceClient {
    pub fn builder() -> InferenceClientBuilder {
        InferenceClientBuilder::default()
    }

    /// Client with the default reqwest transport and configuration.
    pub fn new() -> Result<Self, LlmError> {
        Self::builder().build()
    }

    /// Start one request.
    ///
    /// Nothing is sent until the returned stream is first polled. The handle's
    /// `cancel` is the request's own cancel handle when it carries one.
    pub fn invoke(&self, mut request: InferenceRequest) -> InferenceStreamHandle {
        let cancel = request.cancel.take().unwrap_or_default();
        let stream = self.executor.clone().execute(request, cancel.clone());
        InferenceStreamHandle { stream, cancel }
    }

    pub fn http_config(&self) -> &HttpConfig {
        &self.executor.http_config
    }

    pub fn stream_limits(&self) -> &StreamLimits {
        &self.executor.limits
    }
}

impl std::fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceClient")
            .field("http_config", &self.executor.http_config)
            .field("limits", &self.executor.limits)
            .field("interceptors", &self.executor.interceptors.len())
            .finish()
    }
}

/// Builder for [`InferenceClient`].
#[derive(Default)]
pub struct InferenceClientBuilder {
    http_config: Option<HttpConfig>,
    limits: Option<StreamLimits>,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
    http_debug: bool,
    http_client: Option<reqwest::Client>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl InferenceClientBuilder {
    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = Some(config);
        self
    }

    pub fn stream_limits(mut self, limits: StreamLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Add an interceptor. Interceptors run in registration order.
    pub fn interceptor(mut self, interceptor: Arc<dyn HttpInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Register a [`LoggingInterceptor`] ahead of custom interceptors.
    pub fn http_debug(mut self, enabled: bool) -> Self {
        self.http_debug = enabled;
        self
    }

    /// Use a preconfigured reqwest client. `HttpConfig` timeouts for
    /// single-shot requests still apply; proxy and connect timeout do not.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Replace the network layer entirely (mocks, custom stacks).
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<InferenceClient, LlmError> {
        let http_config = self.http_config.unwrap_or_default();
        let limits = self.limits.unwrap_or_default();
        if limits.max_line_bytes == 0
            || limits.max_pending_json_bytes == 0
            || limits.max_body_bytes == 0
        {
            return Err(LlmError::ConfigurationError(
                "stream limits must be greater than zero".to_string(),
            ));
        }

        let transport: Arc<dyn HttpTransport> = match (self.transport, self.http_client) {
            (Some(transport), _) => transport,
            (None, Some(client)) => Arc::new(ReqwestTransport::new(client, http_config.timeout)),
            (None, None) => Arc::new(ReqwestTransport::from_config(&http_config)?),
        };

        let mut interceptors: Vec<Arc<dyn HttpInterceptor>> = Vec::new();
        if self.http_debug {
            interceptors.push(Arc::new(LoggingInterceptor));
        }
        interceptors.extend(self.interceptors);

        Ok(InferenceClient {
            executor: Arc::new(RequestExecutor {
                transport,
                http_config,
                limits,
                interceptors,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::cancel::CancelHandle;

    #[test]
    fn default_client_builds() {
        let client = InferenceClient::new().unwrap();
        assert_eq!(client.stream_limits().max_line_bytes, StreamLimits::default().max_line_bytes);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = InferenceClient::builder()
            .stream_limits(StreamLimits {
                max_line_bytes: 0,
                ..StreamLimits::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));

        let err = InferenceClient::builder()
            .stream_limits(StreamLimits {
                max_body_bytes: 0,
                ..StreamLimits::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }

    #[test]
    fn invalid_proxy_fails_build() {
        let config = HttpConfig::builder().proxy(Some("not a url")).build();
        let err = InferenceClient::builder().http_config(config).build().unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }

    #[test]
    fn invoke_reuses_request_cancel_handle() {
        let client = InferenceClient::new().unwrap();
        let cancel = CancelHandle::new();
        let request = InferenceRequest::new(
            "http://127.0.0.1:9/v1/chat/completions",
            serde_json::json!({}),
            crate::types::ModelRef::new("m"),
        )
        .with_cancel(cancel.clone());
        let handle = client.invoke(request);
        cancel.cancel();
        assert!(handle.cancel.is_cancelled());
    }
}
