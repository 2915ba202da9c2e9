//! HTTP transport abstraction.
//!
//! The pipeline talks to the network through [`HttpTransport`]. The default
//! implementation is backed by `reqwest`; embedders and tests can inject
//! their own to serve synthetic responses with exact frame boundaries.

use crate::error::LlmError;
use crate::execution::interceptor::HttpRequestContext;
use crate::types::HttpConfig;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use futures_util::StreamExt;
use reqwest::header::HeaderMap;
use std::pin::Pin;
use std::time::Duration;

/// Response body as delivered by the transport, frame by frame.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

/// Transport-level request data for a JSON POST.
#[derive(Debug, Clone)]
pub struct HttpTransportRequest {
    pub ctx: HttpRequestContext,
    pub url: String,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Transport-level response data.
pub struct HttpTransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl HttpTransportResponse {
    /// Read the remaining body into memory, failing once it grows past `max_bytes`.
    pub async fn read_to_end(self, max_bytes: usize) -> Result<Vec<u8>, LlmError> {
        let mut body = self.body;
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if out.len() + chunk.len() > max_bytes {
                return Err(LlmError::StreamError(format!(
                    "response body exceeds {max_bytes} bytes"
                )));
            }
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for HttpTransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Custom HTTP transport.
///
/// One call performs one network request; there are no retries at this layer.
/// Dropping the returned body must release the connection.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpTransportRequest)
    -> Result<HttpTransportResponse, LlmError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    // Applied to single-shot requests only; a stream may legitimately run longer.
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    /// Build a client from `HttpConfig`.
    pub fn from_config(config: &HttpConfig) -> Result<Self, LlmError> {
        let mut builder = reqwest::Client::builder();
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| LlmError::ConfigurationError(format!("Invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::new(client, config.timeout))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpTransportRequest,
    ) -> Result<HttpTransportResponse, LlmError> {
        let body = serde_json::to_vec(&request.body)?;
        let mut rb = self
            .client
            .post(&request.url)
            .headers(request.headers)
            .body(body);
        if !request.ctx.stream
            && let Some(timeout) = self.timeout
        {
            rb = rb.timeout(timeout);
        }

        let response = rb.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    LlmError::TimeoutError(format!("Stream read timed out: {e}"))
                } else {
                    LlmError::StreamError(format!("Stream error: {e}"))
                }
            })
        });

        Ok(HttpTransportResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}
