//! HTTP Interceptor interfaces
//!
//! Interceptors observe (and may veto) each stage of a request: before send,
//! after the response head arrives, on errors, and for every decoded stream
//! line. Hooks are best-effort and should avoid expensive work.

use crate::error::LlmError;
use reqwest::header::HeaderMap;

/// Context passed to interceptors describing the request.
#[derive(Clone, Debug)]
pub struct HttpRequestContext {
    pub request_id: String,
    pub model_id: String,
    pub url: String,
    pub stream: bool,
}

/// Generate a unique id for one invocation.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// HTTP interceptor trait
pub trait HttpInterceptor: Send + Sync {
    /// Called before sending. Interceptors may add or replace headers, or
    /// return an error to short-circuit the request.
    fn on_before_send(
        &self,
        _ctx: &HttpRequestContext,
        _body: &serde_json::Value,
        _headers: &mut HeaderMap,
    ) -> Result<(), LlmError> {
        Ok(())
    }

    /// Called once the response head is received, before classification.
    fn on_response(
        &self,
        _ctx: &HttpRequestContext,
        _status: u16,
        _headers: &HeaderMap,
    ) -> Result<(), LlmError> {
        Ok(())
    }

    /// Called when the request fails, whatever the cause.
    fn on_error(&self, _ctx: &HttpRequestContext, _error: &LlmError) {}

    /// Called for every decoded line of a streaming body.
    fn on_line(&self, _ctx: &HttpRequestContext, _line: &str) -> Result<(), LlmError> {
        Ok(())
    }
}

/// A simple logging interceptor backed by `tracing` (no bodies or header values).
#[derive(Clone, Default)]
pub struct LoggingInterceptor;

impl HttpInterceptor for LoggingInterceptor {
    fn on_before_send(
        &self,
        ctx: &HttpRequestContext,
        _body: &serde_json::Value,
        headers: &mut HeaderMap,
    ) -> Result<(), LlmError> {
        tracing::debug!(target: "inference_stream::http", request_id=%ctx.request_id, model=%ctx.model_id, url=%ctx.url, stream=%ctx.stream, header_count=headers.len(), "sending request");
        Ok(())
    }

    fn on_response(
        &self,
        ctx: &HttpRequestContext,
        status: u16,
        _headers: &HeaderMap,
    ) -> Result<(), LlmError> {
        tracing::debug!(target: "inference_stream::http", request_id=%ctx.request_id, url=%ctx.url, status=%status, "response received");
        Ok(())
    }

    fn on_error(&self, ctx: &HttpRequestContext, error: &LlmError) {
        tracing::debug!(target: "inference_stream::http", request_id=%ctx.request_id, url=%ctx.url, stream=%ctx.stream, err=%error, "request error");
    }

    fn on_line(&self, ctx: &HttpRequestContext, line: &str) -> Result<(), LlmError> {
        tracing::trace!(target: "inference_stream::http", request_id=%ctx.request_id, len=line.len(), "stream line");
        Ok(())
    }
}
