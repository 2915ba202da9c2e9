//! Request execution
//!
//! Drives one inference request through the whole pipeline: request shaping,
//! the transport call, response classification, line decoding, payload
//! normalization and emission. Everything runs inside a lazy generator, so
//! nothing is sent before the returned stream is first polled and the next
//! chunk is read only when the consumer asks for the next event.

use crate::defaults;
use crate::error::LlmError;
use crate::execution::classify::{ConsumptionMode, classify_http_error, consumption_mode};
use crate::execution::headers::{HttpHeaderBuilder, merge_headers};
use crate::execution::interceptor::{HttpInterceptor, HttpRequestContext, generate_request_id};
use crate::execution::transport::{HttpTransport, HttpTransportRequest, HttpTransportResponse};
use crate::streaming::{
    InferenceStream, LineDecoder, LineNormalizer, Normalized, StreamEvent, StreamOutcome,
    TextAccumulator, normalize_document,
};
use crate::types::{HttpConfig, InferenceRequest, StreamLimits, effective_stream};
use crate::utils::cancel::CancelHandle;
use futures_util::StreamExt;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::sync::Arc;

/// Shared, immutable state every request of one client runs against.
pub struct RequestExecutor {
    pub transport: Arc<dyn HttpTransport>,
    pub http_config: HttpConfig,
    pub limits: StreamLimits,
    pub interceptors: Vec<Arc<dyn HttpInterceptor>>,
}

impl RequestExecutor {
    /// Build the lazy event stream for one request.
    pub fn execute(self: Arc<Self>, request: InferenceRequest, cancel: CancelHandle) -> InferenceStream {
        let events = async_stream::stream! {
            let mut ctx = HttpRequestContext {
                request_id: generate_request_id(),
                model_id: request.model.id.clone(),
                url: request.url.clone(),
                stream: true,
            };

            if cancel.is_cancelled() {
                yield self.cancelled(&ctx);
                return;
            }

            let body = match apply_before_send(&request) {
                Ok(body) => body,
                Err(e) => {
                    yield self.fail(&ctx, e);
                    return;
                }
            };
            ctx.stream = effective_stream(&body, &request.model);

            let transport_request = match self.prepare(&request, &ctx, body) {
                Ok(r) => r,
                Err(e) => {
                    yield self.fail(&ctx, e);
                    return;
                }
            };

            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                r = self.transport.execute(transport_request) => Some(r),
            };
            let response = match sent {
                None => {
                    yield self.cancelled(&ctx);
                    return;
                }
                Some(Err(e)) => {
                    yield self.fail(&ctx, e);
                    return;
                }
                Some(Ok(response)) => response,
            };

            if let Err(e) = self.notify_response(&ctx, &response) {
                yield self.fail(&ctx, e);
                return;
            }

            let mode = consumption_mode(response.status, ctx.stream);
            tracing::debug!(
                target: "inference_stream::stream",
                request_id = %ctx.request_id,
                status = response.status,
                mode = ?mode,
                "response classified"
            );

            match mode {
                ConsumptionMode::Error => {
                    let status = response.status;
                    let bytes = match self.read_body(response, &cancel).await {
                        None => {
                            yield self.cancelled(&ctx);
                            return;
                        }
                        Some(Err(e)) => {
                            yield self.fail(&ctx, e);
                            return;
                        }
                        Some(Ok(bytes)) => bytes,
                    };
                    let body_text = String::from_utf8_lossy(&bytes);
                    yield self.fail(&ctx, classify_http_error(status, &body_text));
                }

                ConsumptionMode::SingleShot => {
                    let bytes = match self.read_body(response, &cancel).await {
                        None => {
                            yield self.cancelled(&ctx);
                            return;
                        }
                        Some(Err(e)) => {
                            yield self.fail(&ctx, e);
                            return;
                        }
                        Some(Ok(bytes)) => bytes,
                    };
                    let doc: Value = match serde_json::from_slice(&bytes) {
                        Ok(doc) => doc,
                        Err(e) => {
                            yield self.fail(&ctx, LlmError::ParseError(format!("invalid JSON reply: {e}")));
                            return;
                        }
                    };
                    let text = match normalize_document(&doc, request.normalizer.as_deref()) {
                        Ok(text) => text,
                        Err(e) => {
                            yield self.fail(&ctx, e);
                            return;
                        }
                    };
                    if cancel.is_cancelled() {
                        yield self.cancelled(&ctx);
                        return;
                    }
                    yield StreamEvent::Text(text);
                    yield self.completed(&ctx);
                }

                ConsumptionMode::Incremental => {
                    let mut decoder = LineDecoder::new(self.limits.max_line_bytes);
                    let mut normalizer = LineNormalizer::new(
                        request.normalizer.clone(),
                        self.limits.max_pending_json_bytes,
                    );
                    // A caller-supplied normalizer owns the text it returns.
                    let mut text = if request.normalizer.is_some() {
                        TextAccumulator::verbatim()
                    } else {
                        TextAccumulator::new()
                    };
                    let mut body = response.body;

                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            chunk = body.next() => Some(chunk),
                        };
                        let chunk = match next {
                            None => {
                                yield self.cancelled(&ctx);
                                return;
                            }
                            Some(None) => break,
                            Some(Some(Err(e))) => {
                                yield self.fail(&ctx, e);
                                return;
                            }
                            Some(Some(Ok(chunk))) => chunk,
                        };

                        let lines = match decoder.push(&chunk) {
                            Ok(lines) => lines,
                            Err(e) => {
                                yield self.fail(&ctx, e);
                                return;
                            }
                        };

                        for line in lines {
                            if let Err(e) = self.notify_line(&ctx, &line) {
                                yield self.fail(&ctx, e);
                                return;
                            }
                            match normalizer.normalize(&line) {
                                Normalized::Skip => {}
                                Normalized::Failed(e) => {
                                    yield self.fail(&ctx, e);
                                    return;
                                }
                                Normalized::Delta(delta) => {
                                    let Some(current) = text.push(&delta).map(str::to_owned) else {
                                        continue;
                                    };
                                    if cancel.is_cancelled() {
                                        yield self.cancelled(&ctx);
                                        return;
                                    }
                                    yield StreamEvent::Text(current);
                                }
                            }
                        }
                    }

                    let dropped_line = decoder.finish();
                    let dropped_json = normalizer.finish();
                    if dropped_line > 0 || dropped_json > 0 {
                        tracing::debug!(
                            target: "inference_stream::stream",
                            request_id = %ctx.request_id,
                            dropped_line_bytes = dropped_line,
                            dropped_json_bytes = dropped_json,
                            "discarding incomplete tail at end of stream"
                        );
                    }
                    yield self.completed(&ctx);
                }
            }
        };

        InferenceStream::new(Box::pin(events))
    }

    /// Read a whole body, bounded by the client timeout and the body byte cap.
    /// `None` means the request was cancelled first.
    async fn read_body(
        &self,
        response: HttpTransportResponse,
        cancel: &CancelHandle,
    ) -> Option<Result<Vec<u8>, LlmError>> {
        let max_bytes = self.limits.max_body_bytes;
        let read = async {
            match self.http_config.timeout {
                Some(limit) => tokio::time::timeout(limit, response.read_to_end(max_bytes))
                    .await
                    .unwrap_or_else(|_| {
                        Err(LlmError::TimeoutError(format!(
                            "response body not received within {limit:?}"
                        )))
                    }),
                None => response.read_to_end(max_bytes).await,
            }
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            bytes = read => Some(bytes),
        }
    }

    fn prepare(
        &self,
        request: &InferenceRequest,
        ctx: &HttpRequestContext,
        body: Value,
    ) -> Result<HttpTransportRequest, LlmError> {
        let mut headers = self.build_headers(request, ctx.stream)?;
        for interceptor in &self.interceptors {
            interceptor.on_before_send(ctx, &body, &mut headers)?;
        }
        Ok(HttpTransportRequest {
            ctx: ctx.clone(),
            url: request.url.clone(),
            headers,
            body,
        })
    }

    /// Pipeline defaults, then client-wide headers, then per-request headers.
    fn build_headers(&self, request: &InferenceRequest, stream: bool) -> Result<HeaderMap, LlmError> {
        let mut builder = HttpHeaderBuilder::new()
            .with_json_content_type()
            .with_accept(request.wants_event_stream());
        if stream {
            builder = builder.with_stream_hints(self.http_config.stream_disable_compression);
        }
        let user_agent = self
            .http_config
            .user_agent
            .as_deref()
            .unwrap_or(defaults::http::USER_AGENT);
        let base = builder
            .with_user_agent(user_agent)?
            .with_custom_headers(&self.http_config.headers)?
            .build();
        merge_headers(base, &request.headers)
    }

    fn notify_response(
        &self,
        ctx: &HttpRequestContext,
        response: &HttpTransportResponse,
    ) -> Result<(), LlmError> {
        for interceptor in &self.interceptors {
            interceptor.on_response(ctx, response.status, &response.headers)?;
        }
        Ok(())
    }

    fn notify_line(&self, ctx: &HttpRequestContext, line: &str) -> Result<(), LlmError> {
        for interceptor in &self.interceptors {
            interceptor.on_line(ctx, line)?;
        }
        Ok(())
    }

    fn fail(&self, ctx: &HttpRequestContext, error: LlmError) -> StreamEvent {
        for interceptor in &self.interceptors {
            interceptor.on_error(ctx, &error);
        }
        tracing::debug!(
            target: "inference_stream::stream",
            request_id = %ctx.request_id,
            error = %error,
            "request failed"
        );
        StreamEvent::Finished(StreamOutcome::Failed(error))
    }

    fn cancelled(&self, ctx: &HttpRequestContext) -> StreamEvent {
        tracing::debug!(target: "inference_stream::stream", request_id = %ctx.request_id, "request cancelled");
        StreamEvent::Finished(StreamOutcome::Cancelled)
    }

    fn completed(&self, ctx: &HttpRequestContext) -> StreamEvent {
        tracing::debug!(target: "inference_stream::stream", request_id = %ctx.request_id, "request completed");
        StreamEvent::Finished(StreamOutcome::Completed)
    }
}

fn apply_before_send(request: &InferenceRequest) -> Result<Value, LlmError> {
    match &request.before_send {
        Some(hook) => hook(&request.body),
        None => Ok(request.body.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::execution::transport::ByteStream;
    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedTransport {
        status: u16,
        chunks: Vec<&'static str>,
        seen: Mutex<Vec<HttpTransportRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, chunks: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                status,
                chunks,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn execute(
            &self,
            request: HttpTransportRequest,
        ) -> Result<HttpTransportResponse, LlmError> {
            self.seen.lock().unwrap().push(request);
            let chunks: Vec<Result<Bytes, LlmError>> = self
                .chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect();
            let body: ByteStream = Box::pin(futures::stream::iter(chunks));
            Ok(HttpTransportResponse {
                status: self.status,
                headers: HeaderMap::new(),
                body,
            })
        }
    }

    fn executor(transport: Arc<CannedTransport>) -> Arc<RequestExecutor> {
        Arc::new(RequestExecutor {
            transport,
            http_config: HttpConfig::default(),
            limits: StreamLimits::default(),
            interceptors: Vec::new(),
        })
    }

    fn request(stream: bool) -> InferenceRequest {
        use crate::types::{ModelRef, ModelRuntimeParams};
        let params = if stream {
            ModelRuntimeParams::streaming()
        } else {
            ModelRuntimeParams::non_streaming()
        };
        InferenceRequest::new(
            "http://backend.test/v1/chat/completions",
            json!({"messages": []}),
            ModelRef::new("m").with_parameters(params),
        )
    }

    async fn run(exec: Arc<RequestExecutor>, req: InferenceRequest) -> Vec<StreamEvent> {
        exec.execute(req, CancelHandle::new()).collect().await
    }

    fn texts(events: &[StreamEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Text(t) => Some(t.clone()),
                StreamEvent::Finished(_) => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn streams_cumulative_text() {
        let transport = CannedTransport::new(
            200,
            vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
                "data: [DONE]\n",
            ],
        );
        let events = run(executor(transport), request(true)).await;
        assert_eq!(texts(&events), vec!["Hel", "Hello"]);
        assert!(matches!(
            events.last(),
            Some(StreamEvent::Finished(StreamOutcome::Completed))
        ));
    }

    #[tokio::test]
    async fn single_shot_reply() {
        let transport =
            CannedTransport::new(200, vec![r#"{"choices":[{"message":{"content":"hi"}}]}"#]);
        let events = run(executor(transport), request(false)).await;
        assert_eq!(texts(&events), vec!["hi"]);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn error_status_is_classified() {
        let transport = CannedTransport::new(401, vec![r#"{"error":{"message":"bad key"}}"#]);
        let events = run(executor(transport), request(true)).await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Finished(StreamOutcome::Failed(e)) => {
                assert_eq!(e.code(), ErrorCode::InvalidApiKey);
                assert_eq!(e.error_info().message, "bad key");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_error_body_fails_with_stream_error() {
        let transport = CannedTransport::new(502, vec!["<html>", "bad gateway", "</html>"]);
        let exec = Arc::new(RequestExecutor {
            transport,
            http_config: HttpConfig::default(),
            limits: StreamLimits {
                max_body_bytes: 8,
                ..StreamLimits::default()
            },
            interceptors: Vec::new(),
        });
        let events = run(exec, request(true)).await;
        assert!(matches!(
            events.as_slice(),
            [StreamEvent::Finished(StreamOutcome::Failed(LlmError::StreamError(_)))]
        ));
    }

    #[tokio::test]
    async fn headers_follow_stream_flag() {
        let transport = CannedTransport::new(200, vec![]);
        let exec = executor(transport.clone());
        run(exec, request(true).with_header("Accept", "application/x-ndjson")).await;

        let seen = transport.seen.lock().unwrap();
        let headers = &seen[0].headers;
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["accept"], "application/x-ndjson");
        assert_eq!(headers["cache-control"], "no-cache");
        assert!(seen[0].ctx.stream);
    }

    #[tokio::test]
    async fn before_send_can_disable_streaming() {
        let transport =
            CannedTransport::new(200, vec![r#"{"choices":[{"message":{"content":"ok"}}]}"#]);
        let exec = executor(transport.clone());
        let hook: crate::types::BeforeSendHook = Arc::new(|body: &Value| {
            let mut body = body.clone();
            body["stream"] = json!(false);
            Ok(body)
        });
        let req = InferenceRequest::new(
            "http://backend.test/v1/chat/completions",
            json!({"messages": []}),
            crate::types::ModelRef::new("m"),
        )
        .with_before_send(hook);
        let events = run(exec, req).await;
        assert_eq!(texts(&events), vec!["ok"]);

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].body["stream"], json!(false));
        assert!(!seen[0].ctx.stream);
        assert_eq!(seen[0].headers["accept"], "application/json");
    }

    #[tokio::test]
    async fn cancelled_before_first_poll_sends_nothing() {
        let transport = CannedTransport::new(200, vec!["data: {}\n"]);
        let exec = executor(transport.clone());
        let cancel = CancelHandle::new();
        cancel.cancel();
        let events: Vec<_> = exec.execute(request(true), cancel).collect().await;
        assert!(matches!(
            events.as_slice(),
            [StreamEvent::Finished(StreamOutcome::Cancelled)]
        ));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn interceptor_veto_fails_request() {
        struct Veto;
        impl HttpInterceptor for Veto {
            fn on_before_send(
                &self,
                _ctx: &HttpRequestContext,
                _body: &Value,
                _headers: &mut HeaderMap,
            ) -> Result<(), LlmError> {
                Err(LlmError::InvalidInput("blocked".into()))
            }
        }

        let transport = CannedTransport::new(200, vec![]);
        let exec = Arc::new(RequestExecutor {
            transport: transport.clone(),
            http_config: HttpConfig::default(),
            limits: StreamLimits::default(),
            interceptors: vec![Arc::new(Veto)],
        });
        let events = run(exec, request(true)).await;
        assert!(matches!(
            events.as_slice(),
            [StreamEvent::Finished(StreamOutcome::Failed(LlmError::InvalidInput(_)))]
        ));
        assert!(transport.seen.lock().unwrap().is_empty());
    }
}
