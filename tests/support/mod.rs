//! Shared helpers for the integration tests: an in-memory transport and
//! event collection utilities.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use inference_stream::execution::{
    ByteStream, HttpTransport, HttpTransportRequest, HttpTransportResponse,
};
use inference_stream::prelude::*;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::sync::Mutex;

/// Transport that answers every request with a fixed status and body frames.
pub struct ScriptedTransport {
    status: u16,
    frames: Vec<Result<Bytes, LlmError>>,
    // Keep the body open after the last frame instead of ending it.
    hang: bool,
    requests: Mutex<Vec<HttpTransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(status: u16, frames: Vec<&str>) -> Self {
        Self {
            status,
            frames: frames
                .into_iter()
                .map(|f| Ok(Bytes::copy_from_slice(f.as_bytes())))
                .collect(),
            hang: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(frames: Vec<&str>) -> Self {
        Self::new(200, frames)
    }

    pub fn with_error_frame(mut self, error: LlmError) -> Self {
        self.frames.push(Err(error));
        self
    }

    pub fn with_frames(mut self, frames: Vec<&str>) -> Self {
        self.frames.extend(
            frames
                .into_iter()
                .map(|f| Ok(Bytes::copy_from_slice(f.as_bytes()))),
        );
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn requests(&self) -> Vec<HttpTransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(
        &self,
        request: HttpTransportRequest,
    ) -> Result<HttpTransportResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        let frames = futures::stream::iter(self.frames.clone());
        let body: ByteStream = if self.hang {
            Box::pin(frames.chain(futures::stream::pending()))
        } else {
            Box::pin(frames)
        };
        Ok(HttpTransportResponse {
            status: self.status,
            headers: HeaderMap::new(),
            body,
        })
    }
}

pub fn client_with(transport: Arc<ScriptedTransport>) -> InferenceClient {
    InferenceClient::builder()
        .transport(transport)
        .build()
        .unwrap()
}

pub fn streaming_request(url: &str) -> InferenceRequest {
    InferenceRequest::new(
        url,
        serde_json::json!({"messages": [{"role": "user", "content": "hi"}]}),
        ModelRef::new("test-model").with_parameters(ModelRuntimeParams::streaming()),
    )
}

pub fn single_shot_request(url: &str) -> InferenceRequest {
    InferenceRequest::new(
        url,
        serde_json::json!({"messages": [{"role": "user", "content": "hi"}], "stream": false}),
        ModelRef::new("test-model").with_parameters(ModelRuntimeParams::non_streaming()),
    )
}

/// `data: ` line carrying one chat-completion delta.
pub fn delta_line(content: &str) -> String {
    let chunk = serde_json::json!({"choices": [{"delta": {"content": content}}]});
    format!("data: {chunk}\n")
}

pub async fn collect_events(stream: InferenceStream) -> Vec<StreamEvent> {
    stream.collect().await
}

pub fn texts(events: &[StreamEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Text(t) => Some(t.clone()),
            StreamEvent::Finished(_) => None,
        })
        .collect()
}

/// The terminal outcome; panics unless the sequence ends with exactly one.
pub fn outcome(events: &[StreamEvent]) -> StreamOutcome {
    let finished: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, StreamEvent::Finished(_)))
        .collect();
    assert_eq!(finished.len(), 1, "expected one terminal event: {events:?}");
    match events.last() {
        Some(StreamEvent::Finished(outcome)) => outcome.clone(),
        other => panic!("terminal event is not last: {other:?}"),
    }
}
