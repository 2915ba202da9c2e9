//! Core Streaming Types
//!
//! An inference reply is delivered as an [`InferenceStream`]: zero or more
//! [`StreamEvent::Text`] items carrying the cumulative reply, then exactly one
//! [`StreamEvent::Finished`], then the end of the stream.

use crate::error::LlmError;
use crate::utils::cancel::CancelHandle;
use futures::Stream;
use futures_util::StreamExt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Terminal state of one request.
#[derive(Debug, Clone)]
pub enum StreamOutcome {
    /// The reply ended cleanly.
    Completed,
    /// Transport, backend or protocol failure.
    Failed(LlmError),
    /// The caller cancelled the request.
    Cancelled,
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// One item of an inference stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Cumulative reply text so far.
    Text(String),
    /// The single terminal event.
    Finished(StreamOutcome),
}

pub(crate) type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Text-only view of an inference stream.
///
/// Yields cumulative text; failure and cancellation end it with an `Err`.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Lazy, pull-based sequence of reply events.
///
/// Nothing is sent until the stream is first polled, and the next chunk is
/// only read when the consumer asks for the next event.
pub struct InferenceStream {
    inner: EventStream,
    finished: bool,
}

impl InferenceStream {
    pub(crate) fn new(inner: EventStream) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    /// Drive the stream to its end and return the final reply text.
    pub async fn collect_text(mut self) -> Result<String, LlmError> {
        let mut text = String::new();
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Text(t) => text = t,
                StreamEvent::Finished(StreamOutcome::Completed) => return Ok(text),
                StreamEvent::Finished(StreamOutcome::Failed(e)) => return Err(e),
                StreamEvent::Finished(StreamOutcome::Cancelled) => return Err(LlmError::Cancelled),
            }
        }
        Err(LlmError::InternalError(
            "stream ended without a terminal event".to_string(),
        ))
    }

    /// View the stream as cumulative text items.
    pub fn into_text_stream(self) -> TextStream {
        let s = self.filter_map(|event| async move {
            match event {
                StreamEvent::Text(t) => Some(Ok(t)),
                StreamEvent::Finished(StreamOutcome::Completed) => None,
                StreamEvent::Finished(StreamOutcome::Failed(e)) => Some(Err(e)),
                StreamEvent::Finished(StreamOutcome::Cancelled) => Some(Err(LlmError::Cancelled)),
            }
        });
        Box::pin(s)
    }
}

impl Stream for InferenceStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(event)) => {
                if matches!(event, StreamEvent::Finished(_)) {
                    self.finished = true;
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                // The producer always finishes explicitly; treat a silent end as a bug.
                self.finished = true;
                Poll::Ready(Some(StreamEvent::Finished(StreamOutcome::Failed(
                    LlmError::InternalError("stream ended without a terminal event".to_string()),
                ))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for InferenceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceStream")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Inference stream with first-class cancellation handle.
///
/// ```rust,ignore
/// let handle = client.invoke(request);
/// let cancel = handle.cancel.clone();
/// // Cancel if needed
/// cancel.cancel();
/// ```
#[derive(Debug)]
pub struct InferenceStreamHandle {
    pub stream: InferenceStream,
    pub cancel: CancelHandle,
}
