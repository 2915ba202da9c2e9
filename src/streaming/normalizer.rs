//! Payload normalization.
//!
//! Turns decoded lines (streaming) or a parsed reply (single-shot) into text
//! deltas. Callers may replace the default parsing with their own
//! [`ResponseNormalizer`].

use super::payload::{BackendPayload, embedded_document_error, embedded_stream_error};
use crate::defaults::protocol::{DATA_FIELD, DONE_SENTINEL};
use crate::error::LlmError;
use serde_json::Value;
use std::sync::Arc;

/// Caller-supplied replacement for the default payload parsing.
///
/// Whatever text it returns is appended to the cumulative reply as-is; no
/// backend-shape inference, error-frame detection or prefix stripping is
/// applied. Returning an error fails the request.
pub trait ResponseNormalizer: Send + Sync {
    /// Delta contributed by one raw stream line.
    fn normalize_line(&self, line: &str) -> Result<String, LlmError>;

    /// Text of a complete single-shot reply.
    fn normalize_document(&self, document: &Value) -> Result<String, LlmError> {
        self.normalize_line(&document.to_string())
    }
}

/// Closures over the raw line work as normalizers; single-shot replies are
/// handed to them as serialized JSON.
impl<F> ResponseNormalizer for F
where
    F: Fn(&str) -> Result<String, LlmError> + Send + Sync,
{
    fn normalize_line(&self, line: &str) -> Result<String, LlmError> {
        self(line)
    }
}

/// Result of normalizing one stream line.
#[derive(Debug)]
pub enum Normalized {
    /// Text to append (may be empty).
    Delta(String),
    /// Nothing to emit: blank, framing, sentinel or not-yet-complete JSON.
    Skip,
    /// Terminal error; the read loop stops.
    Failed(LlmError),
}

/// Per-request stream line normalizer.
///
/// Owns the pending partial-JSON buffer used when a backend spreads one JSON
/// object over several lines.
pub struct LineNormalizer {
    custom: Option<Arc<dyn ResponseNormalizer>>,
    pending: String,
    max_pending_bytes: usize,
}

impl LineNormalizer {
    pub fn new(custom: Option<Arc<dyn ResponseNormalizer>>, max_pending_bytes: usize) -> Self {
        Self {
            custom,
            pending: String::new(),
            max_pending_bytes,
        }
    }

    pub fn normalize(&mut self, line: &str) -> Normalized {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_framing_line(trimmed) {
            return Normalized::Skip;
        }
        let payload = strip_data_field(trimmed);
        if payload == DONE_SENTINEL {
            return Normalized::Skip;
        }

        if let Some(custom) = &self.custom {
            return match custom.normalize_line(line) {
                Ok(delta) => Normalized::Delta(delta),
                Err(e) => Normalized::Failed(e),
            };
        }

        match self.parse(payload) {
            Some(doc) => interpret_stream_document(&doc),
            None => Normalized::Skip,
        }
    }

    /// End of stream. Returns the size of an unresolved partial JSON, which is dropped.
    pub fn finish(self) -> usize {
        self.pending.len()
    }

    fn parse(&mut self, payload: &str) -> Option<Value> {
        if self.pending.is_empty() {
            return match serde_json::from_str(payload) {
                Ok(doc) => Some(doc),
                Err(_) => {
                    self.hold(payload);
                    None
                }
            };
        }

        let joined = format!("{}{}", self.pending, payload);
        match serde_json::from_str(&joined) {
            Ok(doc) => {
                self.pending.clear();
                Some(doc)
            }
            // Still incomplete: keep concatenating, however many lines it takes.
            Err(e) if e.is_eof() => {
                self.pending = joined;
                self.enforce_limit();
                None
            }
            // No continuation can repair a syntax error; restart from this line.
            Err(_) => {
                tracing::debug!(
                    target: "inference_stream::stream",
                    dropped_bytes = self.pending.len(),
                    "discarding stale partial JSON"
                );
                self.pending.clear();
                self.parse(payload)
            }
        }
    }

    fn hold(&mut self, payload: &str) {
        self.pending.push_str(payload);
        self.enforce_limit();
    }

    fn enforce_limit(&mut self) {
        if self.pending.len() > self.max_pending_bytes {
            tracing::warn!(
                target: "inference_stream::stream",
                dropped_bytes = self.pending.len(),
                limit = self.max_pending_bytes,
                "partial JSON exceeded buffer limit; dropping it"
            );
            self.pending.clear();
        }
    }
}

fn interpret_stream_document(doc: &Value) -> Normalized {
    if let Some(err) = embedded_stream_error(doc) {
        return Normalized::Failed(err);
    }
    Normalized::Delta(BackendPayload::detect(doc).stream_delta().to_string())
}

/// Text of a single-shot reply, or the error it carries.
pub fn normalize_document(
    doc: &Value,
    custom: Option<&dyn ResponseNormalizer>,
) -> Result<String, LlmError> {
    if let Some(err) = embedded_document_error(doc) {
        return Err(err);
    }
    match custom {
        Some(custom) => custom.normalize_document(doc),
        None => Ok(BackendPayload::detect(doc).message_text().to_string()),
    }
}

/// SSE comments and non-data fields carry no payload.
fn is_framing_line(line: &str) -> bool {
    line.starts_with(':')
        || ["event:", "id:", "retry:"]
            .iter()
            .any(|field| line.starts_with(field))
}

fn strip_data_field(line: &str) -> &str {
    match line.strip_prefix(DATA_FIELD) {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => line,
    }
}
