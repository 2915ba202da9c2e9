//! Backend payload shapes.
//!
//! Three response families are understood and resolved once per document by
//! checking which top-level key is present:
//!
//! - chat-completion: `choices[].delta.content` (stream) / `choices[].message.content`
//! - content-block: `content[].text`
//! - block delta: top-level `delta.text`

use crate::error::LlmError;
use serde::Deserialize;
use serde_json::Value;

/// Keys that mark a stream line as an error frame.
const STREAM_ERROR_KEYS: &[&str] = &["error", "message", "detail"];

/// Keys that mark a single-shot reply as an error document.
const DOCUMENT_ERROR_KEYS: &[&str] = &["error", "message"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub delta: Option<ChatContent>,
    #[serde(default)]
    pub message: Option<ChatContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatContent {
    // Multimodal servers may send an array here; only plain strings carry text.
    #[serde(default)]
    pub content: Option<Value>,
}

impl ChatContent {
    fn text(&self) -> Option<&str> {
        self.content.as_ref()?.as_str()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: Option<String>,
}

/// A parsed backend document, tagged by response family.
#[derive(Debug, Clone)]
pub enum BackendPayload {
    ChatCompletion(Vec<ChatChoice>),
    ContentBlocks(Vec<ContentBlock>),
    BlockDelta(ContentBlock),
    Unrecognized,
}

impl BackendPayload {
    /// Resolve the family of `doc` by key presence.
    pub fn detect(doc: &Value) -> Self {
        if let Some(choices) = doc.get("choices") {
            return Self::ChatCompletion(Vec::<ChatChoice>::deserialize(choices).unwrap_or_default());
        }
        if let Some(content) = doc.get("content") {
            return Self::ContentBlocks(
                Vec::<ContentBlock>::deserialize(content).unwrap_or_default(),
            );
        }
        if let Some(delta) = doc.get("delta") {
            return Self::BlockDelta(ContentBlock::deserialize(delta).unwrap_or_default());
        }
        Self::Unrecognized
    }

    /// Incremental text carried by one stream line.
    pub fn stream_delta(&self) -> &str {
        let text = match self {
            Self::ChatCompletion(choices) => choices
                .first()
                .and_then(|c| c.delta.as_ref())
                .and_then(ChatContent::text),
            Self::ContentBlocks(blocks) => blocks.first().and_then(|b| b.text.as_deref()),
            Self::BlockDelta(block) => block.text.as_deref(),
            Self::Unrecognized => None,
        };
        text.unwrap_or_default()
    }

    /// Full text of a single-shot reply.
    pub fn message_text(&self) -> &str {
        let text = match self {
            Self::ChatCompletion(choices) => choices
                .first()
                .and_then(|c| c.message.as_ref())
                .and_then(ChatContent::text),
            Self::ContentBlocks(blocks) => blocks.first().and_then(|b| b.text.as_deref()),
            Self::BlockDelta(_) | Self::Unrecognized => None,
        };
        text.unwrap_or_default()
    }
}

/// Error carried by a stream line.
///
/// Any of `error`, `message` or `detail` being present marks the line as an
/// error frame, even when its value is `null`.
pub fn embedded_stream_error(doc: &Value) -> Option<LlmError> {
    let obj = doc.as_object()?;
    STREAM_ERROR_KEYS
        .iter()
        .any(|k| obj.contains_key(*k))
        .then(|| error_from(doc))
}

/// Error carried by a single-shot reply.
///
/// Only a truthy `error` or `message` counts, so `"error": null` next to a
/// regular reply is not a failure.
pub fn embedded_document_error(doc: &Value) -> Option<LlmError> {
    let obj = doc.as_object()?;
    DOCUMENT_ERROR_KEYS
        .iter()
        .any(|k| obj.get(*k).is_some_and(is_truthy))
        .then(|| error_from(doc))
}

// The detail is the `error` field when set, otherwise the whole document.
fn error_from(doc: &Value) -> LlmError {
    let detail = doc.get("error").filter(|v| is_truthy(v)).unwrap_or(doc);
    LlmError::from_embedded_payload(detail)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
