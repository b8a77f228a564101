//! Response normalizer: turns a raw upstream reply into the single payload string
//!
//! The completion service answers in one of two shapes depending on its
//! version: a flat `output_text` field, or a nested `output` list of items
//! whose `message` entries carry `output_text` content parts. Either shape may
//! instead report an error. [`UpstreamReply::classify`] makes the one
//! discriminator decision and [`normalize`] extracts from the result.
//!
//! The extracted string is returned verbatim. It is never checked against the
//! lens's expected keys; schema conformance belongs to whoever renders it.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{LensError, Result};

/// Verbatim model payload. Expected, not guaranteed, to be JSON mapping each
/// lens key to `{ paragraph, bullets }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LensResult(String);

impl LensResult {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for LensResult {
    fn from(payload: String) -> Self {
        Self(payload)
    }
}

impl std::fmt::Display for LensResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_parts")]
    pub content: Option<Vec<Option<ContentPart>>>,
}

/// Parts that are not objects, or whose fields have the wrong type, become
/// `None` so one stray element does not hide the rest of the message.
fn lenient_parts<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<Option<ContentPart>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let parts = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(parts)) => parts,
        _ => return Ok(None),
    };
    Ok(Some(
        parts
            .into_iter()
            .map(|part| serde_json::from_value(part).ok())
            .collect(),
    ))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<Value>,
}

impl OutputItem {
    fn is_message(&self) -> bool {
        self.kind.as_deref() == Some("message")
    }

    /// First `output_text` part with a string `text`, in content order
    fn output_text(&self) -> Option<&str> {
        self.content
            .as_deref()?
            .iter()
            .flatten()
            .find(|part| {
                part.kind.as_deref() == Some("output_text")
                    && part.text.as_ref().is_some_and(Value::is_string)
            })
            .and_then(|part| part.text.as_ref()?.as_str())
    }
}

/// Upstream reply after the discriminator check
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamReply {
    Failed { status: u16, detail: Value },
    Flat(String),
    Nested(Vec<OutputItem>),
    Empty,
}

impl UpstreamReply {
    pub fn classify(status: u16, body: Value) -> Self {
        let error = body.get("error").filter(|e| !e.is_null()).cloned();

        if status >= 400 {
            let detail = error.unwrap_or_else(|| {
                let raw = match &body {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Value::String(format!("upstream API error ({}): {}", status, raw))
            });
            return UpstreamReply::Failed { status, detail };
        }
        if let Some(detail) = error {
            return UpstreamReply::Failed { status, detail };
        }

        if let Some(text) = body.get("output_text").and_then(Value::as_str)
            && !text.is_empty()
        {
            return UpstreamReply::Flat(text.to_string());
        }

        match body.get("output").and_then(Value::as_array) {
            Some(items) => UpstreamReply::Nested(
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect(),
            ),
            None => UpstreamReply::Empty,
        }
    }
}

/// Extract the payload, or fail with the matching taxonomy entry
pub fn normalize(reply: UpstreamReply) -> Result<LensResult> {
    let text = match reply {
        UpstreamReply::Failed { status, detail } => {
            return Err(LensError::UpstreamError { status, detail });
        }
        UpstreamReply::Flat(text) => text,
        // Only the first message carrying a string output_text part counts,
        // even when its text is empty.
        UpstreamReply::Nested(items) => items
            .iter()
            .filter(|item| item.is_message())
            .find_map(OutputItem::output_text)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .ok_or(LensError::MissingPayload)?,
        UpstreamReply::Empty => return Err(LensError::MissingPayload),
    };

    if serde_json::from_str::<Value>(&text).is_err() {
        // Forwarded anyway; the renderer decides what to do with it.
        debug!("Upstream payload is not valid JSON ({} chars)", text.len());
    }

    Ok(LensResult(text))
}
