//! The fixed response wrapper returned by every tool execution.

use serde::{Deserialize, Serialize};

/// One block of tool output. Only text blocks exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Plain text block, serialised as `{"type": "text", "text": ...}`
    Text {
        /// The text payload
        text: String,
    },
}

/// `{content: [{type: "text", text}]}`
///
/// # Examples
///
/// ```
/// use tablechat_core::ResultEnvelope;
///
/// let envelope = ResultEnvelope::text("3 entities");
/// let json = serde_json::to_value(&envelope).unwrap();
/// assert_eq!(json["content"][0]["type"], "text");
/// assert_eq!(json["content"][0]["text"], "3 entities");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Content blocks in order
    pub content: Vec<ContentBlock>,
}

impl ResultEnvelope {
    /// Wrap a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// All text blocks joined with newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
