//! Turning raw model output into a tool call, or not.

use serde_json::Value;
use tablechat_core::{ToolCall, ToolName};
use tracing::debug;

/// Delimiter that marks the start of a run-on assistant turn.
pub const ASSISTANT_DELIMITER: &str = "<|assistant|>";

/// Sent as the first message of every conversation.
pub const CLIENT_SYSTEM_PROMPT: &str = "\
You are a tool-using assistant.

Available tools:
- countTableEntities
- queryTableEntities

Rules:
- Respond ONLY with valid JSON when calling a tool
- JSON must contain \"tool\" and \"arguments\"
- NEVER invent data values
- NEVER return table data directly
- Always delegate table access to tools
";

/// What the model's reply turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation {
    /// A well-formed call to one of the table tools
    ToolCall(ToolCall),
    /// Anything else, passed through as the answer
    PlainAnswer(String),
}

/// Keep only the first assistant turn, trimmed.
///
/// # Examples
///
/// ```
/// use tablechat_mcp_client::clean_assistant_output;
///
/// let raw = "  {\"tool\": \"none\", \"arguments\": {}}\n\n<|assistant|>\n{}";
/// assert_eq!(clean_assistant_output(raw), "{\"tool\": \"none\", \"arguments\": {}}");
/// ```
pub fn clean_assistant_output(text: &str) -> &str {
    text.split(ASSISTANT_DELIMITER)
        .next()
        .unwrap_or_default()
        .trim()
}

/// Interpret a model reply.
///
/// Exactly one JSON object naming a known tool with object arguments that
/// satisfy the tool's argument rules becomes a [`Interpretation::ToolCall`].
/// Everything else, including `"tool": "none"`, invalid JSON and several
/// concatenated objects, falls back to the cleaned text. Never fails.
pub fn interpret(raw: &str) -> Interpretation {
    let cleaned = clean_assistant_output(raw);
    let plain = || Interpretation::PlainAnswer(cleaned.to_string());

    let value: Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Model output is not a single JSON value");
            return plain();
        }
    };
    if !value.is_object() {
        return plain();
    }

    let call: ToolCall = match serde_json::from_value(value) {
        Ok(call) => call,
        Err(e) => {
            debug!(error = %e, "Model output is not a tool call");
            return plain();
        }
    };

    if call.tool == ToolName::None {
        return plain();
    }
    if let Err(violation) = call.validate() {
        debug!(%violation, "Tool call breaks argument rules");
        return plain();
    }

    Interpretation::ToolCall(call)
}
