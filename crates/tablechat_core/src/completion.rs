//! OpenAI-compatible chat completion wire types.
//!
//! The gateway serves these on `/v1/chat/completions` and the client posts
//! them, so both sides share one definition.

use crate::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// Model name used when the caller does not send one.
pub const DEFAULT_MODEL: &str = "local-llama";

/// Completion id reported by the local gateway.
pub const LOCAL_COMPLETION_ID: &str = "chatcmpl-local";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    256
}

fn default_temperature() -> f32 {
    0.2
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
    /// Model identifier (informational; the gateway serves one model)
    #[serde(default = "default_model")]
    pub model: String,
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for sampling
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Enable streaming mode
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Non-streaming request with default sampling.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            stream: false,
        }
    }
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionResponse {
    /// Unique identifier for the completion
    pub id: String,
    /// Object type (always "chat.completion")
    pub object: String,
    /// Unix timestamp of when the completion was created
    pub created: i64,
    /// Model used for completion
    pub model: String,
    /// Generated completions
    pub choices: Vec<Choice>,
    /// Token usage statistics
    pub usage: Usage,
}

impl ChatCompletionResponse {
    /// Single-choice response carrying `content`.
    pub fn local(model: impl Into<String>, created: i64, content: impl Into<String>) -> Self {
        Self {
            id: LOCAL_COMPLETION_ID.to_string(),
            object: "chat.completion".to_string(),
            created,
            model: model.into(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        }
    }

    /// Content of the first choice.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|choice| choice.message.content.as_str())
    }
}

/// A completion choice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Choice {
    /// Index of this choice
    pub index: u32,
    /// The generated message
    pub message: ChatMessage,
    /// Reason why generation finished
    pub finish_reason: String,
}

/// Token usage statistics. The local gateway does not count tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

/// Streaming chat completion chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Unique identifier
    pub id: String,
    /// Object type (always "chat.completion.chunk")
    pub object: String,
    /// Unix timestamp
    pub created: i64,
    /// Model used
    pub model: String,
    /// Delta choices
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// Chunk carrying one generated fragment.
    pub fn local(model: impl Into<String>, created: i64, fragment: impl Into<String>) -> Self {
        Self {
            id: LOCAL_COMPLETION_ID.to_string(),
            object: "chat.completion.chunk".to_string(),
            created,
            model: model.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: Delta {
                    role: None,
                    content: Some(fragment.into()),
                },
                finish_reason: None,
            }],
        }
    }
}

/// A choice in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChunkChoice {
    /// Index of this choice
    pub index: u32,
    /// Delta content
    pub delta: Delta,
    /// Finish reason; `null` while fragments are still flowing
    pub finish_reason: Option<String>,
}

/// Delta content in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Delta {
    /// Role (only in first chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Incremental content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        assert_eq!(request.model, "local-llama");
        assert_eq!(request.max_tokens, 256);
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
        assert!(!request.stream);
    }

    #[test]
    fn test_local_response_shape() {
        let response = ChatCompletionResponse::local("local-llama", 1_700_000_000, "hello");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], "chatcmpl-local");
        assert_eq!(value["object"], "chat.completion");
        assert_eq!(value["choices"][0]["message"]["role"], "assistant");
        assert_eq!(value["choices"][0]["message"]["content"], "hello");
        assert_eq!(value["choices"][0]["finish_reason"], "stop");
        assert_eq!(value["usage"]["total_tokens"], 0);
    }

    #[test]
    fn test_chunk_finish_reason_is_null() {
        let chunk = ChatCompletionChunk::local("local-llama", 0, "tok");
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["object"], "chat.completion.chunk");
        assert_eq!(value["choices"][0]["delta"], json!({"content": "tok"}));
        assert!(value["choices"][0]["finish_reason"].is_null());
    }
}
