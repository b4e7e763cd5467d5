//! Core data types for tablechat.
//!
//! This crate provides the request-scoped data model shared by the inference
//! gateway, the tool execution server and the client: chat messages, tool
//! calls, the result envelope and the OpenAI-compatible completion wire
//! types, plus layered configuration and tracing setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod completion;
mod config;
mod envelope;
mod message;
mod role;
mod telemetry;
mod tool_call;

pub use completion::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, Choice, ChunkChoice,
    DEFAULT_MODEL, Delta, LOCAL_COMPLETION_ID, Usage,
};
pub use config::{ClientSettings, GatewaySettings, LoggingSettings, McpSettings, Settings};
pub use envelope::{ContentBlock, ResultEnvelope};
pub use message::ChatMessage;
pub use role::Role;
pub use telemetry::init_tracing;
pub use tool_call::{
    ARG_FILTER, ARG_SELECT, ARG_TOP, ToolCall, ToolCallViolation, ToolName, ToolNameParseError,
};
