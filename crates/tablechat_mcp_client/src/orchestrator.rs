//! Question in, answer out.

use crate::{
    ChatBackend, Interpretation, ToolExecutor, apply_quantity_override, interpreter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tablechat_core::{ChatMessage, ResultEnvelope};
use tablechat_error::ClientError;
use tracing::{debug, info, instrument, warn};

/// Final answer to a question.
///
/// Serialises untagged, so `/chat` returns either a string or the tool's
/// envelope under `response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// The tool server's result
    Tool(ResultEnvelope),
    /// The model's own reply, or an inline error
    Text(String),
}

impl Answer {
    /// Human-readable rendering.
    pub fn to_display_string(&self) -> String {
        match self {
            Answer::Tool(envelope) => envelope.joined_text(),
            Answer::Text(text) => text.clone(),
        }
    }

    fn from_error(err: &ClientError) -> Self {
        Answer::Text(format!("Error: {}", err.kind))
    }
}

/// Drives one question through model, interpreter and tools.
#[derive(Clone)]
pub struct Orchestrator {
    backend: Arc<dyn ChatBackend>,
    tools: Arc<dyn ToolExecutor>,
}

impl Orchestrator {
    /// Wire a model backend to a tool executor.
    pub fn new(backend: Arc<dyn ChatBackend>, tools: Arc<dyn ToolExecutor>) -> Self {
        Self { backend, tools }
    }

    /// Answer `question`.
    ///
    /// Transport failures come back as `Answer::Text("Error: ...")` rather
    /// than an `Err`, so an interactive session survives a server outage.
    #[instrument(skip(self))]
    pub async fn run(&self, question: &str) -> Answer {
        let messages = vec![
            ChatMessage::system(interpreter::CLIENT_SYSTEM_PROMPT),
            ChatMessage::user(question),
        ];

        let raw = match self.backend.complete(messages).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Language model unavailable");
                return Answer::from_error(&e);
            }
        };
        debug!(raw = %raw, "LLM raw response");

        let mut call = match interpreter::interpret(&raw) {
            Interpretation::ToolCall(call) => call,
            Interpretation::PlainAnswer(text) => {
                info!("No tool call, answering with model text");
                return Answer::Text(text);
            }
        };

        if let Some(top) = apply_quantity_override(question, &mut call) {
            info!(top, "Applied quantity override");
        }

        info!(tool = %call.tool, arguments = ?call.arguments, "Calling tool");
        match self.tools.call(&call).await {
            Ok(envelope) => Answer::Tool(envelope),
            Err(e) => {
                warn!(error = %e, "Tool call failed");
                Answer::from_error(&e)
            }
        }
    }
}
