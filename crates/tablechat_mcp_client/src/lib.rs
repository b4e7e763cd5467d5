//! Client/orchestrator for tablechat.
//!
//! Sends a question to the inference gateway, tries to read the reply as a
//! single tool call, corrects its row limit from any number in the question
//! and forwards it to the tool server. Replies that are not tool calls are
//! returned as they are.
//!
//! ```text
//! question -> ChatBackend -> interpret -> quantity override -> ToolExecutor -> Answer
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tablechat_mcp_client::{GatewayClient, McpHttpClient, Orchestrator};
//!
//! # async fn example() {
//! let orchestrator = Orchestrator::new(
//!     Arc::new(GatewayClient::new("http://localhost:8000")),
//!     Arc::new(McpHttpClient::new("http://localhost:3333")),
//! );
//! let answer = orchestrator.run("How many entries have city as Atlanta?").await;
//! println!("{}", answer.to_display_string());
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod executor;
mod interpreter;
mod orchestrator;
mod quantity;

pub use backend::{ChatBackend, GatewayClient};
pub use executor::{McpHttpClient, ToolExecutor};
pub use interpreter::{
    ASSISTANT_DELIMITER, CLIENT_SYSTEM_PROMPT, Interpretation, clean_assistant_output, interpret,
};
pub use orchestrator::{Answer, Orchestrator};
pub use quantity::{apply_quantity_override, infer_top};
