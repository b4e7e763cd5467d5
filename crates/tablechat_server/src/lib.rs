//! Local language model gateway for tablechat.
//!
//! Wraps a text-completion engine behind plain (`/generate`), streaming
//! (`/generate/stream`) and OpenAI-compatible (`/v1/chat/completions`)
//! endpoints, and answers `/chat` by running the tablechat orchestrator
//! against itself.
//!
//! # Components
//!
//! - [`InferenceEngine`]: the completion capability, normally a llama.cpp
//!   `llama-server` reached through [`LlamaServerEngine`]
//! - [`LlamaProcess`]: optional gateway-owned engine process
//! - [`InferenceGateway`]: one generation at a time over the engine
//! - [`render_chat_prompt`]: message list to role-delimited prompt
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tablechat_mcp_client::{McpHttpClient, Orchestrator};
//! use tablechat_server::{
//!     GatewayState, InferenceGateway, LlamaServerEngine, cors_layer, create_router,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = InferenceGateway::new(Arc::new(LlamaServerEngine::new("http://127.0.0.1:8081")));
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(gateway.clone()),
//!         Arc::new(McpHttpClient::new("http://localhost:3333")),
//!     );
//!     let app = create_router(
//!         GatewayState::new(gateway, orchestrator),
//!         cors_layer("http://localhost:5173")?,
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod engine;
mod gateway;
mod llama;
mod process;
mod prompt;

pub use api::{
    ApiError, ChatRequest, ChatResponse, GatewayState, GenerateRequest, GenerateResponse,
    cors_layer, create_router,
};
pub use engine::{InferenceEngine, SamplingParams, TokenStream};
pub use gateway::InferenceGateway;
pub use llama::LlamaServerEngine;
pub use process::{LlamaLaunch, LlamaLaunchBuilder, LlamaProcess};
pub use prompt::{TOOL_CALL_INSTRUCTION, render_chat_prompt};
