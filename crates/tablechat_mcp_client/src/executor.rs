//! Tool execution seam and its HTTP client.

use async_trait::async_trait;
use serde_json::json;
use tablechat_core::{ResultEnvelope, ToolCall};
use tablechat_error::{ClientError, ClientErrorKind};
use tracing::{error, instrument};

/// Something that runs a tool call to completion.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute `call` and return its result envelope.
    async fn call(&self, call: &ToolCall) -> Result<ResultEnvelope, ClientError>;
}

/// Posts `{tool, arguments}` to the tool server's `/mcp`.
#[derive(Debug, Clone)]
pub struct McpHttpClient {
    base_url: String,
    client: reqwest::Client,
}

impl McpHttpClient {
    /// Client for the tool server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ToolExecutor for McpHttpClient {
    #[instrument(skip(self, call), fields(tool = %call.tool))]
    async fn call(&self, call: &ToolCall) -> Result<ResultEnvelope, ClientError> {
        let url = format!("{}/mcp", self.base_url);
        let payload = json!({"tool": call.tool, "arguments": call.arguments});

        let response = self.client.post(&url).json(&payload).send().await.map_err(|e| {
            error!("Tool server request failed: {}", e);
            ClientError::new(ClientErrorKind::Transport(e.to_string()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Tool server returned error");
            return Err(ClientError::new(ClientErrorKind::Api {
                status: status.as_u16(),
                body,
            }));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::new(ClientErrorKind::Deserialization(e.to_string())))
    }
}
