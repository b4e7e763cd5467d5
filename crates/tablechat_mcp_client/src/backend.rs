//! Language model seam and its HTTP client.

use async_trait::async_trait;
use tablechat_core::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ClientSettings};
use tablechat_error::{ClientError, ClientErrorKind};
use tracing::{debug, error, instrument};

/// Something that completes a conversation with one assistant reply.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Generate the assistant reply for `messages`.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ClientError>;
}

/// Posts to the gateway's `/v1/chat/completions`.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Client for the gateway at `base_url` with default sampling.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: tablechat_core::DEFAULT_MODEL.to_string(),
            max_tokens: 256,
            temperature: 0.2,
            client: reqwest::Client::new(),
        }
    }

    /// Client configured from `[client]` settings.
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            model: settings.model().clone(),
            max_tokens: *settings.max_tokens(),
            temperature: *settings.temperature(),
            ..Self::new(settings.gateway_url().clone())
        }
    }

    /// Same sampling, different gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Gateway base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatBackend for GatewayClient {
    #[instrument(skip(self, messages), fields(base_url = %self.base_url, messages = messages.len()))]
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ClientError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            ..ChatCompletionRequest::new(self.model.clone(), messages)
        };

        let response = self.client.post(&url).json(&request).send().await.map_err(|e| {
            error!("Gateway request failed: {}", e);
            ClientError::new(ClientErrorKind::Transport(e.to_string()))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Gateway returned error");
            return Err(ClientError::new(ClientErrorKind::Api {
                status: status.as_u16(),
                body,
            }));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            ClientError::new(ClientErrorKind::Deserialization(e.to_string()))
        })?;

        let content = completion.first_content().ok_or_else(|| {
            ClientError::new(ClientErrorKind::Deserialization(
                "completion has no choices".to_string(),
            ))
        })?;
        debug!(chars = content.len(), "Chat completion received");
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablechat_core::Settings;

    #[test]
    fn test_url_override_keeps_configured_sampling() {
        let settings = Settings::bundled().unwrap();
        let client = GatewayClient::from_settings(settings.client())
            .with_base_url("http://gateway.internal:9000/");

        assert_eq!(client.base_url(), "http://gateway.internal:9000");
        assert_eq!(client.model, *settings.client().model());
        assert_eq!(client.max_tokens, *settings.client().max_tokens());
        assert_eq!(client.temperature, *settings.client().temperature());
    }
}
