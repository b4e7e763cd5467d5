//! Serialised access to the inference engine.

use crate::engine::{InferenceEngine, SamplingParams, TokenStream};
use crate::prompt::render_chat_prompt;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tablechat_core::ChatMessage;
use tablechat_error::{ClientError, ClientErrorKind, GatewayError, GatewayErrorKind};
use tablechat_mcp_client::ChatBackend;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Owns the engine and lets one generation run at a time.
///
/// A streaming generation keeps the engine locked until its stream is
/// exhausted or dropped.
#[derive(Clone)]
pub struct InferenceGateway {
    engine: Arc<dyn InferenceEngine>,
    lock: Arc<Mutex<()>>,
    max_tokens: u32,
    temperature: f32,
}

impl InferenceGateway {
    /// Take ownership of `engine`.
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self {
            engine,
            lock: Arc::new(Mutex::new(())),
            max_tokens: 256,
            temperature: 0.2,
        }
    }

    /// Sampling used when the gateway itself answers `/chat`.
    pub fn with_chat_defaults(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Complete `prompt`.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let params = validate(max_tokens, temperature)?;
        let _guard = self.lock.lock().await;
        debug!("Engine lock acquired");
        self.engine.complete(prompt, &params).await
    }

    /// Complete `prompt` fragment by fragment. Empty fragments are skipped.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn generate_stream(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TokenStream, GatewayError> {
        let params = validate(max_tokens, temperature)?;
        let guard = self.lock.clone().lock_owned().await;
        debug!("Engine lock acquired for stream");
        let mut inner = self.engine.complete_stream(prompt, &params).await?;

        Ok(Box::pin(async_stream::stream! {
            let _guard = guard;
            while let Some(fragment) = inner.next().await {
                match fragment {
                    Ok(text) if text.is_empty() => continue,
                    other => yield other,
                }
            }
        }))
    }

    /// Flatten `messages` and complete them.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        self.generate(&render_chat_prompt(messages), max_tokens, temperature)
            .await
    }

    /// Flatten `messages` and stream the completion.
    pub async fn chat_stream(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TokenStream, GatewayError> {
        self.generate_stream(&render_chat_prompt(messages), max_tokens, temperature)
            .await
    }
}

fn validate(max_tokens: u32, temperature: f32) -> Result<SamplingParams, GatewayError> {
    if max_tokens == 0 {
        return Err(GatewayError::new(GatewayErrorKind::InvalidRequest(
            "max_tokens must be greater than 0".to_string(),
        )));
    }
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(GatewayError::new(GatewayErrorKind::InvalidRequest(format!(
            "temperature must be a non-negative number, got {}",
            temperature
        ))));
    }
    Ok(SamplingParams::new(max_tokens, temperature))
}

#[async_trait]
impl ChatBackend for InferenceGateway {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ClientError> {
        self.chat(&messages, self.max_tokens, self.temperature)
            .await
            .map_err(|e| ClientError::new(ClientErrorKind::Generation(e.kind.to_string())))
    }
}
