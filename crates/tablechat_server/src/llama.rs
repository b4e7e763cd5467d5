//! HTTP engine backed by a llama.cpp `llama-server`.

use crate::engine::{InferenceEngine, SamplingParams, TokenStream};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tablechat_error::{GatewayError, GatewayErrorKind};
use tracing::{debug, error, instrument};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    stop: bool,
}

/// Talks to the native `/completion` endpoint of a running `llama-server`.
#[derive(Debug, Clone)]
pub struct LlamaServerEngine {
    base_url: String,
    client: reqwest::Client,
}

impl LlamaServerEngine {
    /// Engine for the server at `base_url`, e.g. `http://127.0.0.1:8081`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Base URL of the engine.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(
        &self,
        prompt: &str,
        params: &SamplingParams,
        stream: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}/completion", self.base_url);
        let body = CompletionRequest {
            prompt,
            n_predict: params.max_tokens,
            temperature: params.temperature,
            stream,
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            error!("Engine request failed: {}", e);
            GatewayError::new(GatewayErrorKind::Http(format!("Request failed: {}", e)))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, "Engine returned error");
            return Err(GatewayError::new(GatewayErrorKind::Engine(format!(
                "Engine returned {}: {}",
                status, text
            ))));
        }

        Ok(response)
    }
}

#[async_trait]
impl InferenceEngine for LlamaServerEngine {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), max_tokens = params.max_tokens))]
    async fn complete(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, GatewayError> {
        let response = self.post(prompt, params, false).await?;
        let completion: CompletionResponse = response.json().await.map_err(|e| {
            GatewayError::new(GatewayErrorKind::Deserialization(format!(
                "Failed to parse completion: {}",
                e
            )))
        })?;
        debug!(chars = completion.content.len(), "Completion finished");
        Ok(completion.content)
    }

    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), max_tokens = params.max_tokens))]
    async fn complete_stream(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<TokenStream, GatewayError> {
        let response = self.post(prompt, params, true).await?;
        debug!("Streaming completion started");
        Ok(Box::pin(fragments(response)))
    }
}

/// Turn the engine's SSE body into text fragments, ending at `stop: true`.
fn fragments(
    response: reqwest::Response,
) -> impl futures::Stream<Item = Result<String, GatewayError>> + Send {
    async_stream::stream! {
        let mut body = response.bytes_stream();
        let mut events = SseBuffer::default();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(GatewayError::new(GatewayErrorKind::Stream(e.to_string())));
                    return;
                }
            };

            let payloads = match events.push(&chunk) {
                Ok(payloads) => payloads,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for data in payloads {
                match serde_json::from_str::<CompletionResponse>(&data) {
                    Ok(fragment) => {
                        if !fragment.content.is_empty() {
                            yield Ok(fragment.content);
                        }
                        if fragment.stop {
                            return;
                        }
                    }
                    Err(e) => {
                        yield Err(GatewayError::new(GatewayErrorKind::Deserialization(format!(
                            "Failed to parse chunk: {}",
                            e
                        ))));
                        return;
                    }
                }
            }
        }
    }
}

/// Reassembles server-sent events from arbitrarily split byte chunks.
#[derive(Debug, Default)]
pub(crate) struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    /// Append `bytes` and return the `data` payload of every event completed by them.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, GatewayError> {
        self.pending.extend(bytes.iter().filter(|b| **b != b'\r'));

        let mut payloads = Vec::new();
        while let Some(end) = self.pending.windows(2).position(|w| w == b"\n\n") {
            let event: Vec<u8> = self.pending.drain(..end + 2).collect();
            let event = std::str::from_utf8(&event[..end]).map_err(|e| {
                GatewayError::new(GatewayErrorKind::Stream(format!("Invalid UTF-8: {}", e)))
            })?;

            let data: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|value| value.strip_prefix(' ').unwrap_or(value))
                .collect();
            if !data.is_empty() {
                payloads.push(data.join("\n"));
            }
        }
        Ok(payloads)
    }
}
