//! The inference engine seam.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use tablechat_error::GatewayError;

/// Finite, single-use sequence of generated text fragments.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

/// Decoding parameters for one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl SamplingParams {
    /// Create sampling parameters.
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// A text-completion capability.
///
/// Implementations need not be safe for concurrent use; the gateway
/// serialises access.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Generate a full completion for `prompt`.
    async fn complete(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<String, GatewayError>;

    /// Generate a completion fragment by fragment.
    async fn complete_stream(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<TokenStream, GatewayError>;
}
