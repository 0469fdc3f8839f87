//! Provider-agnostic request/response types and the `LlmProvider` trait.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::LlmError;

/// A completion request: one user prompt plus sampling options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub finish_reason: FinishReason,
    pub response_id: Option<String>,
}

/// A remote text-generation backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier used for requests.
    fn model_name(&self) -> &str;

    /// Cost per (input, output) token in USD.
    fn cost_per_token(&self) -> (Decimal, Decimal);

    /// Run a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_options() {
        let req = CompletionRequest::new("hi")
            .with_max_tokens(64)
            .with_temperature(0.2);
        assert_eq!(req.prompt, "hi");
        assert_eq!(req.max_tokens, Some(64));
        assert_eq!(req.temperature, Some(0.2));
    }

    #[test]
    fn options_default_to_unset() {
        let req = CompletionRequest::new(String::from("plan"));
        assert!(req.max_tokens.is_none());
        assert!(req.temperature.is_none());
    }
}
