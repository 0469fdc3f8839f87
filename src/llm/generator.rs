//! Text generation capability used by the dialogue driver.
//!
//! The driver only needs "prompt in, text out". `TextGenerator` is that seam;
//! `LlmTextGenerator` implements it on top of any `LlmProvider`, and tests
//! substitute their own implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::LlmError;
use crate::llm::costs;
use crate::llm::provider::{CompletionRequest, FinishReason, LlmProvider};

/// Turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`. The result is trimmed and never empty.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Sampling settings applied to every generation.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

/// `TextGenerator` backed by an `LlmProvider`.
pub struct LlmTextGenerator {
    llm: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl LlmTextGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(
            model = self.llm.model_name(),
            prompt_len = prompt.len(),
            "Requesting generation"
        );

        let request = CompletionRequest::new(prompt)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        let response = self.llm.complete(request).await?;

        let cost = costs::estimate(
            self.llm.cost_per_token(),
            response.input_tokens,
            response.output_tokens,
        );
        info!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            cost_usd = %cost,
            "Generation complete"
        );
        if response.finish_reason == FinishReason::Length {
            debug!("Generation stopped at the max token limit");
        }

        let text = response.content.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.llm.model_name().to_string(),
                reason: format!("empty completion (finish reason {:?})", response.finish_reason),
            });
        }
        Ok(text.to_string())
    }
}
