//! Google Gemini provider over the `generateContent` REST endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::llm::costs;
use crate::llm::provider::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};

const PROVIDER: &str = "gemini";

/// Default REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider. The API key is sent in the `x-goog-api-key` header so it
/// never appears in request URLs.
pub struct GeminiProvider {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Translate a provider-agnostic request into Gemini's wire format.
    fn build_request(request: &CompletionRequest) -> GeminiRequest {
        let contents = vec![GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: request.prompt.clone(),
            }],
        }];

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            generation_config,
        }
    }

    fn parse_response(body: GeminiResponse) -> Result<CompletionResponse, LlmError> {
        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "response contained no candidates".to_string(),
            })?;

        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        let usage = body.usage_metadata.unwrap_or_default();
        Ok(CompletionResponse {
            content,
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            finish_reason,
            response_id: body.response_id,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        costs::model_cost(&self.model)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = Self::build_request(&request);
        debug!(
            model = %self.model,
            prompt_len = request.prompt.len(),
            "Sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(std::time::Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthFailed {
                    provider: PROVIDER.to_string(),
                },
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
                    provider: PROVIDER.to_string(),
                    retry_after,
                },
                _ => LlmError::RequestFailed {
                    provider: PROVIDER.to_string(),
                    reason: format!("HTTP {}: {}", status, text),
                },
            });
        }

        let parsed: GeminiResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    provider: PROVIDER.to_string(),
                    reason: e.to_string(),
                })?;

        Self::parse_response(parsed)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<UsageMetadata>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_sends_prompt_as_user_turn() {
        let request = CompletionRequest::new("hello")
            .with_temperature(0.5)
            .with_max_tokens(100);

        let body = GeminiProvider::build_request(&request);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn build_request_omits_empty_config() {
        let request = CompletionRequest::new("hello");
        let json = serde_json::to_value(GeminiProvider::build_request(&request)).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn parse_response_joins_parts_and_reads_usage() {
        let body: GeminiResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "You are "}, {"text": "doing great."}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 42, "candidatesTokenCount": 7, "totalTokenCount": 49},
                "responseId": "abc"
            }"#,
        )
        .unwrap();

        let response = GeminiProvider::parse_response(body).unwrap();
        assert_eq!(response.content, "You are doing great.");
        assert_eq!(response.input_tokens, 42);
        assert_eq!(response.output_tokens, 7);
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.response_id.as_deref(), Some("abc"));
    }

    #[test]
    fn parse_response_without_candidates_is_invalid() {
        let body: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = GeminiProvider::parse_response(body).unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }

    #[test]
    fn parse_response_maps_safety_block() {
        let body: GeminiResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        let response = GeminiProvider::parse_response(body).unwrap();
        assert!(response.content.is_empty());
        assert_eq!(response.finish_reason, FinishReason::ContentFilter);
    }

    #[test]
    fn endpoint_includes_model() {
        let provider = GeminiProvider::new(SecretString::from("k"), "gemini-1.5-flash")
            .with_base_url("http://localhost:9999/");
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9999/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(provider.model_name(), "gemini-1.5-flash");
    }
}
