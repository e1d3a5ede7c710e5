//! Completion client for the study assistant
//!
//! Provides a `CompletionBackend` trait with a Gemini `generateContent`
//! implementation. Requests are sent once; there is no retry on failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;

/// Answer text used when the model returns no text at all.
pub const EMPTY_ANSWER_FALLBACK: &str =
    "I'm sorry, I couldn't generate a response. Please try again.";

// ============================================================================
// CompletionBackend trait
// ============================================================================

/// Abstraction over text completion providers.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for a fully assembled prompt.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Run a completion and turn every failure into user-visible answer text.
pub async fn answer_or_apology(backend: &dyn CompletionBackend, prompt: &str) -> String {
    match backend.complete(prompt).await {
        Ok(text) => text,
        Err(LlmError::EmptyResponse) => {
            tracing::warn!(model = backend.model(), "Completion returned no text");
            EMPTY_ANSWER_FALLBACK.to_string()
        }
        Err(e) => {
            tracing::error!(model = backend.model(), error = %e, "Completion request failed");
            format!("Error getting response from AI: {}", e)
        }
    }
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Missing API key")]
    MissingApiKey,
}

// ============================================================================
// Gemini API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: u16,
    message: String,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

// ============================================================================
// GeminiClient
// ============================================================================

/// Gemini completion client: calls the `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: LlmConfig,
}

impl GeminiClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client with a custom base URL (for testing / proxies)
    pub fn with_base_url(mut config: LlmConfig, base_url: impl Into<String>) -> Result<Self, LlmError> {
        config.base_url = base_url.into();
        Self::new(config)
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let request = GenerateRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let error_detail = serde_json::from_str::<GeminiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error);

            let (code, message) = error_detail
                .map(|e| (e.code, e.message))
                .unwrap_or((status.as_u16(), error_body));

            tracing::error!(code = code, message = %message, "Gemini API error");

            return Err(LlmError::Api { code, message });
        }

        let body: GenerateResponse = response.json().await?;
        body.text().ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        tracing::debug!(model = %self.config.model, prompt_chars = prompt.len(), "Requesting completion");
        self.generate(prompt).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> LlmConfig {
        LlmConfig::with_api_key("test-api-key")
    }

    fn mock_completion(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn test_complete_sends_generation_config_and_returns_text() {
        let mock_server = MockServer::start().await;
        let client = GeminiClient::with_base_url(test_config(), mock_server.uri())
            .expect("Failed to create client");

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-api-key"))
            .and(body_json(serde_json::json!({
                "contents": [{ "parts": [{ "text": "Student: hi\nAssistant:" }] }],
                "generationConfig": { "temperature": 0.7, "maxOutputTokens": 1000 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_completion("Hello!")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let answer = client.complete("Student: hi\nAssistant:").await;
        assert_eq!(answer.unwrap(), "Hello!");
    }

    #[tokio::test]
    async fn test_complete_joins_multiple_parts() {
        let mock_server = MockServer::start().await;
        let client = GeminiClient::with_base_url(test_config(), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "Part one. " }, { "text": "Part two." }] } }]
            })))
            .mount(&mock_server)
            .await;

        assert_eq!(client.complete("q").await.unwrap(), "Part one. Part two.");
    }

    #[tokio::test]
    async fn test_api_error_is_not_retried() {
        let mock_server = MockServer::start().await;
        let client = GeminiClient::with_base_url(test_config(), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "code": 429, "message": "Rate limit exceeded" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        match client.complete("q").await {
            Err(LlmError::Api { code, message }) => {
                assert_eq!(code, 429);
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body_keeps_status() {
        let mock_server = MockServer::start().await;
        let client = GeminiClient::with_base_url(test_config(), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        match client.complete("q").await {
            Err(LlmError::Api { code, message }) => {
                assert_eq!(code, 503);
                assert_eq!(message, "upstream down");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_is_empty_response() {
        let mock_server = MockServer::start().await;
        let client = GeminiClient::with_base_url(test_config(), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "candidates": [] })))
            .mount(&mock_server)
            .await;

        assert!(matches!(client.complete("q").await, Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_missing_api_key() {
        let result = GeminiClient::new(LlmConfig::with_api_key(""));
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_answer_or_apology_substitutes_error_text() {
        let mock_server = MockServer::start().await;
        let client = GeminiClient::with_base_url(test_config(), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": { "code": 500, "message": "boom" }
            })))
            .mount(&mock_server)
            .await;

        let answer = answer_or_apology(&client, "q").await;
        assert_eq!(answer, "Error getting response from AI: API error (500): boom");
    }

    #[tokio::test]
    async fn test_answer_or_apology_on_empty_text() {
        let mock_server = MockServer::start().await;
        let client = GeminiClient::with_base_url(test_config(), mock_server.uri()).unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_completion("   ")))
            .mount(&mock_server)
            .await;

        assert_eq!(answer_or_apology(&client, "q").await, EMPTY_ANSWER_FALLBACK);
    }
}
