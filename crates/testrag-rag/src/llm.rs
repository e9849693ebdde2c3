//! LLM Client implementations
//!
//! Provides abstraction for Ollama and OpenAI-compatible generation APIs.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use testrag_core::{LlmClient, LlmConfig, LlmProvider, RagError, Result};
use testrag_vector::http::{build_http_client, map_request_error};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ============================================================================
// Ollama Client
// ============================================================================

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(client: Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Ok(Self::new(
            build_http_client(config)?,
            config.ollama_url.clone(),
            config.model.clone(),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                map_request_error(e, "Ollama request failed", RagError::GenerationFailure)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Ollama generate API returned an error");
            return Err(RagError::GenerationFailure(format!(
                "Ollama API error {status}: {error_text}"
            )));
        }

        let result: OllamaResponse = response.json().await.map_err(|e| {
            map_request_error(e, "Failed to read Ollama response", RagError::GenerationFailure)
        })?;

        non_empty(result.response)
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| unavailable(&self.base_url, e))?;

        if !response.status().is_success() {
            return Err(RagError::CollaboratorUnavailable(format!(
                "Ollama at {} answered {}",
                self.base_url,
                response.status()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// OpenAI Client
// ============================================================================

/// OpenAI (or compatible) chat completions client
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| RagError::ConfigError("OpenAI API key required".to_string()))?;

        let client = Self::new(build_http_client(config)?, api_key.clone(), config.model.clone());

        Ok(match &config.openai_base_url {
            Some(url) => client.with_base_url(url.clone()),
            None => client,
        })
    }

    /// Set custom base URL (for compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                map_request_error(e, "OpenAI request failed", RagError::GenerationFailure)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "OpenAI chat API returned an error");
            return Err(RagError::GenerationFailure(format!(
                "OpenAI error {status}: {error_text}"
            )));
        }

        let result: OpenAiResponse = response.json().await.map_err(|e| {
            map_request_error(e, "Failed to read OpenAI response", RagError::GenerationFailure)
        })?;

        first_choice(result)
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| unavailable(&self.base_url, e))?;

        if !response.status().is_success() {
            return Err(RagError::CollaboratorUnavailable(format!(
                "OpenAI API at {} answered {}",
                self.base_url,
                response.status()
            )));
        }

        Ok(())
    }
}

fn first_choice(response: OpenAiResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| RagError::GenerationFailure("No response generated".to_string()))?;

    non_empty(content)
}

fn non_empty(text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(RagError::GenerationFailure(
            "Provider returned an empty response".to_string(),
        ));
    }
    Ok(text)
}

fn unavailable(base_url: &str, error: reqwest::Error) -> RagError {
    RagError::CollaboratorUnavailable(format!("Cannot reach {base_url}: {error}"))
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an LLM client from config
pub fn create_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider {
        LlmProvider::Ollama => Ok(Arc::new(OllamaClient::from_config(config)?)),
        LlmProvider::OpenAI => Ok(Arc::new(OpenAiClient::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::from_config(&LlmConfig::default()).unwrap();
        assert_eq!(client.model(), "llama2");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_openai_client_requires_key() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            ..Default::default()
        };
        assert!(matches!(
            create_llm_client(&config),
            Err(RagError::ConfigError(_))
        ));
    }

    #[test]
    fn test_openai_client_creation() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            openai_api_key: Some("test-key".to_string()),
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };

        let client = OpenAiClient::from_config(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.base_url, OPENAI_BASE_URL);
    }

    #[test]
    fn test_ollama_request_disables_streaming() {
        let request = OllamaRequest {
            model: "llama2",
            prompt: "hi",
            stream: false,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"model": "llama2", "prompt": "hi", "stream": false})
        );
    }

    #[test]
    fn test_first_choice_parsing() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Paris"},"finish_reason":"stop"}]}"#;
        let parsed: OpenAiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(first_choice(parsed).unwrap(), "Paris");
    }

    #[test]
    fn test_empty_generation_is_failure() {
        let parsed: OllamaResponse = serde_json::from_str(r#"{"response":"  ","done":true}"#).unwrap();
        assert!(matches!(
            non_empty(parsed.response),
            Err(RagError::GenerationFailure(_))
        ));

        let parsed: OpenAiResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            first_choice(parsed),
            Err(RagError::GenerationFailure(_))
        ));
    }
}
