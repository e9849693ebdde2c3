//! Embedding clients for generating vector representations
//!
//! Supports Ollama and OpenAI-compatible embedding APIs.
//!
//! Author: hephaex@gmail.com

use crate::http::{build_http_client, map_request_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use testrag_core::{Embedding, EmbeddingClient, LlmConfig, LlmProvider, RagError, Result};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ============================================================================
// Ollama Embedding Client
// ============================================================================

/// Ollama embedding API client
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    #[serde(default)]
    embedding: Embedding,
}

impl OllamaEmbedding {
    /// Create a new Ollama embedding client
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
            config.embedding_model.clone(),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                map_request_error(e, "Ollama embedding request failed", RagError::EmbeddingFailure)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Ollama embedding API returned an error");
            return Err(RagError::EmbeddingFailure(format!(
                "Ollama embedding API error {status}: {error_text}"
            )));
        }

        let result: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            map_request_error(e, "Failed to read embedding response", RagError::EmbeddingFailure)
        })?;

        non_empty(result.embedding)
    }
}

// ============================================================================
// OpenAI Embedding Client
// ============================================================================

/// OpenAI (or compatible) embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Embedding,
    index: usize,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Set custom base URL (for compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| RagError::ConfigError("OpenAI API key required".to_string()))?;

        let client = Self::new(
            build_http_client(config)?,
            api_key.clone(),
            config.embedding_model.clone(),
        );

        Ok(match &config.openai_base_url {
            Some(url) => client.with_base_url(url.clone()),
            None => client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let request = OpenAiEmbeddingRequest {
            input: vec![text],
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                map_request_error(e, "OpenAI embedding request failed", RagError::EmbeddingFailure)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "OpenAI embedding API returned an error");
            return Err(RagError::EmbeddingFailure(format!(
                "OpenAI embedding error {status}: {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            map_request_error(e, "Failed to read embedding response", RagError::EmbeddingFailure)
        })?;

        first_embedding(result)
    }
}

/// Pick the embedding for input index 0
fn first_embedding(response: OpenAiEmbeddingResponse) -> Result<Embedding> {
    let embedding = response
        .data
        .into_iter()
        .min_by_key(|d| d.index)
        .map(|d| d.embedding)
        .ok_or_else(|| RagError::EmbeddingFailure("No embedding returned".to_string()))?;

    non_empty(embedding)
}

fn non_empty(embedding: Embedding) -> Result<Embedding> {
    if embedding.is_empty() {
        return Err(RagError::EmbeddingFailure(
            "Provider returned an empty embedding".to_string(),
        ));
    }
    Ok(embedding)
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config
pub fn create_embedding_client(config: &LlmConfig) -> Result<Arc<dyn EmbeddingClient>> {
    match config.provider {
        LlmProvider::Ollama => Ok(Arc::new(OllamaEmbedding::from_config(config)?)),
        LlmProvider::OpenAI => Ok(Arc::new(OpenAiEmbedding::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_from_config() {
        let config = LlmConfig {
            ollama_url: "http://localhost:11434/".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            ..Default::default()
        };

        let client = OllamaEmbedding::from_config(&config).unwrap();
        assert_eq!(client.model(), "nomic-embed-text");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_openai_requires_api_key() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            ..Default::default()
        };

        assert!(matches!(
            OpenAiEmbedding::from_config(&config),
            Err(RagError::ConfigError(_))
        ));
        assert!(create_embedding_client(&config).is_err());
    }

    #[test]
    fn test_openai_custom_base_url() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAI,
            openai_api_key: Some("test-key".to_string()),
            openai_base_url: Some("http://localhost:8000/v1/".to_string()),
            ..Default::default()
        };

        let client = OpenAiEmbedding::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_ollama_response_without_embedding_is_rejected() {
        let parsed: OllamaEmbeddingResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            non_empty(parsed.embedding),
            Err(RagError::EmbeddingFailure(_))
        ));
    }

    #[test]
    fn test_openai_response_parsing() {
        let body = r#"{"object":"list","data":[{"object":"embedding","embedding":[0.5,-0.25],"index":0}]}"#;
        let parsed: OpenAiEmbeddingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(first_embedding(parsed).unwrap(), vec![0.5, -0.25]);
    }

    #[test]
    fn test_first_embedding_orders_by_index() {
        let response = OpenAiEmbeddingResponse {
            data: vec![
                EmbeddingData {
                    embedding: vec![0.0, 1.0],
                    index: 1,
                },
                EmbeddingData {
                    embedding: vec![1.0, 0.0],
                    index: 0,
                },
            ],
        };

        assert_eq!(first_embedding(response).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_first_embedding_empty_data() {
        let response = OpenAiEmbeddingResponse { data: Vec::new() };
        assert!(matches!(
            first_embedding(response),
            Err(RagError::EmbeddingFailure(_))
        ));
    }
}
