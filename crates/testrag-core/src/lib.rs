//! TestRAG Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout TestRAG:
//! - Documents and their embeddings
//! - Per-search scored results
//! - Common error types
//! - Collaborator traits for embedding and generation providers
//! - Prompt rendering
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;
pub mod prompt;

pub use config::{AppConfig, ConfigError, LlmConfig, LlmProvider, LoggingConfig, RagConfig};
pub use prompt::render_prompt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for TestRAG operations
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;

// ============================================================================
// Document Models
// ============================================================================

/// Embedding vector produced by the provider.
///
/// The dimensionality is not fixed here; it is whatever the provider returns.
pub type Embedding = Vec<f64>;

/// Number of characters shown by the `Display` impl of [`Document`]
const PREVIEW_CHARS: usize = 50;

/// A stored text document together with its embedding
///
/// Documents are immutable once created. Adding the same text twice
/// produces two documents with distinct ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: Uuid,
    content: String,
    embedding: Embedding,
    created_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document with a fresh id
    ///
    /// Fails with [`RagError::ValidationError`] when the content is blank
    /// or the embedding is empty.
    pub fn new(content: impl Into<String>, embedding: Embedding) -> Result<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(RagError::ValidationError(
                "Document content must not be empty".to_string(),
            ));
        }
        if embedding.is_empty() {
            return Err(RagError::ValidationError(
                "Document embedding must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            content,
            embedding,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn embedding(&self) -> &[f64] {
        &self.embedding
    }

    /// Length of the embedding vector
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// First `max_chars` characters of the content, with `...` appended
    /// when the content was cut
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Document{{id='{}', content='{}'}}",
            self.id,
            self.preview(PREVIEW_CHARS)
        )
    }
}

/// A document paired with its similarity to one particular query
///
/// Scores are never written back to the stored document, so two searches
/// cannot observe each other's results.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// The matched document (shared with the store)
    pub document: Arc<Document>,

    /// Cosine similarity to the query
    pub score: f64,
}

impl ScoredDocument {
    pub fn new(document: Arc<Document>, score: f64) -> Self {
        Self { document, score }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for embedding providers
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate an embedding for a single text
    ///
    /// Implementations must fail rather than return an empty vector.
    async fn embed(&self, text: &str) -> Result<Embedding>;
}

/// Trait for LLM clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response for a raw prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Answer a question grounded on retrieved context
    async fn generate_with_context(&self, question: &str, context: &str) -> Result<String> {
        self.generate(&render_prompt(question, context)).await
    }

    /// Check that the provider is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
