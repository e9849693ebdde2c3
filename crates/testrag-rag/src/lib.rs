//! TestRAG RAG - Retrieval-Augmented Generation Orchestrator
//!
//! This crate ties together:
//! - an embedding provider (documents and questions → vectors)
//! - the in-memory vector store (exact cosine ranking)
//! - an LLM provider (prompt → answer)
//!
//! A query only retrieves context when the knowledge base has documents;
//! otherwise the question goes to the LLM unchanged.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use std::time::Instant;
use testrag_core::{
    Document, EmbeddingClient, LlmClient, RagConfig, RagError, Result, ScoredDocument,
};
use testrag_vector::InMemoryVectorStore;
use tokio::sync::RwLock;
use uuid::Uuid;

pub mod llm;

pub use llm::{create_llm_client, OllamaClient, OpenAiClient};

/// Separator placed between retrieved documents in the context string
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

// ============================================================================
// Responses
// ============================================================================

/// How an answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    /// The question was sent to the LLM as-is
    Direct,
    /// Retrieved documents were supplied as context
    WithContext,
}

/// RAG answer together with the documents it was grounded on
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// Generated answer
    pub answer: String,

    /// Whether retrieved context was used
    pub mode: AnswerMode,

    /// Retrieved documents in rank order (empty for direct answers)
    pub sources: Vec<ScoredDocument>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

// ============================================================================
// RAG Service
// ============================================================================

/// RAG orchestrator over an in-memory knowledge base
pub struct RagService {
    /// Embedding provider
    embedder: Arc<dyn EmbeddingClient>,

    /// LLM client
    llm_client: Arc<dyn LlmClient>,

    /// Knowledge base
    store: RwLock<InMemoryVectorStore>,

    /// Configuration
    config: RagConfig,
}

impl RagService {
    /// Create a service with an empty knowledge base
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        llm_client: Arc<dyn LlmClient>,
        config: RagConfig,
    ) -> Self {
        Self {
            embedder,
            llm_client,
            store: RwLock::new(InMemoryVectorStore::new()),
            config,
        }
    }

    /// Start from an existing store
    pub fn with_store(mut self, store: InMemoryVectorStore) -> Self {
        self.store = RwLock::new(store);
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Embed `content` and add it to the knowledge base
    ///
    /// Nothing is stored if validation or the embedding call fails.
    pub async fn add_document(&self, content: &str) -> Result<Uuid> {
        if content.trim().is_empty() {
            return Err(RagError::ValidationError(
                "Document content must not be empty".to_string(),
            ));
        }

        let embedding = self.embedder.embed(content).await?;
        let document = Document::new(content, embedding)?;
        let id = document.id();

        self.store.write().await.add(document);
        tracing::info!(document_id = %id, "Document added to knowledge base");

        Ok(id)
    }

    /// Answer a question
    pub async fn query(&self, question: &str) -> Result<String> {
        Ok(self.ask(question).await?.answer)
    }

    /// Answer a question, returning the retrieved sources as well
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        let start_time = Instant::now();

        if self.document_count().await == 0 {
            tracing::debug!("Knowledge base is empty, generating without retrieval");
            return self.answer_directly(question, start_time).await;
        }

        let query_embedding = self.embedder.embed(question).await?;
        let sources = self
            .store
            .read()
            .await
            .search(&query_embedding, self.config.top_k)?;
        tracing::debug!(retrieved = sources.len(), "Retrieved context documents");

        if sources.is_empty() {
            return self.answer_directly(question, start_time).await;
        }

        let context = build_context(&sources);
        tracing::info!("Calling LLM with context length: {} chars", context.len());
        let answer = self
            .llm_client
            .generate_with_context(question, &context)
            .await?;
        tracing::info!("LLM response received: {} chars", answer.len());

        Ok(RagResponse {
            answer,
            mode: AnswerMode::WithContext,
            sources,
            processing_time_ms: elapsed_ms(start_time),
        })
    }

    async fn answer_directly(&self, question: &str, start_time: Instant) -> Result<RagResponse> {
        let answer = self.llm_client.generate(question).await?;
        tracing::info!("LLM response received: {} chars", answer.len());

        Ok(RagResponse {
            answer,
            mode: AnswerMode::Direct,
            sources: Vec::new(),
            processing_time_ms: elapsed_ms(start_time),
        })
    }

    /// Number of documents in the knowledge base
    pub async fn document_count(&self) -> usize {
        self.store.read().await.len()
    }

    /// Remove every document from the knowledge base
    pub async fn clear_documents(&self) {
        self.store.write().await.clear();
        tracing::info!("Knowledge base cleared");
    }

    /// Snapshot of every document in insertion order
    pub async fn all_documents(&self) -> Vec<Arc<Document>> {
        self.store.read().await.all()
    }
}

/// Render retrieved documents into the context block of the prompt
pub fn build_context(results: &[ScoredDocument]) -> String {
    results
        .iter()
        .map(|r| format!("[Similarity: {:.4}]\n{}", r.score, r.document.content()))
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

fn elapsed_ms(start_time: Instant) -> u64 {
    u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
