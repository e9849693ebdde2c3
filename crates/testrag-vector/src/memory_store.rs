//! In-memory vector store
//!
//! Holds documents in insertion order and answers exact top-k queries by
//! scoring every stored embedding against the query. There is no index and
//! no capacity bound: the store grows until it is cleared or the process
//! exits.

use crate::similarity::cosine_similarity;
use std::sync::Arc;
use testrag_core::{Document, Result, ScoredDocument};

/// In-memory document store ranked by cosine similarity
#[derive(Debug, Default, Clone)]
pub struct InMemoryVectorStore {
    documents: Vec<Arc<Document>>,
}

impl InMemoryVectorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document
    ///
    /// The embedding length is not checked here; a mismatch surfaces when
    /// the document is compared during [`search`](Self::search).
    pub fn add(&mut self, document: Document) {
        tracing::debug!(
            document_id = %document.id(),
            dimension = document.dimension(),
            "Adding document to vector store"
        );
        self.documents.push(Arc::new(document));
    }

    /// Remove every document
    pub fn clear(&mut self) {
        tracing::debug!(removed = self.documents.len(), "Clearing vector store");
        self.documents.clear();
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Embedding length of the first stored document
    pub fn dimension(&self) -> Option<usize> {
        self.documents.first().map(|d| d.dimension())
    }

    /// Rank stored documents by similarity to `query` and return the best `top_k`
    ///
    /// Results are sorted by descending score; equal scores keep insertion
    /// order. Fewer than `top_k` documents yields all of them.
    ///
    /// # Errors
    /// [`RagError::DimensionMismatch`](testrag_core::RagError::DimensionMismatch)
    /// if any stored embedding differs in length from `query`,
    /// [`RagError::ValidationError`](testrag_core::RagError::ValidationError)
    /// if `query` or a stored embedding holds NaN or infinity.
    pub fn search(&self, query: &[f64], top_k: usize) -> Result<Vec<ScoredDocument>> {
        if self.documents.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored = self
            .documents
            .iter()
            .map(|doc| -> Result<ScoredDocument> {
                let score = cosine_similarity(query, doc.embedding())?;
                Ok(ScoredDocument::new(Arc::clone(doc), score))
            })
            .collect::<Result<Vec<_>>>()?;

        // Stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        tracing::debug!(
            candidates = self.documents.len(),
            returned = scored.len(),
            "Vector search completed"
        );

        Ok(scored)
    }

    /// Snapshot of every stored document in insertion order
    pub fn all(&self) -> Vec<Arc<Document>> {
        self.documents.clone()
    }
}
