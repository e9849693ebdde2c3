//! TestRAG Vector - Vector storage and similarity search
//!
//! Provides an exact, in-memory vector store ranked by cosine similarity,
//! plus HTTP clients (Ollama, OpenAI) for computing document embeddings.

pub mod embedding;
pub mod http;
pub mod memory_store;
pub mod similarity;

pub use embedding::{create_embedding_client, OllamaEmbedding, OpenAiEmbedding};
pub use memory_store::InMemoryVectorStore;
pub use similarity::cosine_similarity;
