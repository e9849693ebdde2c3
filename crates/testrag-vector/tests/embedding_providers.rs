//! Embedding Provider Tests
//!
//! Drive the HTTP embedding clients against a local mock server and check
//! how each provider failure maps onto `RagError`.
//!
//! Author: hephaex@gmail.com

use mockito::Server;
use serde_json::json;
use std::time::Duration;
use testrag_core::{EmbeddingClient, LlmConfig, LlmProvider, RagError};
use testrag_vector::{OllamaEmbedding, OpenAiEmbedding};
use tokio::net::TcpListener;

/// Nothing listens on port 1
const CLOSED_PORT_URL: &str = "http://127.0.0.1:1";

fn ollama_config(url: &str) -> LlmConfig {
    LlmConfig {
        ollama_url: url.to_string(),
        embedding_model: "nomic-embed-text".to_string(),
        ..Default::default()
    }
}

fn openai_config(url: &str) -> LlmConfig {
    LlmConfig {
        provider: LlmProvider::OpenAI,
        openai_api_key: Some("test-key".to_string()),
        openai_base_url: Some(url.to_string()),
        embedding_model: "text-embedding-3-small".to_string(),
        ..Default::default()
    }
}

// =============================================================================
// Ollama
// =============================================================================

#[tokio::test]
async fn test_ollama_embed_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/embeddings")
        .match_body(mockito::Matcher::PartialJson(json!({
            "model": "nomic-embed-text",
            "prompt": "hello"
        })))
        .with_status(200)
        .with_body(json!({"embedding": [0.25, -0.5, 1.0]}).to_string())
        .create_async()
        .await;

    let client = OllamaEmbedding::from_config(&ollama_config(&server.url())).unwrap();
    let embedding = client.embed("hello").await.unwrap();

    assert_eq!(embedding, vec![0.25, -0.5, 1.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ollama_embed_server_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/embeddings")
        .with_status(500)
        .with_body("model not loaded")
        .create_async()
        .await;

    let client = OllamaEmbedding::from_config(&ollama_config(&server.url())).unwrap();
    let err = client.embed("hello").await.unwrap_err();

    match err {
        RagError::EmbeddingFailure(message) => assert!(message.contains("model not loaded")),
        other => panic!("expected EmbeddingFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ollama_embed_missing_or_empty_embedding() {
    for body in ["{}", r#"{"embedding":[]}"#] {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/embeddings")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = OllamaEmbedding::from_config(&ollama_config(&server.url())).unwrap();
        let err = client.embed("hello").await.unwrap_err();

        assert!(
            matches!(err, RagError::EmbeddingFailure(_)),
            "body {body} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn test_ollama_embed_malformed_json() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/embeddings")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let client = OllamaEmbedding::from_config(&ollama_config(&server.url())).unwrap();
    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingFailure(_)));
}

#[tokio::test]
async fn test_ollama_embed_closed_port_is_unavailable() {
    let client = OllamaEmbedding::from_config(&ollama_config(CLOSED_PORT_URL)).unwrap();
    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, RagError::CollaboratorUnavailable(_)));
}

#[tokio::test]
async fn test_ollama_embed_timeout_is_unavailable() {
    // Accepts connections but never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = LlmConfig {
        timeout_secs: 1,
        ..ollama_config(&format!("http://{addr}"))
    };
    let client = OllamaEmbedding::from_config(&config).unwrap();

    let err = tokio::time::timeout(Duration::from_secs(10), client.embed("hello"))
        .await
        .expect("client timeout should fire first")
        .unwrap_err();

    assert!(matches!(err, RagError::CollaboratorUnavailable(_)));
}

// =============================================================================
// OpenAI
// =============================================================================

#[tokio::test]
async fn test_openai_embed_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_body(
            json!({
                "object": "list",
                "data": [{"object": "embedding", "embedding": [1.0, 0.0], "index": 0}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = OpenAiEmbedding::from_config(&openai_config(&server.url())).unwrap();
    let embedding = client.embed("hello").await.unwrap();

    assert_eq!(embedding, vec![1.0, 0.0]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_embed_server_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/embeddings")
        .with_status(500)
        .with_body(json!({"error": {"message": "overloaded"}}).to_string())
        .create_async()
        .await;

    let client = OpenAiEmbedding::from_config(&openai_config(&server.url())).unwrap();
    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, RagError::EmbeddingFailure(_)));
}

#[tokio::test]
async fn test_openai_embed_without_data() {
    for body in ["{}", r#"{"data":[]}"#, r#"{"data":[{"embedding":[],"index":0}]}"#] {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let client = OpenAiEmbedding::from_config(&openai_config(&server.url())).unwrap();
        let err = client.embed("hello").await.unwrap_err();

        assert!(
            matches!(err, RagError::EmbeddingFailure(_)),
            "body {body} gave {err:?}"
        );
    }
}

#[tokio::test]
async fn test_openai_embed_closed_port_is_unavailable() {
    let client = OpenAiEmbedding::from_config(&openai_config(CLOSED_PORT_URL)).unwrap();
    let err = client.embed("hello").await.unwrap_err();

    assert!(matches!(err, RagError::CollaboratorUnavailable(_)));
}
