//! TestRAG CLI - Interactive RAG shell
//!
//! Usage:
//!   testrag [--config <file>] [--model <name>] [--load <file>]
//!
//! Then at the prompt:
//!   add <text>
//!   query <question>
//!   list | docs | clear | help | exit

mod repl;

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use testrag_core::{AppConfig, LlmProvider, LoggingConfig};
use testrag_rag::{create_llm_client, RagService};
use testrag_vector::create_embedding_client;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "testrag")]
#[command(about = "Retrieval-augmented question answering over an in-memory knowledge base")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LLM provider (ollama, openai)
    #[arg(long)]
    provider: Option<LlmProvider>,

    /// Ollama server URL
    #[arg(long)]
    ollama_url: Option<String>,

    /// Model used for generation
    #[arg(short, long)]
    model: Option<String>,

    /// Model used for embeddings
    #[arg(long)]
    embedding_model: Option<String>,

    /// Number of documents retrieved per query
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Ingest every non-empty line of this file before starting the shell
    #[arg(long)]
    load: Option<PathBuf>,

    /// Do not check that the provider is reachable on startup
    #[arg(long)]
    skip_health_check: bool,
}

impl Cli {
    /// Load the configuration file (if any), then env, then command-line flags
    fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let base = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        let mut config = base.with_env_override()?;

        if let Some(provider) = self.provider {
            config.llm.provider = provider;
        }
        if let Some(url) = &self.ollama_url {
            config.llm.ollama_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(model) = &self.embedding_model {
            config.llm.embedding_model = model.clone();
        }
        if let Some(top_k) = self.top_k {
            config.rag.top_k = top_k;
        }

        Ok(config)
    }
}

fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Add each non-empty line of `path` as a document
async fn ingest_file(rag: &RagService, path: &Path) -> anyhow::Result<usize> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut added = 0;
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        rag.add_document(line).await?;
        added += 1;
    }

    tracing::info!(added, path = %path.display(), "Ingested documents from file");
    Ok(added)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_tracing(&config.logging);

    println!("=================================");
    println!("  TestRAG - RAG with {}", config.llm.provider);
    println!("=================================\n");

    let embedder = create_embedding_client(&config.llm)?;
    let llm_client = create_llm_client(&config.llm)?;

    if !cli.skip_health_check {
        if let Err(e) = llm_client.health_check().await {
            eprintln!("Error: {e}");
            if config.llm.provider == LlmProvider::Ollama {
                eprintln!("Please ensure Ollama is running: ollama serve");
            }
            std::process::exit(1);
        }
        println!("Connected to {} successfully!", config.llm.provider);
    }
    println!("Using model: {}", config.llm.model);

    let rag = RagService::new(embedder, llm_client, config.rag.clone());

    if let Some(path) = &cli.load {
        let added = ingest_file(&rag, path).await?;
        println!("Loaded {added} documents from {}", path.display());
    }

    repl::run(&rag).await
}
