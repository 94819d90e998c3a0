//! Embedding providers for indexing and retrieval.
//!
//! Async is required because real providers (Ollama, OpenAI) perform HTTP
//! requests.

use async_trait::async_trait;

use crate::errors::ContextError;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in your own embedding backend.
#[async_trait]
pub trait EmbeddingsProvider: Send + Sync {
    /// Computes one embedding vector for the input text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ContextError>;
}

pub mod llm_embedder;
pub mod noop_embedder;
