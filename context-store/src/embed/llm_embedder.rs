//! Embedding provider backed by the shared LLM service.

use std::sync::Arc;

use ai_llm_service::EmbeddingsBackend;
use async_trait::async_trait;

use crate::embed::EmbeddingsProvider;
use crate::errors::ContextError;

/// Adapts an `ai-llm-service` embeddings backend to [`EmbeddingsProvider`],
/// enforcing an expected dimensionality when one is configured.
pub struct LlmEmbedder {
    backend: Arc<dyn EmbeddingsBackend>,
    expected_dim: Option<usize>,
}

impl LlmEmbedder {
    pub fn new(backend: Arc<dyn EmbeddingsBackend>, expected_dim: Option<usize>) -> Self {
        Self {
            backend,
            expected_dim,
        }
    }
}

#[async_trait]
impl EmbeddingsProvider for LlmEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ContextError> {
        let v = self
            .backend
            .embeddings(text)
            .await
            .map_err(|e| ContextError::Embedding(e.to_string()))?;

        if let Some(want) = self.expected_dim {
            if v.len() != want {
                return Err(ContextError::VectorSizeMismatch { got: v.len(), want });
            }
        }
        Ok(v)
    }
}
