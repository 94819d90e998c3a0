use async_trait::async_trait;

use crate::embed::EmbeddingsProvider;
use crate::errors::ContextError;

/// Embedder for deployments without an embedding backend. Always fails, so
/// the index layer degrades to empty results instead of storing garbage.
#[derive(Clone)]
pub struct NoopEmbedder;

#[async_trait]
impl EmbeddingsProvider for NoopEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, ContextError> {
        Err(ContextError::IndexUnavailable)
    }
}
