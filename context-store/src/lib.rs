//! Vector-backed knowledge index for document retrieval.
//!
//! This crate provides a clean API to:
//! - Index uploaded documents into per-category Qdrant collections
//! - Retrieve top-K snippets for a textual query and format them into a
//!   context block for generation
//!
//! The design is flat (no deep nesting) and splits responsibilities into
//! focused modules. Application code talks to [`DocumentIndex`]; the
//! [`NoopIndex`] implementation covers deployments without a vector store.

mod config;
mod embed;
mod errors;
mod extract;
mod ingest;
mod qdrant_facade;
mod retrieve;

pub use config::{ContextStoreConfig, DistanceKind};
pub use embed::{EmbeddingsProvider, llm_embedder::LlmEmbedder, noop_embedder::NoopEmbedder};
pub use errors::ContextError;
pub use extract::extract_text;
pub use ingest::IndexDocument;
pub use retrieve::{DEFAULT_TOP_K, DOC_CONTENT_MAX_CHARS, Snippet, build_context_block};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

/// Capability interface for the document index.
///
/// All operations take the target collection name: each forum category is
/// indexed separately and queries never cross category boundaries.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Indexes one document into the collection.
    ///
    /// # Errors
    /// Returns [`ContextError`] on embedding or storage failures.
    async fn register(&self, collection: &str, doc: &IndexDocument) -> Result<(), ContextError>;

    /// Returns the top-K snippets for the query text.
    ///
    /// # Errors
    /// Returns [`ContextError`] on embedding or search failures.
    async fn query(
        &self,
        collection: &str,
        text: &str,
        top_k: u64,
    ) -> Result<Vec<Snippet>, ContextError>;

    /// Removes every indexed point belonging to the document record.
    ///
    /// # Errors
    /// Returns [`ContextError`] on storage failures.
    async fn delete(&self, collection: &str, record_id: i64) -> Result<(), ContextError>;
}

/// High-level facade that wires configuration, Qdrant client, and embedder.
///
/// This is the single entry point recommended for application code.
pub struct ContextStore {
    cfg: ContextStoreConfig,
    client: qdrant_facade::QdrantFacade,
    embedder: Arc<dyn EmbeddingsProvider>,
}

impl ContextStore {
    /// Constructs a new store from the given configuration and embedder.
    ///
    /// # Errors
    /// Returns `ContextError::Config` if the client initialization fails.
    pub fn new(
        cfg: ContextStoreConfig,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, ContextError> {
        debug!("ContextStore::new url={}", cfg.qdrant_url);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self {
            cfg,
            client,
            embedder,
        })
    }
}

#[async_trait]
impl DocumentIndex for ContextStore {
    async fn register(&self, collection: &str, doc: &IndexDocument) -> Result<(), ContextError> {
        ingest::ingest_document(&self.cfg, &self.client, self.embedder.as_ref(), collection, doc)
            .await
    }

    async fn query(
        &self,
        collection: &str,
        text: &str,
        top_k: u64,
    ) -> Result<Vec<Snippet>, ContextError> {
        retrieve::query_snippets(&self.client, self.embedder.as_ref(), collection, text, top_k)
            .await
    }

    async fn delete(&self, collection: &str, record_id: i64) -> Result<(), ContextError> {
        self.client.delete_by_record(collection, record_id).await
    }
}

/// Index for deployments without a vector store.
///
/// Running without an index is a supported mode: queries return no
/// snippets, registration and deletion are accepted as no-ops so document
/// management keeps working.
pub struct NoopIndex;

#[async_trait]
impl DocumentIndex for NoopIndex {
    async fn register(&self, collection: &str, doc: &IndexDocument) -> Result<(), ContextError> {
        warn!(
            collection,
            record_id = doc.record_id,
            "no index configured; document not indexed"
        );
        Ok(())
    }

    async fn query(
        &self,
        _collection: &str,
        _text: &str,
        _top_k: u64,
    ) -> Result<Vec<Snippet>, ContextError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _collection: &str, _record_id: i64) -> Result<(), ContextError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_index_returns_no_snippets() {
        let hits = NoopIndex
            .query("technical_docs", "how do I set up the VPN?", DEFAULT_TOP_K)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn noop_index_accepts_register_and_delete() {
        let doc = IndexDocument {
            record_id: 7,
            name: "guide.md".into(),
            doc_type: "technical documentation".into(),
            text: "content".into(),
        };
        assert!(NoopIndex.register("technical_docs", &doc).await.is_ok());
        assert!(NoopIndex.delete("technical_docs", 7).await.is_ok());
    }
}
