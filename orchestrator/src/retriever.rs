//! Fail-closed context retrieval in front of the document index.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use context_store::{DEFAULT_TOP_K, DocumentIndex, build_context_block};
use forum_store::Category;

/// Produces the context block for a query, scoped to one category.
///
/// Implementations are infallible by contract: any internal failure must
/// degrade to an empty context so the caller can proceed without it.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(&self, category: Category, query: &str) -> String;
}

/// Retriever backed by the vector index, with a hard time budget.
///
/// Index errors and timeouts are logged and mapped to an empty context;
/// they never propagate to the answer flow.
pub struct IndexRetriever {
    index: Arc<dyn DocumentIndex>,
    timeout: Duration,
    top_k: u64,
}

impl IndexRetriever {
    pub fn new(index: Arc<dyn DocumentIndex>, timeout: Duration) -> Self {
        Self {
            index,
            timeout,
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[async_trait]
impl ContextRetriever for IndexRetriever {
    async fn retrieve(&self, category: Category, query: &str) -> String {
        let collection = category.profile().collection;

        let result = tokio::time::timeout(
            self.timeout,
            self.index.query(collection, query, self.top_k),
        )
        .await;

        match result {
            Ok(Ok(snippets)) => {
                debug!(collection, hits = snippets.len(), "context retrieved");
                build_context_block(&snippets)
            }
            Ok(Err(e)) => {
                warn!(collection, error = %e, "context retrieval failed; proceeding without context");
                String::new()
            }
            Err(_) => {
                warn!(
                    collection,
                    timeout_ms = self.timeout.as_millis(),
                    "context retrieval timed out; proceeding without context"
                );
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_store::{ContextError, IndexDocument, Snippet};

    struct FailingIndex;

    #[async_trait]
    impl DocumentIndex for FailingIndex {
        async fn register(&self, _: &str, _: &IndexDocument) -> Result<(), ContextError> {
            Err(ContextError::IndexUnavailable)
        }
        async fn query(&self, _: &str, _: &str, _: u64) -> Result<Vec<Snippet>, ContextError> {
            Err(ContextError::Qdrant("connection refused".into()))
        }
        async fn delete(&self, _: &str, _: i64) -> Result<(), ContextError> {
            Ok(())
        }
    }

    struct SlowIndex;

    #[async_trait]
    impl DocumentIndex for SlowIndex {
        async fn register(&self, _: &str, _: &IndexDocument) -> Result<(), ContextError> {
            Ok(())
        }
        async fn query(&self, _: &str, _: &str, _: u64) -> Result<Vec<Snippet>, ContextError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
        async fn delete(&self, _: &str, _: i64) -> Result<(), ContextError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn index_failure_degrades_to_empty_context() {
        let r = IndexRetriever::new(Arc::new(FailingIndex), Duration::from_secs(1));
        let ctx = r.retrieve(Category::Technical, "how do I set up the VPN?").await;
        assert!(ctx.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_index_times_out_to_empty_context() {
        let r = IndexRetriever::new(Arc::new(SlowIndex), Duration::from_millis(50));
        let ctx = r.retrieve(Category::Hr, "parental leave policy").await;
        assert!(ctx.is_empty());
    }
}
