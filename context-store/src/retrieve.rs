//! Retrieval helpers: similarity search and context block formatting.

use serde::Serialize;
use tracing::debug;

use crate::embed::EmbeddingsProvider;
use crate::errors::ContextError;
use crate::qdrant_facade::QdrantFacade;

/// Number of documents retrieved per query.
pub const DEFAULT_TOP_K: u64 = 5;

/// Maximum characters of one document's content included in a context block.
pub const DOC_CONTENT_MAX_CHARS: usize = 1000;

/// One retrieved document snippet.
#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    pub score: f32,
    pub record_id: i64,
    pub name: String,
    pub doc_type: String,
    pub text: String,
}

/// Embeds the query text and returns the top hits from the collection.
///
/// # Errors
/// Returns embedding errors or Qdrant failures. Callers that must not fail
/// on retrieval problems are expected to map errors to an empty result.
pub async fn query_snippets(
    client: &QdrantFacade,
    provider: &dyn EmbeddingsProvider,
    collection: &str,
    text: &str,
    top_k: u64,
) -> Result<Vec<Snippet>, ContextError> {
    let qv = provider.embed(text).await?;
    let hits = client.search(collection, qv, top_k).await?;

    let mut out = Vec::with_capacity(hits.len());
    for (score, payload) in hits {
        out.push(Snippet {
            score,
            record_id: payload
                .get("record_id")
                .and_then(|v| v.as_i64())
                .unwrap_or_default(),
            name: payload
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            doc_type: payload
                .get("doc_type")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            text: payload
                .get("text")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
        });
    }

    debug!(collection, hits = out.len(), "retrieval completed");
    Ok(out)
}

/// Formats retrieved snippets into the context block handed to generation.
///
/// Each document contributes a labeled section with its content clamped to
/// [`DOC_CONTENT_MAX_CHARS`]. Returns an empty string for no snippets.
pub fn build_context_block(snippets: &[Snippet]) -> String {
    let mut sections = Vec::with_capacity(snippets.len());
    for s in snippets {
        let content: String = s.text.chars().take(DOC_CONTENT_MAX_CHARS).collect();
        sections.push(format!(
            "Document: {} (Type: {})\nContent: {}",
            s.name, s.doc_type, content
        ));
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(name: &str, doc_type: &str, text: &str) -> Snippet {
        Snippet {
            score: 0.9,
            record_id: 1,
            name: name.to_string(),
            doc_type: doc_type.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn context_block_labels_each_document() {
        let block = build_context_block(&[
            snippet("vpn-guide.md", "technical documentation", "connect to vpn.internal"),
            snippet("handbook.txt", "policy document", "working hours are flexible"),
        ]);
        assert!(block.starts_with("Document: vpn-guide.md (Type: technical documentation)"));
        assert!(block.contains("Content: connect to vpn.internal"));
        assert!(block.contains("\n\nDocument: handbook.txt"));
    }

    #[test]
    fn context_block_clamps_long_content() {
        let long = "x".repeat(5000);
        let block = build_context_block(&[snippet("big.txt", "other", &long)]);
        let content = block.split("Content: ").nth(1).unwrap();
        assert_eq!(content.chars().count(), DOC_CONTENT_MAX_CHARS);
    }

    #[test]
    fn empty_snippets_give_empty_block() {
        assert!(build_context_block(&[]).is_empty());
    }
}
