//! Document ingestion: extracted text → embedding → upsert into Qdrant.

use std::collections::HashMap;

use qdrant_client::qdrant::{PointId, PointStruct, Value as QValue, Vector, Vectors, value, vectors};
use tracing::info;
use uuid::Uuid;

use crate::config::ContextStoreConfig;
use crate::embed::EmbeddingsProvider;
use crate::errors::ContextError;
use crate::qdrant_facade::QdrantFacade;

/// A document ready to be indexed into a category collection.
#[derive(Debug, Clone)]
pub struct IndexDocument {
    /// Database id of the owning document record.
    pub record_id: i64,
    /// Original upload filename.
    pub name: String,
    /// Category-specific document type label.
    pub doc_type: String,
    /// Extracted text content.
    pub text: String,
}

/// Embeds and upserts one document into the given collection.
///
/// The collection is created on first use, sized from the computed
/// embedding. Point payloads carry `record_id` so the document can be
/// removed from the index when it is deleted from the forum.
///
/// # Errors
/// Returns embedding failures, vector size mismatches, or Qdrant errors.
pub async fn ingest_document(
    cfg: &ContextStoreConfig,
    client: &QdrantFacade,
    provider: &dyn EmbeddingsProvider,
    collection: &str,
    doc: &IndexDocument,
) -> Result<(), ContextError> {
    let text: String = doc.text.chars().take(cfg.chunk_max_chars).collect();
    let vector = provider.embed(&text).await?;

    if let Some(want) = cfg.embedding_dim {
        if vector.len() != want {
            return Err(ContextError::VectorSizeMismatch {
                got: vector.len(),
                want,
            });
        }
    }

    client.ensure_collection(collection, vector.len()).await?;

    let mut payload: HashMap<String, QValue> = HashMap::new();
    payload.insert("record_id".into(), qinteger(doc.record_id));
    payload.insert("name".into(), qstring(&doc.name));
    payload.insert("doc_type".into(), qstring(&doc.doc_type));
    payload.insert("text".into(), qstring(&text));

    let pid: PointId = Uuid::new_v4().to_string().into();
    let vectors = Vectors {
        vectors_options: Some(vectors::VectorsOptions::Vector(Vector {
            data: vector,
            indices: None,
            vectors_count: None,
            vector: None,
        })),
    };

    client
        .upsert_points(
            collection,
            vec![PointStruct {
                id: Some(pid),
                payload,
                vectors: Some(vectors),
                ..Default::default()
            }],
        )
        .await?;

    info!(
        collection,
        record_id = doc.record_id,
        name = %doc.name,
        "document indexed"
    );
    Ok(())
}

/// Wraps a string into Qdrant `Value`.
fn qstring(s: &str) -> QValue {
    QValue {
        kind: Some(value::Kind::StringValue(s.to_string())),
    }
}

/// Wraps an integer into Qdrant `Value`.
fn qinteger(i: i64) -> QValue {
    QValue {
        kind: Some(value::Kind::IntegerValue(i)),
    }
}
