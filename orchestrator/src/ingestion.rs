//! Background document ingestion.
//!
//! Uploads are accepted immediately with the record in `processing` state;
//! this pipeline extracts text, indexes it, and resolves the record to
//! `processed` or `failed` out-of-band. A crash mid-processing leaves the
//! record in `processing`, never half-indexed-as-processed.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use context_store::{DocumentIndex, IndexDocument, extract_text};
use forum_store::{DocumentRecord, ForumStore};

/// Processes uploaded documents in background tasks.
pub struct IngestionPipeline {
    store: Arc<ForumStore>,
    index: Arc<dyn DocumentIndex>,
}

impl IngestionPipeline {
    pub fn new(store: Arc<ForumStore>, index: Arc<dyn DocumentIndex>) -> Self {
        Self { store, index }
    }

    /// Queues one record for processing and returns immediately.
    pub fn spawn(&self, record: DocumentRecord) {
        let store = self.store.clone();
        let index = self.index.clone();
        tokio::spawn(async move {
            process_document(&store, index.as_ref(), record).await;
        });
    }
}

/// Runs the full processing cycle for one record.
///
/// Never returns an error: every failure path marks the record `failed`
/// and is logged. Questions and answers are unaffected either way.
#[instrument(skip_all, fields(document_id = record.id, name = %record.name))]
pub async fn process_document(
    store: &ForumStore,
    index: &dyn DocumentIndex,
    record: DocumentRecord,
) {
    let text = match extract_text(&record.file_path, &record.name).await {
        Ok(t) if !t.trim().is_empty() => t,
        Ok(_) => {
            warn!("extracted text is empty; marking failed");
            mark_failed(store, record.id).await;
            return;
        }
        Err(e) => {
            warn!(error = %e, "text extraction failed; marking failed");
            mark_failed(store, record.id).await;
            return;
        }
    };

    let collection = record.category.profile().collection;
    let doc = IndexDocument {
        record_id: record.id as i64,
        name: record.name.clone(),
        doc_type: record.document_type.clone(),
        text,
    };

    if let Err(e) = index.register(collection, &doc).await {
        warn!(collection, error = %e, "indexing failed; marking failed");
        mark_failed(store, record.id).await;
        return;
    }

    let embedding_id = format!("doc_{}_{}", record.id, Uuid::new_v4());
    match store.mark_document_processed(record.id, &embedding_id).await {
        Ok(_) => info!(collection, embedding_id, "document processed"),
        Err(e) => error!(error = %e, "failed to finalize processed document"),
    }
}

async fn mark_failed(store: &ForumStore, id: u64) {
    if let Err(e) = store.mark_document_failed(id).await {
        error!(document_id = id, error = %e, "failed to mark document failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use context_store::{ContextError, Snippet};
    use forum_store::{Category, DocumentStatus, NewDocument};
    use tokio::sync::Mutex;

    struct RecordingIndex {
        registered: Mutex<Vec<(String, IndexDocument)>>,
        fail: bool,
    }

    impl RecordingIndex {
        fn new(fail: bool) -> Self {
            Self {
                registered: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl DocumentIndex for RecordingIndex {
        async fn register(&self, collection: &str, doc: &IndexDocument) -> Result<(), ContextError> {
            if self.fail {
                return Err(ContextError::Qdrant("unavailable".into()));
            }
            self.registered
                .lock()
                .await
                .push((collection.to_string(), doc.clone()));
            Ok(())
        }
        async fn query(&self, _: &str, _: &str, _: u64) -> Result<Vec<Snippet>, ContextError> {
            Ok(Vec::new())
        }
        async fn delete(&self, _: &str, _: i64) -> Result<(), ContextError> {
            Ok(())
        }
    }

    async fn upload(store: &ForumStore, name: &str, bytes: &[u8]) -> DocumentRecord {
        let dir = std::env::temp_dir().join(format!("ingest-test-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await.unwrap();

        store
            .create_document(NewDocument {
                name: name.to_string(),
                description: None,
                category: Category::Technical,
                document_type: "guide".into(),
                file_type: "md".into(),
                file_size: bytes.len() as u64,
                file_path: path.to_string_lossy().into_owned(),
                uploaded_by: 2,
            })
            .await
    }

    #[tokio::test]
    async fn successful_ingestion_marks_processed() {
        let store = ForumStore::new();
        let index = RecordingIndex::new(false);
        let record = upload(&store, "vpn.md", b"# VPN\nconnect to vpn.internal").await;

        process_document(&store, &index, record.clone()).await;

        let d = store.get_document(record.id).await.unwrap();
        assert_eq!(d.status, DocumentStatus::Processed);
        assert!(d.embedding_id.unwrap().starts_with(&format!("doc_{}_", record.id)));

        let registered = index.registered.lock().await;
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].0, "technical_docs");
        assert!(registered[0].1.text.contains("vpn.internal"));
    }

    #[tokio::test]
    async fn index_failure_marks_failed() {
        let store = ForumStore::new();
        let index = RecordingIndex::new(true);
        let record = upload(&store, "vpn.md", b"content").await;

        process_document(&store, &index, record.clone()).await;

        let d = store.get_document(record.id).await.unwrap();
        assert_eq!(d.status, DocumentStatus::Failed);
        assert!(d.embedding_id.is_none());
    }

    #[tokio::test]
    async fn binary_upload_marks_failed() {
        let store = ForumStore::new();
        let index = RecordingIndex::new(false);
        let record = upload(&store, "blob.bin", &[0xff, 0xfe, 0x00]).await;

        process_document(&store, &index, record.clone()).await;

        let d = store.get_document(record.id).await.unwrap();
        assert_eq!(d.status, DocumentStatus::Failed);
        assert!(index.registered.lock().await.is_empty());
    }
}
