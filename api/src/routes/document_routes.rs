//! Document management endpoints.
//!
//! Uploads are acknowledged as soon as the file and its record are stored;
//! extraction and indexing run in the background and resolve the record to
//! `processed` or `failed`. Deletion removes the record, the stored file,
//! and any index entries.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use forum_store::{Category, NewDocument};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    middleware_layer::current_user::CurrentUser,
};

/// Parsed multipart form for a document upload.
struct UploadForm {
    file_name: String,
    bytes: Vec<u8>,
    category: Category,
    document_type: String,
    description: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut file_name = None;
    let mut bytes = None;
    let mut category = None;
    let mut document_type = None;
    let mut description = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or_default() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                bytes = Some(field.bytes().await?.to_vec());
            }
            "category" => {
                let raw = field.text().await?;
                category = Some(
                    raw.parse::<Category>()
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "documentType" => document_type = Some(field.text().await?),
            "description" => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    description = Some(text);
                }
            }
            other => {
                warn!(field = other, "ignoring unknown multipart field");
            }
        }
    }

    let file_name =
        file_name.ok_or_else(|| AppError::BadRequest("file field is required".into()))?;
    let bytes = bytes.ok_or_else(|| AppError::BadRequest("file field is required".into()))?;
    let category =
        category.ok_or_else(|| AppError::BadRequest("category field is required".into()))?;
    let document_type = document_type
        .ok_or_else(|| AppError::BadRequest("documentType field is required".into()))?;

    if !category
        .profile()
        .document_types
        .contains(&document_type.as_str())
    {
        return Err(AppError::BadRequest(format!(
            "documentType '{}' is not allowed in category '{}' (allowed: {})",
            document_type,
            category,
            category.profile().document_types.join(", ")
        )));
    }

    Ok(UploadForm {
        file_name,
        bytes,
        category,
        document_type,
        description,
    })
}

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_upload_form(multipart).await?;

    let file_type = std::path::Path::new(&form.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    tokio::fs::create_dir_all(&state.upload_dir).await?;
    let stored_path = state
        .upload_dir
        .join(format!("{}_{}", Uuid::new_v4(), form.file_name));
    tokio::fs::write(&stored_path, &form.bytes).await?;

    let record = state
        .store
        .create_document(NewDocument {
            name: form.file_name,
            description: form.description,
            category: form.category,
            document_type: form.document_type,
            file_type,
            file_size: form.bytes.len() as u64,
            file_path: stored_path.to_string_lossy().into_owned(),
            uploaded_by: user.0,
        })
        .await;

    info!(document_id = record.id, category = %record.category, "document upload accepted");
    state.ingestion.spawn(record.clone());

    Ok(ApiResponse::success(record).into_response_with_status(StatusCode::CREATED))
}

#[derive(Deserialize)]
pub struct ListDocumentsParams {
    pub category: Option<String>,
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListDocumentsParams>,
) -> AppResult<Response> {
    let category = params
        .category
        .as_deref()
        .map(|raw| {
            raw.parse::<Category>()
                .map_err(|e| AppError::BadRequest(e.to_string()))
        })
        .transpose()?;

    let docs = state.store.list_documents(category).await;
    Ok(ApiResponse::success(docs).into_response_with_status(StatusCode::OK))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<Response> {
    let record = state
        .store
        .get_document(id)
        .await
        .ok_or(AppError::NotFound("document", id))?;
    Ok(ApiResponse::success(record).into_response_with_status(StatusCode::OK))
}

pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<Response> {
    let record = state
        .store
        .get_document(id)
        .await
        .ok_or(AppError::NotFound("document", id))?;

    let bytes = tokio::fs::read(&record.file_path).await?;
    let disposition = format!("attachment; filename=\"{}\"", record.name);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<Response> {
    let record = state.store.delete_document(id).await?;

    // Only processed records have index entries to clean up.
    if record.embedding_id.is_some() {
        let collection = record.category.profile().collection;
        if let Err(e) = state.index.delete(collection, record.id as i64).await {
            warn!(document_id = record.id, error = %e, "index cleanup failed on delete");
        }
    }
    if let Err(e) = tokio::fs::remove_file(&record.file_path).await {
        warn!(document_id = record.id, error = %e, "stored file cleanup failed on delete");
    }

    Ok(ApiResponse::success(record).into_response_with_status(StatusCode::OK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use context_store::{ContextError, DocumentIndex, IndexDocument, Snippet};
    use tokio::sync::Mutex;

    use crate::core::app_state::AppState;

    struct RecordingIndex {
        deleted: Mutex<Vec<(String, i64)>>,
    }

    impl RecordingIndex {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                deleted: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DocumentIndex for RecordingIndex {
        async fn register(&self, _: &str, _: &IndexDocument) -> Result<(), ContextError> {
            Ok(())
        }
        async fn query(&self, _: &str, _: &str, _: u64) -> Result<Vec<Snippet>, ContextError> {
            Ok(Vec::new())
        }
        async fn delete(&self, collection: &str, record_id: i64) -> Result<(), ContextError> {
            self.deleted
                .lock()
                .await
                .push((collection.to_string(), record_id));
            Ok(())
        }
    }

    async fn stored_document(
        state: &AppState,
        name: &str,
        bytes: &[u8],
    ) -> forum_store::DocumentRecord {
        let path = state.upload_dir.join(name);
        tokio::fs::write(&path, bytes).await.unwrap();
        state
            .store
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
    async fn deleting_processed_document_cleans_index_and_file() {
        let index = RecordingIndex::new();
        let dir = std::env::temp_dir().join(format!("doc-routes-test-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let state = AppState::stub(index.clone(), dir);

        let record = stored_document(&state, "vpn.md", b"# VPN\nuse vpn.internal").await;
        state
            .store
            .mark_document_processed(record.id, format!("doc_{}_abc", record.id))
            .await
            .unwrap();
        let path = std::path::PathBuf::from(&record.file_path);

        delete_document(State(state.clone()), Path(record.id))
            .await
            .unwrap();

        assert!(state.store.get_document(record.id).await.is_none());
        assert_eq!(
            *index.deleted.lock().await,
            vec![("technical_docs".to_string(), record.id as i64)]
        );
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn deleting_unprocessed_document_skips_the_index() {
        let index = RecordingIndex::new();
        let dir = std::env::temp_dir().join(format!("doc-routes-test-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let state = AppState::stub(index.clone(), dir);

        let record = stored_document(&state, "draft.md", b"still processing").await;

        delete_document(State(state.clone()), Path(record.id))
            .await
            .unwrap();

        assert!(state.store.get_document(record.id).await.is_none());
        assert!(index.deleted.lock().await.is_empty());
    }
}
