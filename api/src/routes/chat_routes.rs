//! Chat session endpoints (synchronous HTTP surface).
//!
//! Posting a message persists it, then waits for the AI reply in the same
//! request. When generation fails the user message is already stored and
//! the handler reports 502, so the client can re-sync history and retry.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};

use forum_store::{Category, ChatMessage};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    middleware_layer::current_user::CurrentUser,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub category: Category,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(req): Json<CreateSessionRequest>,
) -> AppResult<Response> {
    let session = state.store.create_session(user.0, req.category).await;
    Ok(ApiResponse::success(session).into_response_with_status(StatusCode::CREATED))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Response> {
    let sessions = state.store.sessions_for_user(user.0).await;
    Ok(ApiResponse::success(sessions).into_response_with_status(StatusCode::OK))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(session_id): Path<u64>,
) -> AppResult<Response> {
    // Sessions are private; a foreign session looks like a missing one.
    state
        .store
        .get_session(session_id)
        .await
        .filter(|s| s.user_id == user.0)
        .ok_or(AppError::NotFound("chat session", session_id))?;

    let messages = state.store.messages_for_session(session_id).await;
    Ok(ApiResponse::success(messages).into_response_with_status(StatusCode::OK))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageResponse {
    pub user_message: ChatMessage,
    pub ai_message: ChatMessage,
}

pub async fn post_message(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(session_id): Path<u64>,
    Json(req): Json<PostMessageRequest>,
) -> AppResult<Response> {
    if req.content.trim().is_empty() {
        return Err(AppError::BadRequest("message content is required".into()));
    }

    state
        .store
        .get_session(session_id)
        .await
        .filter(|s| s.user_id == user.0)
        .ok_or(AppError::NotFound("chat session", session_id))?;

    let exchange = state
        .orchestrator
        .answer_chat_message(session_id, &req.content)
        .await?;

    let body = PostMessageResponse {
        user_message: exchange.user_message,
        ai_message: exchange.reply,
    };
    Ok(ApiResponse::success(body).into_response_with_status(StatusCode::OK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_store::NoopIndex;

    use crate::core::app_state::AppState;

    fn state() -> Arc<AppState> {
        AppState::stub(Arc::new(NoopIndex), std::env::temp_dir())
    }

    #[tokio::test]
    async fn foreign_session_messages_are_hidden() {
        let state = state();
        let session = state.store.create_session(2, Category::General).await;

        let res = list_messages(State(state), CurrentUser(3), Path(session.id)).await;
        assert!(matches!(
            res,
            Err(AppError::NotFound("chat session", _))
        ));
    }

    #[tokio::test]
    async fn foreign_session_rejects_posted_messages() {
        let state = state();
        let session = state.store.create_session(2, Category::General).await;

        let res = post_message(
            State(state.clone()),
            CurrentUser(3),
            Path(session.id),
            Json(PostMessageRequest {
                content: "hello".into(),
            }),
        )
        .await;
        assert!(matches!(
            res,
            Err(AppError::NotFound("chat session", _))
        ));
        assert!(state.store.messages_for_session(session.id).await.is_empty());
    }

    #[tokio::test]
    async fn owner_reads_own_session_messages() {
        let state = state();
        let session = state.store.create_session(2, Category::Hr).await;
        state
            .store
            .create_chat_message(session.id, "hi", true)
            .await
            .unwrap();

        let res = list_messages(State(state), CurrentUser(2), Path(session.id)).await;
        assert!(res.is_ok());
    }
}
