//! HTTP surface of the forum backend.
//!
//! `start()` builds the shared state from the environment, wires the
//! router, and serves until Ctrl+C. All routes live under `/api`.

use std::env;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tokio::signal;
use tracing::info;

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use crate::error_handler::AppError;
use crate::routes::{
    bridge_routes::bridge_events,
    chat_routes::{create_session, list_messages, list_sessions, post_message},
    chat_ws_route::chat_ws,
    document_routes::{
        delete_document, download_document, get_document, list_documents, upload_document,
    },
    forum_routes::{
        create_answer, create_post, get_post, list_posts, search_posts, vote_answer,
    },
    health_route::health,
};

pub async fn start() -> Result<(), AppError> {
    let state = core::app_state::AppState::from_env()?;
    tokio::fs::create_dir_all(&state.upload_dir).await?;

    let api = Router::new()
        // forum
        .route(
            "/forum/{category}/posts",
            post(create_post).get(list_posts),
        )
        .route("/forum/posts/{id}", get(get_post))
        .route("/forum/search", get(search_posts))
        .route("/forum/posts/{id}/answers", post(create_answer))
        .route("/forum/answers/{id}/vote", post(vote_answer))
        // chat
        .route("/chat/sessions", post(create_session).get(list_sessions))
        .route(
            "/chat/sessions/{id}/messages",
            get(list_messages).post(post_message),
        )
        .route("/chat/ws", get(chat_ws))
        // documents
        .route("/documents", post(upload_document).get(list_documents))
        .route("/documents/{id}", get(get_document))
        .route("/documents/{id}", delete(delete_document))
        .route("/documents/{id}/download", get(download_document))
        // integrations
        .route("/bridge/events", post(bridge_events))
        .route("/health", get(health));

    let app = Router::new().nest("/api", api).with_state(state);

    let host_url = env::var("API_ADDRESS").map_err(|_| AppError::MissingEnv("API_ADDRESS"))?;
    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, "api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
