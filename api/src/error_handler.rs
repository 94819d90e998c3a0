use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use ai_llm_service::AiLlmError;
use context_store::ContextError;
use forum_store::StoreError;
use orchestrator::OrchestratorError;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Index(#[from] ContextError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0} not found: {1}")]
    NotFound(&'static str, u64),

    /// Generation failed after the user's content was persisted.
    #[error("AI backend unavailable: {0}")]
    AiUnavailable(String),

    /// Filesystem failure while handling an upload or download.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // startup-only
            AppError::MissingEnv(_) | AppError::Llm(_) | AppError::Index(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,

            // the write succeeded, the AI step did not
            AppError::AiUnavailable(_) => StatusCode::BAD_GATEWAY,

            // 5xx
            AppError::Bind(_) | AppError::Server(_) | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Llm(_) => "LLM_CONFIG_ERROR",
            AppError::Index(_) => "INDEX_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(..) => "NOT_FOUND",
            AppError::AiUnavailable(_) => "AI_UNAVAILABLE",
            AppError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ApiResponse::<()>::error(self.error_code(), self.to_string())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QuestionNotFound(id) => AppError::NotFound("question", id),
            StoreError::AnswerNotFound(id) => AppError::NotFound("answer", id),
            StoreError::SessionNotFound(id) => AppError::NotFound("chat session", id),
            StoreError::DocumentNotFound(id) => AppError::NotFound("document", id),
            StoreError::UserNotFound(id) => AppError::NotFound("user", id),
        }
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Store(e) => e.into(),
            OrchestratorError::Generation(e) => AppError::AiUnavailable(e.to_string()),
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
