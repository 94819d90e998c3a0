//! Unified error type for store operations.

use thiserror::Error;

/// Top-level error for forum-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced question does not exist.
    #[error("question not found: {0}")]
    QuestionNotFound(u64),

    /// Referenced answer does not exist.
    #[error("answer not found: {0}")]
    AnswerNotFound(u64),

    /// Referenced chat session does not exist.
    #[error("chat session not found: {0}")]
    SessionNotFound(u64),

    /// Referenced document record does not exist.
    #[error("document not found: {0}")]
    DocumentNotFound(u64),

    /// Referenced user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(u64),
}
