//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for context-store operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality against the collection space.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Text could not be extracted from the uploaded file.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Embedding backend failure (wrapped).
    #[error("embedding error: {0}")]
    Embedding(String),

    /// No vector index is configured for this deployment.
    #[error("no index configured")]
    IndexUnavailable,

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}
