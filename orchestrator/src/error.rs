//! Unified error type for orchestration.

use thiserror::Error;

use ai_llm_service::AiLlmError;
use forum_store::StoreError;

/// Failures surfaced by the answer orchestrator.
///
/// Context retrieval never appears here: retrieval problems degrade to an
/// empty context instead of failing the operation.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The originating record is missing or a persistence step failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Generation failed or timed out. The triggering user content is
    /// already persisted when this is returned.
    #[error("generation failed: {0}")]
    Generation(#[from] AiLlmError),
}
