//! The `ResponseGenerator` contract and its degraded-mode implementation.
//!
//! The orchestration layer talks to `dyn ResponseGenerator` only; the
//! concrete backend is chosen once at startup by [`build_generator`].
//! Conversation history is passed in full on every call, newest user turn
//! last, and clamped to a bounded window right before the provider call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::AiLlmError;
use crate::services::ollama_service::OllamaService;
use crate::services::open_ai_service::OpenAiService;

/// Originator of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name understood by chat-style provider APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One turn of conversation history supplied to generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

/// Capability interface for producing one reply from a conversation.
///
/// Implementations must be hot-swappable behind `Arc<dyn ResponseGenerator>`;
/// callers never branch on the concrete backend.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Produces exactly one reply for the supplied conversation.
    ///
    /// `system` is the category-scoped instruction (with any context block
    /// already appended); `history` is the full persisted conversation,
    /// newest user turn last.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] when the upstream model call fails (network,
    /// auth, rate limit, malformed response) or generation is disabled.
    async fn complete(
        &self,
        system: Option<&str>,
        history: &[ChatTurn],
    ) -> Result<String, AiLlmError>;

    /// Short provider label for logs and health reporting.
    fn provider_name(&self) -> &'static str;
}

/// Embeddings capability shared by the concrete provider services.
#[async_trait]
pub trait EmbeddingsBackend: Send + Sync {
    /// Computes one embedding vector for the input text.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the provider call fails.
    async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError>;
}

/// Degraded mode: no provider configured. Every call fails with
/// [`AiLlmError::Disabled`], which callers treat as "no AI answer" rather
/// than a hard failure of the originating write.
pub struct NoopGenerator;

#[async_trait]
impl ResponseGenerator for NoopGenerator {
    async fn complete(
        &self,
        _system: Option<&str>,
        _history: &[ChatTurn],
    ) -> Result<String, AiLlmError> {
        warn!("generation requested while LLM_KIND is disabled");
        Err(AiLlmError::Disabled)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Keeps only the most recent `max_turns` turns.
///
/// The core defines no truncation policy; this sliding window is the
/// documented deployment choice so very long sessions stay within model
/// context limits.
pub fn clamp_history(history: &[ChatTurn], max_turns: usize) -> &[ChatTurn] {
    if max_turns == 0 || history.len() <= max_turns {
        history
    } else {
        &history[history.len() - max_turns..]
    }
}

/// Builds the active generator from configuration.
///
/// `None` selects [`NoopGenerator`]; otherwise the provider named in the
/// config is constructed. This is the single place backend selection
/// happens.
///
/// # Errors
/// Propagates provider constructor validation failures.
pub fn build_generator(
    cfg: Option<LlmModelConfig>,
) -> Result<Arc<dyn ResponseGenerator>, AiLlmError> {
    match cfg {
        None => Ok(Arc::new(NoopGenerator)),
        Some(c) => match c.provider {
            LlmProvider::Ollama => Ok(Arc::new(OllamaService::new(c)?)),
            LlmProvider::OpenAI => Ok(Arc::new(OpenAiService::new(c)?)),
        },
    }
}

/// Builds the embeddings backend from configuration, if any.
///
/// # Errors
/// Propagates provider constructor validation failures.
pub fn build_embedder(
    cfg: Option<LlmModelConfig>,
) -> Result<Option<Arc<dyn EmbeddingsBackend>>, AiLlmError> {
    match cfg {
        None => Ok(None),
        Some(c) => match c.provider {
            LlmProvider::Ollama => Ok(Some(Arc::new(OllamaService::new(c)?))),
            LlmProvider::OpenAI => Ok(Some(Arc::new(OpenAiService::new(c)?))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_newest_turns() {
        let history = vec![
            ChatTurn::user("one"),
            ChatTurn::assistant("two"),
            ChatTurn::user("three"),
        ];
        let clamped = clamp_history(&history, 2);
        assert_eq!(clamped.len(), 2);
        assert_eq!(clamped[0].text, "two");
        assert_eq!(clamped[1].text, "three");
    }

    #[test]
    fn clamp_zero_means_unbounded() {
        let history = vec![ChatTurn::user("one")];
        assert_eq!(clamp_history(&history, 0).len(), 1);
    }

    #[tokio::test]
    async fn noop_generator_always_fails_disabled() {
        let r = NoopGenerator.complete(None, &[ChatTurn::user("hi")]).await;
        assert!(matches!(r, Err(AiLlmError::Disabled)));
    }
}
