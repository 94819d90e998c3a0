//! Default LLM configs loaded strictly from environment variables.
//!
//! Two roles are configured here:
//!
//! - **Generation** → the conversational model answering questions
//! - **Embedding**  → the embedding model backing contextual retrieval
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = provider kind (`ollama`, `openai`, or `disabled`; default
//!   `disabled` — the forum runs without AI augmentation)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional per-request timeout (u64)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = generation model (mandatory)
//! - `EMBEDDING_MODEL`             = embedding model (optional; embeddings
//!   disabled when unset)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY`  = API key (mandatory)
//! - `OPENAI_URL`      = API base, default `https://api.openai.com`
//! - `OPENAI_MODEL`    = generation model (mandatory)
//! - `EMBEDDING_MODEL` = embedding model (optional)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env},
};

/// Reads `LLM_KIND`. `None` means generation is disabled (degraded mode).
///
/// # Errors
/// Returns [`ConfigError::UnsupportedProvider`] for unknown kinds.
pub fn provider_kind() -> Result<Option<LlmProvider>, AiLlmError> {
    match std::env::var("LLM_KIND") {
        Ok(v) if !v.trim().is_empty() => {
            let v = v.trim().to_ascii_lowercase();
            if v == "disabled" || v == "none" {
                return Ok(None);
            }
            Ok(Some(v.parse::<LlmProvider>()?))
        }
        _ => Ok(None),
    }
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{port}"));
        }
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Constructs the **generation** config for the selected provider, or
/// `None` when `LLM_KIND` is unset/`disabled`.
///
/// # Errors
/// Propagates missing/invalid variables for the selected provider.
pub fn generation_from_env() -> Result<Option<LlmModelConfig>, AiLlmError> {
    let Some(kind) = provider_kind()? else {
        return Ok(None);
    };
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.or(Some(120));

    let cfg = match kind {
        LlmProvider::Ollama => LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: must_env("OLLAMA_MODEL")?,
            endpoint: ollama_endpoint()?,
            api_key: None,
            max_tokens,
            temperature: Some(0.7),
            top_p: Some(0.9),
            timeout_secs,
        },
        LlmProvider::OpenAI => LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: must_env("OPENAI_MODEL")?,
            endpoint: std::env::var("OPENAI_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            api_key: Some(must_env("OPENAI_API_KEY")?),
            max_tokens: max_tokens.or(Some(2048)),
            temperature: Some(0.7),
            top_p: None,
            timeout_secs,
        },
    };
    Ok(Some(cfg))
}

/// Constructs the **embedding** config, or `None` when embeddings are not
/// configured (`EMBEDDING_MODEL` unset or generation disabled).
///
/// Deterministic settings: `temperature = 0.0`, short timeout.
pub fn embedding_from_env() -> Result<Option<LlmModelConfig>, AiLlmError> {
    let Some(kind) = provider_kind()? else {
        return Ok(None);
    };
    let model = match std::env::var("EMBEDDING_MODEL") {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };

    let cfg = match kind {
        LlmProvider::Ollama => LlmModelConfig {
            provider: LlmProvider::Ollama,
            model,
            endpoint: ollama_endpoint()?,
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(30),
        },
        LlmProvider::OpenAI => LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model,
            endpoint: std::env::var("OPENAI_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            api_key: Some(must_env("OPENAI_API_KEY")?),
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(30),
        },
    };
    Ok(Some(cfg))
}
