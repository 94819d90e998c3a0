//! Shared LLM service for the forum's AI answer pipeline.
//!
//! Exposes one [`generator::ResponseGenerator`] contract with three
//! interchangeable implementations selected by startup configuration:
//! - [`services::ollama_service::OllamaService`] — local Ollama runtime
//! - [`services::open_ai_service::OpenAiService`] — OpenAI REST API
//! - [`generator::NoopGenerator`] — degraded mode when no provider is set
//!
//! Also provides embeddings access for the vector index and lightweight
//! provider health probes for a `/health` endpoint. All failures normalize
//! to [`error_handler::AiLlmError`].

pub mod config;
pub mod error_handler;
pub mod generator;
pub mod health_service;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::AiLlmError;
pub use generator::{
    ChatRole, ChatTurn, EmbeddingsBackend, NoopGenerator, ResponseGenerator, build_embedder,
    build_generator, clamp_history,
};
