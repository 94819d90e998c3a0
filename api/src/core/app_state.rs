use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use ai_llm_service::config::default_config::{embedding_from_env, generation_from_env};
use ai_llm_service::health_service::HealthService;
use ai_llm_service::{LlmModelConfig, build_embedder, build_generator};
use context_store::{
    ContextStore, ContextStoreConfig, DocumentIndex, EmbeddingsProvider, LlmEmbedder, NoopEmbedder,
    NoopIndex,
};
use forum_store::ForumStore;
use orchestrator::{AnswerOrchestrator, IndexRetriever, IngestionPipeline, OrchestratorConfig};

use crate::error_handler::AppResult;

/// Default context retrieval budget in seconds.
const DEFAULT_CONTEXT_TIMEOUT_SECS: u64 = 10;

/// Shared state for all HTTP handlers.
///
/// This is the composition root: provider selection, index wiring, and
/// orchestrator construction all happen here, once, at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ForumStore>,
    pub orchestrator: Arc<AnswerOrchestrator>,
    pub ingestion: Arc<IngestionPipeline>,
    pub index: Arc<dyn DocumentIndex>,
    pub health: Arc<HealthService>,
    /// Active generation config, `None` when AI is disabled.
    pub generation_cfg: Option<LlmModelConfig>,
    /// Active embedding config, `None` when embeddings are disabled.
    pub embedding_cfg: Option<LlmModelConfig>,
    /// Directory where uploaded document files are stored.
    pub upload_dir: PathBuf,
    /// Whether a real vector index is wired in.
    pub index_enabled: bool,
}

impl AppState {
    /// Load shared state from environment variables.
    ///
    /// Additional variables on top of the LLM ones:
    /// - `QDRANT_URL`       = vector index endpoint (unset → no index)
    /// - `QDRANT_API_KEY`   = optional Qdrant Cloud key
    /// - `EMBEDDING_DIM`    = optional expected embedding dimensionality
    /// - `CONTEXT_TIMEOUT_SECS` = retrieval budget (default 10)
    /// - `UPLOAD_DIR`       = document file storage (default `./uploads`)
    pub fn from_env() -> AppResult<Arc<Self>> {
        let generation_cfg = generation_from_env()?;
        let embedding_cfg = embedding_from_env()?;

        let generator = build_generator(generation_cfg.clone())?;
        info!(provider = generator.provider_name(), "generator selected");

        let embedding_dim = std::env::var("EMBEDDING_DIM")
            .ok()
            .and_then(|v| v.parse::<usize>().ok());

        let (index, index_enabled): (Arc<dyn DocumentIndex>, bool) = match std::env::var(
            "QDRANT_URL",
        ) {
            Ok(url) if !url.trim().is_empty() => {
                let embedder: Arc<dyn EmbeddingsProvider> =
                    match build_embedder(embedding_cfg.clone())? {
                        Some(backend) => Arc::new(LlmEmbedder::new(backend, embedding_dim)),
                        None => Arc::new(NoopEmbedder),
                    };

                let mut cfg = ContextStoreConfig::new_default(url);
                cfg.qdrant_api_key = std::env::var("QDRANT_API_KEY")
                    .ok()
                    .filter(|s| !s.trim().is_empty());
                cfg.embedding_dim = embedding_dim;

                (Arc::new(ContextStore::new(cfg, embedder)?), true)
            }
            _ => {
                info!("QDRANT_URL unset; running without a vector index");
                (Arc::new(NoopIndex), false)
            }
        };

        let context_timeout = std::env::var("CONTEXT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CONTEXT_TIMEOUT_SECS);

        let store = Arc::new(ForumStore::new());
        let retriever = Arc::new(IndexRetriever::new(
            index.clone(),
            Duration::from_secs(context_timeout),
        ));
        let orchestrator = Arc::new(AnswerOrchestrator::new(
            store.clone(),
            retriever,
            generator,
            OrchestratorConfig::from_env(),
        ));
        let ingestion = Arc::new(IngestionPipeline::new(store.clone(), index.clone()));

        let upload_dir = PathBuf::from(
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
        );

        Ok(Arc::new(Self {
            store,
            orchestrator,
            ingestion,
            index,
            health: Arc::new(HealthService::new(None)?),
            generation_cfg,
            embedding_cfg,
            upload_dir,
            index_enabled,
        }))
    }

    /// State wired from the given index with AI disabled, for handler tests.
    #[cfg(test)]
    pub(crate) fn stub(index: Arc<dyn DocumentIndex>, upload_dir: PathBuf) -> Arc<Self> {
        use ai_llm_service::NoopGenerator;

        let store = Arc::new(ForumStore::new());
        let retriever = Arc::new(IndexRetriever::new(index.clone(), Duration::from_secs(1)));
        let orchestrator = Arc::new(AnswerOrchestrator::new(
            store.clone(),
            retriever,
            Arc::new(NoopGenerator),
            OrchestratorConfig::default(),
        ));
        let ingestion = Arc::new(IngestionPipeline::new(store.clone(), index.clone()));

        Arc::new(Self {
            store,
            orchestrator,
            ingestion,
            index,
            health: Arc::new(HealthService::new(None).expect("health service")),
            generation_cfg: None,
            embedding_cfg: None,
            upload_dir,
            index_enabled: true,
        })
    }
}
