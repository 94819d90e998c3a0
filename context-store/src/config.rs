//! Runtime configuration for the vector index.

use crate::errors::ContextError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

/// Configuration for the Qdrant-backed document index.
///
/// Collections are not configured here: each forum category owns its own
/// collection and the name is passed per call.
#[derive(Clone, Debug)]
pub struct ContextStoreConfig {
    /// Qdrant HTTP endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Expected embedding dimensionality, when known up front.
    pub embedding_dim: Option<usize>,
    /// Maximum characters of document text stored per point.
    pub chunk_max_chars: usize,
}

impl ContextStoreConfig {
    /// Creates a sane default config for a given Qdrant endpoint.
    pub fn new_default(url: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            distance: DistanceKind::Cosine,
            embedding_dim: None,
            chunk_max_chars: 4000,
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), ContextError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(ContextError::Config("qdrant_url is empty".into()));
        }
        if self.chunk_max_chars == 0 {
            return Err(ContextError::Config("chunk_max_chars must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_rejected() {
        let cfg = ContextStoreConfig::new_default("  ");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = ContextStoreConfig::new_default("http://localhost:6334");
        assert!(cfg.validate().is_ok());
    }
}
