//! Builds a [`SharedEmbedder`] from a provider description.

use std::path::PathBuf;
use std::sync::Arc;

use crate::embedder::{DEFAULT_EMBEDDING_DIMS, MockEmbedder, SharedEmbedder};
use crate::error::{EmbedError, Result};
use crate::openai::{OpenAiEmbedder, OpenAiEmbedderConfig};

/// Provider-agnostic embedder description.
///
/// Populated by the binary from the `[embedding]` config section so this
/// crate does not depend on the config crate.
#[derive(Debug, Clone, Default)]
pub struct EmbedderSpec {
    /// Provider name: "local", "openai", or "mock".
    pub provider: String,
    /// OpenAI API key (required for "openai").
    pub openai_api_key: Option<String>,
    /// OpenAI model name.
    pub openai_model: Option<String>,
    /// OpenAI base URL override.
    pub openai_base_url: Option<String>,
    /// Local ONNX model path.
    pub local_model_path: Option<PathBuf>,
    /// Local tokenizer.json path.
    pub local_tokenizer_path: Option<PathBuf>,
    /// Requested dimensions.
    pub dimensions: Option<usize>,
}

impl EmbedderSpec {
    /// Spec for the deterministic mock provider.
    pub fn mock(dimensions: usize) -> Self {
        Self {
            provider: "mock".to_string(),
            dimensions: Some(dimensions),
            ..Default::default()
        }
    }
}

/// Build a `SharedEmbedder` from a spec.
///
/// Falls back to `MockEmbedder` if "local" is requested but unavailable
/// (feature disabled or model files missing).
pub fn build_embedder(spec: &EmbedderSpec) -> Result<SharedEmbedder> {
    let dims = spec.dimensions.unwrap_or(DEFAULT_EMBEDDING_DIMS);

    match spec.provider.as_str() {
        "openai" => {
            let api_key = spec.openai_api_key.as_deref().ok_or_else(|| {
                EmbedError::Config(
                    "OpenAI embedding provider requires an API key. \
                     Set OPENAI_API_KEY or configure [embedding.openai] api_key."
                        .to_string(),
                )
            })?;
            let mut config = OpenAiEmbedderConfig::new(api_key);
            if let Some(ref model) = spec.openai_model {
                config = config.with_model(model);
            }
            if let Some(ref base_url) = spec.openai_base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(dims) = spec.dimensions {
                config = config.with_dimensions(dims);
            }
            Ok(Arc::new(OpenAiEmbedder::new(config)?))
        }
        #[cfg(feature = "local-embeddings")]
        "local" => {
            let paths = match (&spec.local_model_path, &spec.local_tokenizer_path) {
                (Some(model), Some(tokenizer)) => Some((model.clone(), tokenizer.clone())),
                _ => default_local_model_dir()
                    .map(|dir| (dir.join("model.onnx"), dir.join("tokenizer.json")))
                    .filter(|(model, tokenizer)| model.exists() && tokenizer.exists()),
            };
            match paths {
                Some((model, tokenizer)) => Ok(Arc::new(crate::local::LocalEmbedder::load(
                    model, tokenizer, dims,
                )?)),
                None => {
                    tracing::warn!(
                        "Local embedding model not found. Falling back to mock embedder. \
                         Download all-MiniLM-L6-v2 ONNX model to {:?}",
                        default_local_model_dir()
                    );
                    Ok(Arc::new(MockEmbedder::new(dims)))
                }
            }
        }
        #[cfg(not(feature = "local-embeddings"))]
        "local" => {
            tracing::warn!(
                "Local embeddings requested but 'local-embeddings' feature is not enabled. \
                 Falling back to mock embedder."
            );
            Ok(Arc::new(MockEmbedder::new(dims)))
        }
        "mock" => Ok(Arc::new(MockEmbedder::new(dims))),
        other => Err(EmbedError::Config(format!(
            "Unknown embedding provider '{}'. Valid: local, openai, mock",
            other
        ))),
    }
}

/// Default directory for local embedding model files.
pub fn default_local_model_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("contextd").join("models").join("embeddings"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_mock() {
        let embedder = build_embedder(&EmbedderSpec::mock(64)).unwrap();
        assert_eq!(embedder.name(), "mock");
        assert_eq!(embedder.dimensions(), 64);
    }

    #[test]
    fn test_build_mock_default_dims() {
        let spec = EmbedderSpec {
            provider: "mock".to_string(),
            ..Default::default()
        };
        let embedder = build_embedder(&spec).unwrap();
        assert_eq!(embedder.dimensions(), DEFAULT_EMBEDDING_DIMS);
    }

    #[test]
    fn test_build_openai_requires_key() {
        let spec = EmbedderSpec {
            provider: "openai".to_string(),
            ..Default::default()
        };
        let err = build_embedder(&spec).err().unwrap();
        assert!(matches!(err, EmbedError::Config(_)));
    }

    #[test]
    fn test_build_openai_with_key() {
        let spec = EmbedderSpec {
            provider: "openai".to_string(),
            openai_api_key: Some("sk-test".to_string()),
            dimensions: Some(256),
            ..Default::default()
        };
        let embedder = build_embedder(&spec).unwrap();
        assert_eq!(embedder.name(), "openai");
        assert_eq!(embedder.dimensions(), 256);
    }

    #[test]
    fn test_build_unknown_provider() {
        let spec = EmbedderSpec {
            provider: "word2vec".to_string(),
            ..Default::default()
        };
        assert!(build_embedder(&spec).is_err());
    }

    #[cfg(not(feature = "local-embeddings"))]
    #[test]
    fn test_local_without_feature_falls_back_to_mock() {
        let spec = EmbedderSpec {
            provider: "local".to_string(),
            dimensions: Some(32),
            ..Default::default()
        };
        let embedder = build_embedder(&spec).unwrap();
        assert_eq!(embedder.name(), "mock");
        assert_eq!(embedder.dimensions(), 32);
    }
}
