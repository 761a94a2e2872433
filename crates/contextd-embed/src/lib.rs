//! Text embedding providers for contextd.
//!
//! Provides a single [`Embedder`] abstraction over several backends:
//!
//! - [`MockEmbedder`]: deterministic hash-seeded vectors for tests and offline use
//! - [`OpenAiEmbedder`]: any OpenAI-compatible `/embeddings` endpoint
//! - `LocalEmbedder`: ONNX Runtime inference (requires `local-embeddings`)
//!
//! Use [`build_embedder`] to construct one from an [`EmbedderSpec`].

pub mod embedder;
pub mod error;
pub mod factory;
#[cfg(feature = "local-embeddings")]
pub mod local;
pub mod openai;

pub use embedder::{
    DEFAULT_EMBEDDING_DIMS, Embedder, MockEmbedder, SharedEmbedder, cosine_similarity,
    euclidean_distance, normalize,
};
pub use error::{EmbedError, Result};
pub use factory::{EmbedderSpec, build_embedder, default_local_model_dir};
#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbedder;
pub use openai::{OpenAiEmbedder, OpenAiEmbedderConfig};
