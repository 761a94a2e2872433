//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]                 # HTTP listener
//! [store]                  # database and retrieval tunables
//! [embedding]              # embedding provider
//! [embedding.openai]
//! [embedding.local]
//! [logging]                # log file output
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Application name used for platform directories.
pub const APP_NAME: &str = "contextd";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextdConfig {
    /// HTTP server settings.
    pub server: Option<ServerConfig>,
    /// Storage and retrieval settings.
    pub store: Option<StoreConfig>,
    /// Embedding provider configuration.
    pub embedding: Option<EmbeddingConfig>,
    /// Log output settings.
    pub logging: Option<LoggingConfig>,
}

impl ContextdConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: ContextdConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.store.is_some() {
            self.store = other.store;
        }

        if other.embedding.is_some() {
            self.embedding = other.embedding;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Server section, or defaults.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Store section, or defaults.
    pub fn store(&self) -> StoreConfig {
        self.store.clone().unwrap_or_default()
    }

    /// Embedding section, or defaults.
    pub fn embedding(&self) -> EmbeddingConfig {
        self.embedding.clone().unwrap_or_default()
    }

    /// Logging section, or defaults.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref store) = self.store {
            store.validate()?;
        }
        if let Some(ref server) = self.server
            && server.max_body_size == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "server.max_body_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Enable request logging.
    pub request_logging: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            request_logging: true,
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Largest accepted `max_query_results`.
pub const MAX_QUERY_RESULTS: usize = 20;

/// Storage and retrieval configuration.
///
/// ```toml
/// [store]
/// path = "~/.local/share/contextd/contexts.db"
/// compression_threshold = 1000
/// max_query_results = 20
/// id_strategy = "deterministic"   # or "unique"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file. Defaults to the platform data dir.
    pub path: Option<PathBuf>,
    /// Keep everything in memory; nothing survives a restart.
    pub ephemeral: bool,
    /// Characters above which content is compressed before embedding.
    pub compression_threshold: usize,
    /// Upper bound on results per query.
    pub max_query_results: usize,
    /// "deterministic" or "unique".
    pub id_strategy: String,
    /// Seconds allowed for one embedding call.
    pub embed_timeout_secs: u64,
    /// Seconds allowed for one index call.
    pub store_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            ephemeral: false,
            compression_threshold: 1000,
            max_query_results: MAX_QUERY_RESULTS,
            id_strategy: "deterministic".to_string(),
            embed_timeout_secs: 30,
            store_timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    /// Resolved database path.
    pub fn database_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
                .join("contexts.db")
        })
    }

    fn validate(&self) -> Result<()> {
        let invalid = |field: &str, message: &str| ConfigError::InvalidValue {
            field: format!("store.{}", field),
            message: message.to_string(),
        };

        if !matches!(self.id_strategy.as_str(), "deterministic" | "unique") {
            return Err(invalid(
                "id_strategy",
                "expected \"deterministic\" or \"unique\"",
            ));
        }
        if self.max_query_results == 0 || self.max_query_results > MAX_QUERY_RESULTS {
            return Err(invalid(
                "max_query_results",
                &format!("must be between 1 and {}", MAX_QUERY_RESULTS),
            ));
        }
        if self.embed_timeout_secs == 0 || self.store_timeout_secs == 0 {
            return Err(invalid("*_timeout_secs", "timeouts must be greater than zero"));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Embedding provider configuration.
///
/// ```toml
/// [embedding]
/// provider = "local"        # "local", "openai", or "mock"
/// dimensions = 384
///
/// [embedding.openai]
/// model = "text-embedding-3-small"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider: "local" (ONNX), "openai", or "mock".
    pub provider: EmbeddingProvider,
    /// Output embedding dimensions. Default depends on provider.
    pub dimensions: Option<usize>,
    /// OpenAI-specific embedding settings.
    pub openai: Option<EmbeddingOpenAiConfig>,
    /// Local ONNX-specific settings.
    pub local: Option<EmbeddingLocalConfig>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Local,
            dimensions: None,
            openai: None,
            local: None,
        }
    }
}

impl EmbeddingConfig {
    /// Effective dimensions for the configured provider.
    pub fn effective_dimensions(&self) -> usize {
        if let Some(d) = self.dimensions {
            return d;
        }
        match self.provider {
            EmbeddingProvider::Local | EmbeddingProvider::Mock => 384,
            EmbeddingProvider::OpenAi => self
                .openai
                .as_ref()
                .and_then(|c| c.dimensions)
                .unwrap_or(1536),
        }
    }
}

/// Supported embedding providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Local ONNX Runtime inference.
    Local,
    /// OpenAI-compatible embeddings API.
    OpenAi,
    /// Deterministic hash-based vectors.
    Mock,
}

impl EmbeddingProvider {
    /// Provider name as understood by the embedder factory.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

/// OpenAI embedding provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingOpenAiConfig {
    /// Model name.
    pub model: String,
    /// Override dimensions (OpenAI supports reduced output).
    pub dimensions: Option<usize>,
    /// Custom base URL (for proxies or compatible servers).
    pub base_url: Option<String>,
    /// API key (prefer the OPENAI_API_KEY env var).
    pub api_key: Option<String>,
}

impl Default for EmbeddingOpenAiConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            base_url: None,
            api_key: None,
        }
    }
}

/// Local ONNX embedding settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingLocalConfig {
    /// Path to ONNX model file.
    pub model_path: Option<PathBuf>,
    /// Path to tokenizer.json file.
    pub tokenizer_path: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write JSON logs to a daily rolling file.
    pub file: bool,
    /// Directory for log files. Defaults to `<config dir>/logs`.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: true,
            directory: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = ContextdConfig::from_toml("").unwrap();
        assert_eq!(config, ContextdConfig::new());
        assert_eq!(config.server().port, 8000);
        assert_eq!(config.store().compression_threshold, 1000);
        assert_eq!(config.embedding().provider, EmbeddingProvider::Local);
        assert!(config.logging().file);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
port = 9100
bind = "0.0.0.0"
request_logging = false

[store]
path = "/tmp/contexts.db"
compression_threshold = 2000
id_strategy = "unique"

[embedding]
provider = "openai"

[embedding.openai]
model = "text-embedding-3-large"
dimensions = 256
base_url = "http://localhost:4000/v1"

[logging]
file = false
"#;
        let config = ContextdConfig::from_toml(toml).unwrap();

        let server = config.server();
        assert_eq!(server.port, 9100);
        assert_eq!(server.bind, "0.0.0.0");
        assert!(!server.request_logging);
        assert_eq!(server.max_body_size, ServerConfig::default().max_body_size);

        let store = config.store();
        assert_eq!(store.database_path(), PathBuf::from("/tmp/contexts.db"));
        assert_eq!(store.compression_threshold, 2000);
        assert_eq!(store.max_query_results, 20);
        assert_eq!(store.id_strategy, "unique");

        let embedding = config.embedding();
        assert_eq!(embedding.provider, EmbeddingProvider::OpenAi);
        assert_eq!(embedding.effective_dimensions(), 256);

        assert!(!config.logging().file);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_provider_fails() {
        assert!(ContextdConfig::from_toml("[embedding]\nprovider = \"word2vec\"").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ContextdConfig::from_toml("[store]\nid_strategy = \"random\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let config = ContextdConfig::from_toml("[store]\nmax_query_results = 0").unwrap();
        assert!(config.validate().is_err());

        let config = ContextdConfig::from_toml("[store]\nmax_query_results = 50").unwrap();
        assert!(config.validate().is_err());

        let config = ContextdConfig::from_toml("[store]\nmax_query_results = 20").unwrap();
        assert!(config.validate().is_ok());

        let config = ContextdConfig::from_toml("[server]\nmax_body_size = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_overrides_sections() {
        let mut base = ContextdConfig::from_toml("[server]\nport = 1\n[store]\nephemeral = true").unwrap();
        let overlay = ContextdConfig::from_toml("[server]\nport = 2").unwrap();
        base.merge(overlay);

        assert_eq!(base.server().port, 2);
        assert!(base.store().ephemeral);
    }

    #[test]
    fn test_to_toml_round_trip() {
        let mut config = ContextdConfig::new();
        config.store = Some(StoreConfig {
            ephemeral: true,
            ..Default::default()
        });
        let text = config.to_toml().unwrap();
        assert_eq!(ContextdConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_effective_dimensions_defaults() {
        let mut embedding = EmbeddingConfig::default();
        assert_eq!(embedding.effective_dimensions(), 384);
        embedding.provider = EmbeddingProvider::OpenAi;
        assert_eq!(embedding.effective_dimensions(), 1536);
        embedding.dimensions = Some(64);
        assert_eq!(embedding.effective_dimensions(), 64);
    }
}
