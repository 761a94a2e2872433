//! Serve command - runs the contextd HTTP server in the foreground.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};

use contextd_config::{EmbeddingConfig, EmbeddingProvider};
use contextd_embed::{EmbedderSpec, build_embedder};
use contextd_server::{Server, ServerConfig};
use contextd_store::{
    ContextService, IdStrategy, InMemoryVectorIndex, ServiceConfig, SqliteVectorIndex,
    VectorIndex,
};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// SQLite database file (overrides config)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Keep contexts in memory only; nothing survives a restart
    #[arg(long)]
    pub ephemeral: bool,

    /// Embedding provider (overrides config)
    #[arg(long, value_enum)]
    pub embedder: Option<ProviderArg>,

    /// Derive a fresh id for every add instead of upserting identical turns
    #[arg(long)]
    pub unique_ids: bool,

    /// Allow cross-origin requests from browsers
    #[arg(long)]
    pub cors: bool,

    /// Disable per-request log lines
    #[arg(long)]
    pub no_request_logging: bool,
}

/// Embedding provider selectable on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProviderArg {
    /// ONNX Runtime model on this machine
    Local,
    /// OpenAI-compatible embeddings API
    Openai,
    /// Deterministic hash vectors (no semantic similarity)
    Mock,
}

impl From<ProviderArg> for EmbeddingProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Local => EmbeddingProvider::Local,
            ProviderArg::Openai => EmbeddingProvider::OpenAi,
            ProviderArg::Mock => EmbeddingProvider::Mock,
        }
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    ctx.config.validate()?;

    // ── Embedder ────────────────────────────────────────────────────────

    let mut embedding_config = ctx.config.embedding();
    if let Some(provider) = args.embedder {
        embedding_config.provider = provider.into();
    }
    let embedder = build_embedder(&build_embedder_spec(&embedding_config))
        .context("failed to initialize embedding provider")?;
    let dims = embedder.dimensions();
    println!("Embedder: {} ({}d)", embedder.name(), dims);

    // ── Vector index ────────────────────────────────────────────────────

    let mut store_config = ctx.config.store();
    if let Some(path) = args.db {
        store_config.path = Some(path);
    }
    let index: Arc<dyn VectorIndex> = if args.ephemeral || store_config.ephemeral {
        println!("Store: in-memory (ephemeral)");
        Arc::new(InMemoryVectorIndex::new(dims))
    } else {
        let path = store_config.database_path();
        let index = SqliteVectorIndex::open(&path, embedder.name(), dims)
            .with_context(|| format!("failed to open context store {}", path.display()))?;
        println!("Store: {}", path.display());
        Arc::new(index)
    };

    // ── Service ─────────────────────────────────────────────────────────

    let id_strategy = if args.unique_ids {
        IdStrategy::Unique
    } else {
        store_config
            .id_strategy
            .parse::<IdStrategy>()
            .map_err(anyhow::Error::msg)?
    };
    let service_config = ServiceConfig::default()
        .with_compression_threshold(store_config.compression_threshold)
        .with_max_query_results(store_config.max_query_results)
        .with_embed_timeout(Duration::from_secs(store_config.embed_timeout_secs))
        .with_store_timeout(Duration::from_secs(store_config.store_timeout_secs))
        .with_id_strategy(id_strategy);
    if ctx.verbose {
        println!(
            "Retrieval: compression at {} chars, at most {} results, {} ids",
            store_config.compression_threshold, store_config.max_query_results, id_strategy
        );
    }
    let service = ContextService::new(index, embedder, service_config);

    // ── Server ──────────────────────────────────────────────────────────

    let server_section = ctx.config.server();
    let port = args.port.unwrap_or(server_section.port);
    let bind = args.bind.unwrap_or(server_section.bind);
    let addr = bind_address(&bind, port)?;

    let server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_request_logging(server_section.request_logging && !args.no_request_logging)
        .with_max_body_size(server_section.max_body_size)
        .with_cors(args.cors);

    println!("Listening on http://{}", addr);

    Server::new(service, server_config).run().await?;
    Ok(())
}

/// Parse a bind host and port into a socket address.
fn bind_address(bind: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = bind
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .with_context(|| format!("invalid bind address '{}'", bind))?;
    Ok(SocketAddr::new(ip, port))
}

/// Translate the `[embedding]` config section into an embedder spec.
fn build_embedder_spec(config: &EmbeddingConfig) -> EmbedderSpec {
    let openai = config.openai.clone().unwrap_or_default();
    let openai_api_key = openai
        .api_key
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.is_empty());

    let (local_model_path, local_tokenizer_path) = config
        .local
        .as_ref()
        .map(|c| (c.model_path.clone(), c.tokenizer_path.clone()))
        .unwrap_or((None, None));

    EmbedderSpec {
        provider: config.provider.as_str().to_string(),
        openai_api_key,
        openai_model: Some(openai.model),
        openai_base_url: openai.base_url,
        local_model_path,
        local_tokenizer_path,
        dimensions: Some(config.effective_dimensions()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contextd_config::{EmbeddingLocalConfig, EmbeddingOpenAiConfig};

    #[test]
    fn test_bind_address() {
        assert_eq!(
            bind_address("127.0.0.1", 8000).unwrap(),
            "127.0.0.1:8000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            bind_address("[::1]", 9000).unwrap(),
            "[::1]:9000".parse::<SocketAddr>().unwrap()
        );
        assert!(bind_address("localhost", 8000).is_err());
    }

    #[test]
    fn test_spec_for_mock_provider() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Mock,
            dimensions: Some(64),
            ..Default::default()
        };
        let spec = build_embedder_spec(&config);

        assert_eq!(spec.provider, "mock");
        assert_eq!(spec.dimensions, Some(64));
        assert_eq!(build_embedder(&spec).unwrap().dimensions(), 64);
    }

    #[test]
    fn test_spec_for_openai_provider() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::OpenAi,
            openai: Some(EmbeddingOpenAiConfig {
                model: "text-embedding-3-large".to_string(),
                dimensions: Some(256),
                base_url: Some("http://localhost:9999/v1".to_string()),
                api_key: Some("sk-test".to_string()),
            }),
            ..Default::default()
        };
        let spec = build_embedder_spec(&config);

        assert_eq!(spec.provider, "openai");
        assert_eq!(spec.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(spec.openai_model.as_deref(), Some("text-embedding-3-large"));
        assert_eq!(spec.openai_base_url.as_deref(), Some("http://localhost:9999/v1"));
        assert_eq!(spec.dimensions, Some(256));
    }

    #[test]
    fn test_spec_carries_local_paths() {
        let config = EmbeddingConfig {
            local: Some(EmbeddingLocalConfig {
                model_path: Some(PathBuf::from("/models/model.onnx")),
                tokenizer_path: Some(PathBuf::from("/models/tokenizer.json")),
            }),
            ..Default::default()
        };
        let spec = build_embedder_spec(&config);

        assert_eq!(spec.provider, "local");
        assert_eq!(spec.local_model_path, Some(PathBuf::from("/models/model.onnx")));
        assert_eq!(spec.dimensions, Some(384));
    }

    #[test]
    fn test_provider_arg_maps_to_config() {
        assert_eq!(EmbeddingProvider::from(ProviderArg::Openai), EmbeddingProvider::OpenAi);
        assert_eq!(EmbeddingProvider::from(ProviderArg::Mock), EmbeddingProvider::Mock);
    }
}
