//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use contextd_embed::MockEmbedder;
use contextd_server::{AppState, Server, ServerConfig};
use contextd_store::{
    ContextService, InMemoryVectorIndex, ServiceConfig, SqliteVectorIndex, VectorIndex,
};

/// Embedding dimensions used by every test server.
pub const TEST_DIMS: usize = 64;

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Temporary directory for test data.
    pub temp_dir: TempDir,
}

impl TestServer {
    /// Start a server backed by an in-memory index.
    pub async fn start() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let index: Arc<dyn VectorIndex> = Arc::new(InMemoryVectorIndex::new(TEST_DIMS));
        Self::start_with_index(index, temp_dir).await
    }

    /// Start a server backed by a SQLite index inside `temp_dir`.
    pub async fn start_sqlite(temp_dir: TempDir) -> Result<Self> {
        let index: Arc<dyn VectorIndex> =
            Arc::new(SqliteVectorIndex::open(db_path(temp_dir.path()), "mock", TEST_DIMS)?);
        Self::start_with_index(index, temp_dir).await
    }

    async fn start_with_index(index: Arc<dyn VectorIndex>, temp_dir: TempDir) -> Result<Self> {
        let service = ContextService::new(
            index,
            Arc::new(MockEmbedder::new(TEST_DIMS)),
            ServiceConfig::default(),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);
        let server = Server::from_state(AppState::new(service, config));

        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            handle,
            temp_dir,
        })
    }

    /// Stop the server, keeping its data directory.
    pub async fn shutdown(self) -> TempDir {
        self.handle.abort();
        let _ = self.handle.await;
        self.temp_dir
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// GET request builder.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// POST request builder.
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{}", self.base_url(), path))
    }

    /// DELETE request builder.
    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(format!("{}{}", self.base_url(), path))
    }
}

/// Database file used by SQLite-backed test servers.
pub fn db_path(dir: &Path) -> std::path::PathBuf {
    dir.join("contexts.db")
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
