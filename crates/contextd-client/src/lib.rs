//! HTTP client SDK for the contextd context store.
//!
//! This crate provides a typed client for the contextd server API and a
//! prompt assembler for the retrieved context.
//!
//! # Example
//!
//! ```no_run
//! use contextd_client::{ContextClient, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = ContextClient::builder()
//!     .base_url("http://localhost:8000")
//!     .build()?;
//!
//! if client.health().is_healthy().await {
//!     println!("Server is healthy!");
//! }
//!
//! let session = client.session("8b1c0d6e");
//! session.add("user", "read src/main.rs").await?;
//! session.add("assistant", r#"{"tool": "read_file", "args": {"path": "src/main.rs"}}"#).await?;
//!
//! let window = session.context_window("now add error handling").await?;
//! println!("{}", window);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Context**: add, query, recent, clear, stats, purge
//! - **Health**: liveness and service status
//! - **Sessions**: [`SessionContext`] binds every call to one session id

pub mod api;
pub mod client;
pub mod error;
pub mod session;
pub mod types;
pub mod window;

pub use api::{ContextApi, HealthApi, RecentQuery};
pub use client::{ClientBuilder, ContextClient, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use session::{DEFAULT_RECENT_ITEMS, DEFAULT_RELEVANT_ITEMS, SessionContext};
pub use types::*;
pub use window::{
    ContextWindow, MAX_RELEVANT_ITEMS, RECENT_PREVIEW_CHARS, RELEVANT_PREVIEW_CHARS,
};
