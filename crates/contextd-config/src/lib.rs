//! Configuration system for contextd.
//!
//! Provides TOML-based configuration with:
//! - Typed sections for the server, store, embedding provider, and logging
//! - Config file layering (user config dir + project-local overrides)
//! - Non-fatal load warnings for broken layers

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, default_log_dir, load_config, load_config_file,
    load_config_with_options, save_config, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
