//! CLI command handlers.

pub mod add;
pub mod clear;
pub mod purge;
pub mod query;
pub mod recent;
pub mod serve;
pub mod stats;
pub mod status;
pub mod window;

use std::io::Write;

use anyhow::Result;
use console::Style;
use contextd_client::ContextClient;
use contextd_config::{ContextdConfig, ServerConfig};
use serde::Serialize;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Server URL to connect to.
    pub server_url: String,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Merged configuration.
    pub config: ContextdConfig,
}

impl Context {
    /// Client for the configured server.
    pub fn client(&self) -> Result<ContextClient> {
        Ok(ContextClient::builder()
            .base_url(&self.server_url)
            .build()?)
    }

    /// Turn a client error into a user-facing error.
    pub fn api_error(&self, err: contextd_client::Error) -> anyhow::Error {
        if err.is_connect_error() {
            anyhow::anyhow!(
                "cannot reach contextd at {} (start it with: contextd serve)",
                self.server_url
            )
        } else {
            anyhow::Error::new(err)
        }
    }
}

/// URL a client should use to reach a server started with `config`.
///
/// Wildcard bind addresses are mapped to loopback.
pub fn default_server_url(config: &ServerConfig) -> String {
    let host = match config.bind.as_str() {
        "0.0.0.0" | "" => "127.0.0.1",
        "::" => "[::1]",
        other if other.contains(':') && !other.starts_with('[') => {
            return format!("http://[{}]:{}", other, config.port);
        }
        other => other,
    };
    format!("http://{}:{}", host, config.port)
}

/// Pretty-print a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ask for a y/N confirmation on stderr. `yes` skips the prompt.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let dim = Style::new().dim();

    eprintln!("{}", prompt);
    eprint!("Continue? [y/N] ");
    std::io::stderr().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    if !input.trim().eq_ignore_ascii_case("y") {
        eprintln!("{}", dim.apply_to("Aborted."));
        return Ok(false);
    }
    Ok(true)
}

/// First `max` characters of `text` on one line, with `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    match flat.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}
