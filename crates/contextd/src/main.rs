//! contextd - session-scoped semantic context store
//!
//! Main entry point for the contextd CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;

use commands::{add, clear, purge, query, recent, serve, stats, status, window};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// contextd - semantic conversation memory for coding agents
#[derive(Parser)]
#[command(name = "contextd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (default: derived from [server] config, http://127.0.0.1:8000)
    #[arg(long, global = true, env = "CONTEXTD_SERVER_URL")]
    pub server: Option<String>,

    /// Config file to use instead of the discovered layers
    #[arg(long, global = true, env = "CONTEXTD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the contextd server
    Serve(serve::ServeArgs),

    /// Show server status and stored context count
    Status(status::StatusArgs),

    /// Store a conversation turn
    Add(add::AddArgs),

    /// Search a session for semantically similar turns
    Query(query::QueryArgs),

    /// List the most recent turns of a session
    Recent(recent::RecentArgs),

    /// Render the prompt context an agent would see for a request
    Window(window::WindowArgs),

    /// Show statistics for a session
    Stats(stats::StatsArgs),

    /// Delete every turn of a session
    Clear(clear::ClearArgs),

    /// Delete every turn of every session
    Purge(purge::PurgeArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, warnings) = match &cli.config {
        Some(path) => (contextd_config::load_config_file(path)?, Vec::new()),
        None => {
            let loaded = contextd_config::load_config(None)?;
            (loaded.config, loaded.warnings)
        }
    };

    let _guard = logging::init(cli.verbose, &config.logging());

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let server_url = cli
        .server
        .unwrap_or_else(|| commands::default_server_url(&config.server()));

    // Create context for commands
    let ctx = commands::Context {
        server_url,
        json_output: cli.json,
        verbose: cli.verbose,
        config,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Add(args) => add::run(args, &ctx).await,
        Commands::Query(args) => query::run(args, &ctx).await,
        Commands::Recent(args) => recent::run(args, &ctx).await,
        Commands::Window(args) => window::run(args, &ctx).await,
        Commands::Stats(args) => stats::run(args, &ctx).await,
        Commands::Clear(args) => clear::run(args, &ctx).await,
        Commands::Purge(args) => purge::run(args, &ctx).await,
    }
}
