//! Window command - prints the assembled prompt context for a request.

use anyhow::Result;
use clap::Args;
use contextd_client::{DEFAULT_RECENT_ITEMS, DEFAULT_RELEVANT_ITEMS};
use serde::Serialize;

use super::Context;

/// Arguments for the window command.
#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Session to draw history from
    #[arg(short, long, env = "CONTEXTD_SESSION")]
    pub session: String,

    /// The request the agent is about to answer
    pub request: String,

    /// Semantic matches to fetch
    #[arg(long, default_value_t = DEFAULT_RELEVANT_ITEMS)]
    pub relevant: usize,

    /// Recent turns to fetch
    #[arg(long, default_value_t = DEFAULT_RECENT_ITEMS)]
    pub recent: usize,

    /// Text placed before the retrieved sections
    #[arg(long)]
    pub preamble: Option<String>,
}

#[derive(Debug, Serialize)]
struct WindowOutput {
    session_id: String,
    has_history: bool,
    prompt: String,
}

/// Run the window command.
pub async fn run(args: WindowArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let mut window = client
        .session(&args.session)
        .context_window_with(&args.request, args.relevant, args.recent)
        .await
        .map_err(|e| ctx.api_error(e))?;
    if let Some(preamble) = args.preamble {
        window = window.with_preamble(preamble);
    }

    if ctx.json_output {
        super::print_json(&WindowOutput {
            session_id: args.session,
            has_history: window.has_history(),
            prompt: window.render(),
        })
    } else {
        println!("{}", window);
        Ok(())
    }
}
