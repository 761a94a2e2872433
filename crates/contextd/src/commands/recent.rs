//! Recent command - lists a session's newest turns.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use contextd_client::RecentQuery;

use super::Context;

const PREVIEW_CHARS: usize = 120;

/// Arguments for the recent command.
#[derive(Args, Debug)]
pub struct RecentArgs {
    /// Session to list
    #[arg(short, long, env = "CONTEXTD_SESSION")]
    pub session: String,

    /// Number of turns to show
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Number of newest turns to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Oldest first, the way the conversation was read
    #[arg(long)]
    pub chronological: bool,
}

/// Run the recent command.
pub async fn run(args: RecentArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let page = client
        .context()
        .recent(&RecentQuery {
            session_id: args.session.clone(),
            limit: Some(args.limit),
            offset: Some(args.offset),
        })
        .await
        .map_err(|e| ctx.api_error(e))?;

    if ctx.json_output {
        return super::print_json(&page);
    }

    let dim = Style::new().dim();

    if page.messages.is_empty() {
        println!("{}", dim.apply_to("No context in this window."));
        return Ok(());
    }

    println!();
    println!(
        "{} {}",
        style(format!("Session {}", args.session)).bold(),
        dim.apply_to(format!(
            "(showing {} of {}, offset {})",
            page.messages.len(),
            page.total_count,
            args.offset
        ))
    );
    println!("{}", dim.apply_to("─".repeat(60)));

    let mut messages = page.messages;
    if args.chronological {
        messages.reverse();
    }
    for message in &messages {
        println!(
            "{} {}: {}",
            dim.apply_to(&message.timestamp),
            style(&message.metadata.role).bold(),
            super::truncate(&message.content, PREVIEW_CHARS)
        );
    }
    println!();

    Ok(())
}
