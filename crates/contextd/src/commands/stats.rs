//! Stats command - per-session aggregates.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::Context;

/// Arguments for the stats command.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Session to summarize
    #[arg(short, long, env = "CONTEXTD_SESSION")]
    pub session: String,
}

/// Run the stats command.
pub async fn run(args: StatsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let stats = client
        .context()
        .stats(&args.session)
        .await
        .map_err(|e| ctx.api_error(e))?;

    if ctx.json_output {
        return super::print_json(&stats);
    }

    let dim = Style::new().dim();

    println!();
    println!("{}", style(format!("Session {}", stats.session_id)).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Messages:"), stats.total_messages);

    if stats.total_messages == 0 {
        println!();
        return Ok(());
    }

    for (message_type, count) in &stats.by_type {
        println!("    {:<16} {}", message_type, count);
    }
    if let Some(oldest) = &stats.oldest_message {
        println!("  {} {}", dim.apply_to("Oldest:"), oldest);
    }
    if let Some(newest) = &stats.newest_message {
        println!("  {} {}", dim.apply_to("Newest:"), newest);
    }
    println!();

    Ok(())
}
