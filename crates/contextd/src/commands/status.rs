//! Status command - shows server status and stored context count.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use super::Context;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Status response for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    running: bool,
    version: Option<String>,
    total_contexts: Option<usize>,
    server_url: String,
}

/// Run the status command.
pub async fn run(_args: StatusArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    let result = match client.health().check().await {
        Ok(health) => client
            .health()
            .status()
            .await
            .map(|status| (health, status)),
        Err(e) => Err(e),
    };

    match result {
        Ok((health, status)) => {
            if ctx.json_output {
                let output = StatusOutput {
                    running: true,
                    version: Some(health.version),
                    total_contexts: Some(status.total_contexts),
                    server_url: ctx.server_url.clone(),
                };
                super::print_json(&output)?;
            } else {
                let green = Style::new().green();
                let dim = Style::new().dim();

                println!();
                println!("{}", style("contextd Status").bold());
                println!("{}", dim.apply_to("─".repeat(40)));
                println!();
                println!(
                    "  {} {}",
                    dim.apply_to("Status:"),
                    green.apply_to("● running")
                );
                println!("  {} {}", dim.apply_to("Service:"), status.service);
                println!("  {} {}", dim.apply_to("Version:"), health.version);
                println!("  {} {}", dim.apply_to("Contexts:"), status.total_contexts);
                println!("  {} {}", dim.apply_to("Server:"), ctx.server_url);
                println!();
            }
        }
        Err(e) => {
            if ctx.json_output {
                let output = StatusOutput {
                    running: false,
                    version: None,
                    total_contexts: None,
                    server_url: ctx.server_url.clone(),
                };
                super::print_json(&output)?;
            } else {
                let red = Style::new().red();
                let dim = Style::new().dim();

                println!();
                println!("{}", style("contextd Status").bold());
                println!("{}", dim.apply_to("─".repeat(40)));
                println!();
                println!(
                    "  {} {}",
                    dim.apply_to("Status:"),
                    red.apply_to("● not running")
                );
                println!("  {} {}", dim.apply_to("Server:"), ctx.server_url);

                if ctx.verbose {
                    println!();
                    println!("  {} {}", dim.apply_to("Error:"), e);
                }

                println!();
                println!("  {}", dim.apply_to("Start the server with: contextd serve"));
                println!();
            }
        }
    }

    Ok(())
}
