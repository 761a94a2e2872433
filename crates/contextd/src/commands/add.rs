//! Add command - stores one conversation turn.

use anyhow::{Result, bail};
use clap::Args;
use console::Style;
use contextd_client::MessageInput;
use serde_json::Value;

use super::Context;

/// Arguments for the add command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Session the turn belongs to
    #[arg(short, long, env = "CONTEXTD_SESSION")]
    pub session: String,

    /// Speaker role (user, assistant, system, tool, ...)
    #[arg(short, long, default_value = "user")]
    pub role: String,

    /// Message text
    pub content: String,

    /// ISO-8601 timestamp (default: server clock)
    #[arg(long)]
    pub timestamp: Option<String>,

    /// Extra metadata as key=value; values that parse as JSON keep their type
    #[arg(short, long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,
}

/// Run the add command.
pub async fn run(args: AddArgs, ctx: &Context) -> Result<()> {
    let mut message = MessageInput::new(&args.role, &args.content);
    if let Some(timestamp) = args.timestamp {
        message = message.with_timestamp(timestamp);
    }
    for pair in &args.meta {
        let (key, value) = parse_meta(pair)?;
        message = message.with_metadata(key, value);
    }

    let client = ctx.client()?;
    let response = client
        .context()
        .add(&args.session, message)
        .await
        .map_err(|e| ctx.api_error(e))?;

    if ctx.json_output {
        super::print_json(&response)?;
    } else {
        let dim = Style::new().dim();
        println!("{} {}", Style::new().green().apply_to("Stored"), response.id);
        if ctx.verbose {
            println!("  {} {}", dim.apply_to("Session:"), args.session);
        }
    }

    Ok(())
}

/// Split `key=value`, reading the value as JSON when it parses.
fn parse_meta(pair: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("metadata must be KEY=VALUE, got '{}'", pair);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("metadata key must not be empty in '{}'", pair);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
