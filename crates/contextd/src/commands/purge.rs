//! Purge command - deletes all stored context.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::Context;

/// Arguments for the purge command.
#[derive(Args, Debug)]
pub struct PurgeArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Run the purge command.
pub async fn run(args: PurgeArgs, ctx: &Context) -> Result<()> {
    let red = Style::new().red().bold();
    let prompt = format!(
        "{} This deletes every stored turn of every session on {}.",
        red.apply_to("Warning:"),
        ctx.server_url
    );
    if !super::confirm(&prompt, args.yes)? {
        return Ok(());
    }

    let client = ctx.client()?;
    let response = client
        .context()
        .purge_all()
        .await
        .map_err(|e| ctx.api_error(e))?;

    if ctx.json_output {
        super::print_json(&response)?;
    } else {
        println!("{}", Style::new().green().apply_to(&response.message));
    }

    Ok(())
}
