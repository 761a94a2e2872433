//! Clear command - deletes one session's turns.

use anyhow::Result;
use clap::Args;
use console::Style;
use contextd_client::ClearContextResponse;

use super::Context;

/// Arguments for the clear command.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Session to clear
    #[arg(short, long, env = "CONTEXTD_SESSION")]
    pub session: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Run the clear command.
pub async fn run(args: ClearArgs, ctx: &Context) -> Result<()> {
    let prompt = format!("This deletes every stored turn of session '{}'.", args.session);
    if !super::confirm(&prompt, args.yes)? {
        return Ok(());
    }

    let client = ctx.client()?;
    let response: ClearContextResponse = client
        .context()
        .clear(&args.session)
        .await
        .map_err(|e| ctx.api_error(e))?;

    if ctx.json_output {
        super::print_json(&response)?;
    } else {
        println!(
            "{} {} turn{} from session {}",
            Style::new().green().apply_to("Deleted"),
            response.deleted_count,
            if response.deleted_count == 1 { "" } else { "s" },
            args.session
        );
    }

    Ok(())
}
