//! Query command - semantic search within a session.

use anyhow::Result;
use clap::Args;
use clap::builder::PossibleValuesParser;
use console::{Style, style};
use contextd_client::QueryContextRequest;
use contextd_store::MessageType;

use super::Context;

/// Characters of content shown per hit.
const PREVIEW_CHARS: usize = 120;

/// Arguments for the query command.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Session to search
    #[arg(short, long, env = "CONTEXTD_SESSION")]
    pub session: String,

    /// Text to find similar turns for
    pub query: String,

    /// Maximum number of results (the server caps this)
    #[arg(short = 'k', long, default_value_t = 5)]
    pub top_k: usize,

    /// Only return turns of this type
    #[arg(
        short = 't',
        long = "type",
        value_parser = PossibleValuesParser::new(MessageType::all().map(|t| t.as_str()))
    )]
    pub message_type: Option<String>,

    /// Print full content instead of a one-line preview
    #[arg(long)]
    pub full: bool,
}

/// Run the query command.
pub async fn run(args: QueryArgs, ctx: &Context) -> Result<()> {
    let mut request = QueryContextRequest::new(&args.session, &args.query).with_top_k(args.top_k);
    if let Some(message_type) = &args.message_type {
        request = request.with_type(message_type);
    }

    let client = ctx.client()?;
    let response = client
        .context()
        .query(&request)
        .await
        .map_err(|e| ctx.api_error(e))?;

    if ctx.json_output {
        return super::print_json(&response);
    }

    let dim = Style::new().dim();
    let cyan = Style::new().cyan();

    if response.messages.is_empty() {
        println!("{}", dim.apply_to("No matching context."));
        return Ok(());
    }

    println!();
    println!(
        "{} ({} result{})",
        style(format!("Matches for \"{}\"", args.query)).bold(),
        response.total_count,
        if response.total_count == 1 { "" } else { "s" }
    );
    println!("{}", dim.apply_to("─".repeat(60)));

    for (i, hit) in response.messages.iter().enumerate() {
        let content = if args.full {
            hit.content.clone()
        } else {
            super::truncate(&hit.content, PREVIEW_CHARS)
        };
        println!(
            "{:>3}. {} {} {}",
            i + 1,
            dim.apply_to(format!("{:.4}", hit.distance)),
            cyan.apply_to(format!("[{}]", hit.metadata.message_type)),
            content
        );
        if ctx.verbose {
            println!(
                "     {} {} {} {}",
                dim.apply_to(&hit.metadata.role),
                dim.apply_to(&hit.metadata.timestamp),
                dim.apply_to("id"),
                dim.apply_to(&hit.id)
            );
        }
    }
    println!();

    Ok(())
}
