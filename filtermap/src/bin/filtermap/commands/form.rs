use anyhow::Result;
use clap::Args;
use filtermap::QueryParams;
use serde_json::json;

use crate::context::ConfigContext;
use crate::output::{Printer, Status};

pub const EXAMPLES: &str = "\
Examples:
  filtermap form --view profiles                          Unbound form
  filtermap form --view profiles --query 'gender=Male'    Form bound to a query, errors inline
";

#[derive(Args)]
pub struct FormArgs {
    /// View whose filter form to render
    #[arg(long)]
    pub view: String,

    /// Query string the form is bound to
    #[arg(long, default_value = "")]
    pub query: String,
}

pub fn handle_form(args: FormArgs, ctx: &ConfigContext, printer: &Printer) -> Result<()> {
    let view = ctx.config.view(&args.view)?;
    let backend = ctx.config.backend()?;
    let html = backend.to_html(&QueryParams::parse(&args.query), view)?;

    if printer.is_json() {
        printer.json(&json!({ "view": args.view, "html": html }))?;
    } else if html.is_empty() {
        printer.status(Status::Warning, format_args!("view '{}' declares no filter map", args.view));
    } else {
        println!("{html}");
    }
    Ok(())
}
