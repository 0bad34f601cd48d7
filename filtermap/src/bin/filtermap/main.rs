mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    apply::{self, ApplyArgs, handle_apply},
    check::{self, CheckArgs, handle_check},
    form::{self, FormArgs, handle_form},
};
use context::ConfigContext;
use output::{OutputFormat, Printer, Status};

const ENVIRONMENT_HELP: &str = "\
Environment:
  FILTERMAP_CONFIG    Views configuration file, same as --config
  RUST_LOG            Library log filter, e.g. 'filtermap=trace' (--verbose sets 'filtermap=debug')
";

/// Inspect and exercise query parameter filter maps declared in filtermap.toml.
#[derive(Parser)]
#[command(name = "filtermap", version, after_long_help = ENVIRONMENT_HELP)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Views configuration file (defaults to filtermap.toml here or in a parent directory)
    #[arg(long, short = 'c', env = "FILTERMAP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Result format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,

    /// Only print errors
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Print trace lines and enable debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Plain text and ASCII tables
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every configured view and list its filters
    #[command(after_long_help = check::EXAMPLES)]
    Check(CheckArgs),

    /// Filter a JSON array of rows with a query string
    #[command(after_long_help = apply::EXAMPLES)]
    Apply(ApplyArgs),

    /// Render a view's filter form as HTML
    #[command(after_long_help = form::EXAMPLES)]
    Form(FormArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "filtermap=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let printer = Printer::new(cli.output, cli.quiet, cli.verbose, !cli.no_color);
    if let Err(err) = run(cli, &printer) {
        printer.status(Status::Failure, format_args!("{err:#}"));
        std::process::exit(1);
    }
}

fn run(cli: Cli, printer: &Printer) -> Result<()> {
    let ctx = ConfigContext::load(cli.config.as_deref())?;
    printer.status(Status::Trace, format_args!("using configuration {}", ctx.config_path.display()));

    match cli.command {
        Commands::Check(args) => handle_check(args, &ctx, printer),
        Commands::Apply(args) => handle_apply(args, &ctx, printer),
        Commands::Form(args) => handle_form(args, &ctx, printer),
    }
}
