use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use filtermap::{FilterError, MemoryCollection, QueryParams};
use serde::Serialize;
use serde_json::Value;

use crate::context::ConfigContext;
use crate::output::{Printer, Report, Status};

pub const EXAMPLES: &str = "\
Examples:
  filtermap apply --view profiles --data rows.json --query 'first_name=Jo&gender=Male'
  filtermap --output json apply --view profiles --data rows.json --query 'born_after=1990-01-01'

Invalid parameters print one error per field and exit with status 1.
With --output json the errors print as a {field: [messages]} object.
";

#[derive(Args)]
pub struct ApplyArgs {
    /// View whose filter map to apply
    #[arg(long)]
    pub view: String,

    /// JSON file holding an array of rows
    #[arg(long)]
    pub data: PathBuf,

    /// Query string, e.g. 'first_name=Jo&gender=Male'
    #[arg(long, default_value = "")]
    pub query: String,
}

#[derive(Serialize)]
pub struct ApplyReport {
    view: String,
    query: String,
    total: usize,
    matched: usize,
    rows: Vec<Value>,
}

impl ApplyReport {
    /// Top-level keys across all rows, in first-seen order.
    fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            if let Value::Object(object) = row {
                for key in object.keys() {
                    if !columns.contains(&key.as_str()) {
                        columns.push(key);
                    }
                }
            }
        }
        columns
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

impl Report for ApplyReport {
    fn table(&self, printer: &Printer) -> Table {
        let columns = self.columns();
        if columns.is_empty() {
            let mut table = printer.table(["Rows"]);
            table.add_row(vec![Cell::new("no rows matched")]);
            return table;
        }
        let mut table = printer.table(&columns);
        for row in &self.rows {
            table.add_row(columns.iter().map(|column| Cell::new(cell_text(row.get(column)))));
        }
        table
    }

    fn summary(&self) -> String {
        format!("{}/{}", self.matched, self.total)
    }
}

pub fn handle_apply(args: ApplyArgs, ctx: &ConfigContext, printer: &Printer) -> Result<()> {
    let view = ctx.config.view(&args.view)?;
    let backend = ctx.config.backend()?;

    let text = fs::read_to_string(&args.data).with_context(|| format!("Failed to read {}", args.data.display()))?;
    let rows = MemoryCollection::from_json(&text).with_context(|| format!("Failed to parse {}", args.data.display()))?;
    let total = rows.len();
    printer.status(Status::Trace, format_args!("loaded {total} row(s) from {}", args.data.display()));

    let params = QueryParams::parse(&args.query);
    let filtered = match backend.filter_collection(&params, rows, view) {
        Ok(filtered) => filtered,
        Err(FilterError::Validation(errors)) => {
            if printer.is_json() {
                printer.json(&errors.detail())?;
            } else {
                for issue in &errors.issues {
                    printer.status(Status::Failure, format_args!("{}: {}", issue.field, issue.message));
                }
            }
            anyhow::bail!("invalid filter parameters for view '{}'", args.view);
        }
        Err(other) => return Err(other.into()),
    };

    let matched = filtered.len();
    printer.report(&ApplyReport {
        view: args.view,
        query: params.to_query_string(),
        total,
        matched,
        rows: filtered.into_rows(),
    })?;
    printer.status(Status::Note, format_args!("{matched} of {total} row(s) matched"));
    Ok(())
}
