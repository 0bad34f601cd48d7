use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::context::ConfigContext;
use crate::output::{Printer, Report, Status};

pub const EXAMPLES: &str = "\
Examples:
  filtermap check                    Build every view in ./filtermap.toml
  filtermap check --view profiles    Build a single view
  filtermap --output json check      List filters as JSON
";

#[derive(Args)]
pub struct CheckArgs {
    /// Only check this view
    #[arg(long)]
    pub view: Option<String>,
}

#[derive(Serialize)]
pub struct CheckReport {
    config: String,
    views: Vec<ViewReport>,
}

#[derive(Serialize)]
struct ViewReport {
    view: String,
    model: String,
    filters: Vec<FilterRow>,
}

#[derive(Serialize)]
struct FilterRow {
    param: String,
    label: String,
    expression: String,
    field: String,
    lookup: String,
    form_field: &'static str,
}

impl Report for CheckReport {
    fn table(&self, printer: &Printer) -> Table {
        let mut table = printer.table(["View", "Parameter", "Label", "Field", "Lookup", "Form field"]);
        for view in &self.views {
            if view.filters.is_empty() {
                table.add_row(vec![Cell::new(&view.view), Cell::new("(no filter map)")]);
            }
            for filter in &view.filters {
                table.add_row(vec![
                    Cell::new(&view.view),
                    Cell::new(&filter.param),
                    Cell::new(&filter.label),
                    Cell::new(&filter.field),
                    Cell::new(&filter.lookup),
                    Cell::new(filter.form_field),
                ]);
            }
        }
        table
    }

    fn summary(&self) -> String {
        self.views
            .iter()
            .map(|view| format!("{}:{}", view.view, view.filters.len()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn handle_check(args: CheckArgs, ctx: &ConfigContext, printer: &Printer) -> Result<()> {
    if let Some(name) = &args.view {
        ctx.config.view(name)?;
    }

    let mut views = Vec::new();
    for (name, config) in ctx.config.check()? {
        if args.view.as_deref().is_some_and(|wanted| wanted != name) {
            continue;
        }
        let view = ctx.config.view(name)?;
        printer.status(Status::Trace, format_args!("built view '{name}' over model '{}'", view.model.name));
        let filters = match config {
            Some(config) => config
                .filters()
                .iter()
                .map(|spec| {
                    let form_field = config.form().field(&spec.param);
                    FilterRow {
                        param: spec.param.clone(),
                        label: form_field.map(|field| field.label.clone()).unwrap_or_default(),
                        expression: spec.expression.clone(),
                        field: spec.descriptor.field.clone(),
                        lookup: spec.lookup().to_string(),
                        form_field: form_field.map(|field| field.kind.name()).unwrap_or("-"),
                    }
                })
                .collect(),
            None => {
                printer.status(Status::Warning, format_args!("view '{name}' declares no filter map"));
                Vec::new()
            }
        };
        views.push(ViewReport {
            view: name.to_string(),
            model: view.model.name.clone(),
            filters,
        });
    }

    let count = views.len();
    printer.report(&CheckReport {
        config: ctx.config_path.display().to_string(),
        views,
    })?;
    printer.status(Status::Ok, format_args!("{count} view(s) build"));
    Ok(())
}
