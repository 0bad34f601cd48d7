//! Printing command results as tables, JSON or one-line summaries.
//!
//! Reports go to stdout. Status lines go to stdout in table and compact
//! mode and to stderr in JSON mode, so piped JSON stays parseable.

use std::fmt::Display;

use anyhow::Result;
use clap::ValueEnum;
use colored::{Color, Colorize};
use comfy_table::{Attribute, Cell, Color as CellColor, Table, presets};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Tables for reading
    #[default]
    Table,
    /// Pretty-printed JSON for scripts
    Json,
    /// One summary line per command
    Compact,
}

/// Kind of status line, printed as a `kind: message` prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    Note,
    Warning,
    Failure,
    /// Shown only with `--verbose`.
    Trace,
}

impl Status {
    fn prefix(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Note => "note",
            Status::Warning => "warning",
            Status::Failure => "error",
            Status::Trace => "trace",
        }
    }

    fn color(self) -> Color {
        match self {
            Status::Ok => Color::Green,
            Status::Note => Color::Cyan,
            Status::Warning => Color::Yellow,
            Status::Failure => Color::Red,
            Status::Trace => Color::BrightBlack,
        }
    }
}

/// A command result that renders in every output format.
pub trait Report: Serialize {
    fn table(&self, printer: &Printer) -> Table;
    fn summary(&self) -> String;
}

pub struct Printer {
    format: OutputFormat,
    quiet: bool,
    verbose: bool,
    color: bool,
}

impl Printer {
    pub fn new(format: OutputFormat, quiet: bool, verbose: bool, color: bool) -> Self {
        Self {
            format,
            quiet,
            verbose,
            color,
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn report<R: Report>(&self, report: &R) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        match self.format {
            OutputFormat::Table => println!("{}", report.table(self)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            OutputFormat::Compact => println!("{}", report.summary()),
        }
        Ok(())
    }

    /// Print JSON regardless of the output format. Used for payloads that
    /// have no tabular form.
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Failures always print. Everything else respects `--quiet`.
    pub fn status(&self, status: Status, message: impl Display) {
        let shown = match status {
            Status::Failure => true,
            Status::Trace => self.verbose && !self.quiet,
            _ => !self.quiet,
        };
        if !shown {
            return;
        }
        let line = self.line(status, &message.to_string());
        if status == Status::Failure || status == Status::Trace || self.is_json() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    fn line(&self, status: Status, message: &str) -> String {
        if self.color {
            let prefix = format!("{}:", status.prefix());
            format!("{} {message}", prefix.as_str().color(status.color()).bold())
        } else {
            format!("{}: {message}", status.prefix())
        }
    }

    /// Empty table with a bold header row. Plain ASCII borders without color.
    pub fn table<I, S>(&self, headers: I) -> Table
    where
        I: IntoIterator<Item = S>,
        S: Display,
    {
        let mut table = Table::new();
        table.load_preset(if self.color { presets::UTF8_FULL_CONDENSED } else { presets::ASCII_FULL });
        table.set_header(headers.into_iter().map(|header| {
            let cell = Cell::new(header).add_attribute(Attribute::Bold);
            if self.color { cell.fg(CellColor::Cyan) } else { cell }
        }));
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Tally {
        view: &'static str,
        filters: usize,
    }

    impl Report for Tally {
        fn table(&self, printer: &Printer) -> Table {
            let mut table = printer.table(["View", "Filters"]);
            table.add_row(vec![self.view.to_string(), self.filters.to_string()]);
            table
        }

        fn summary(&self) -> String {
            format!("{}:{}", self.view, self.filters)
        }
    }

    #[test]
    fn plain_lines_carry_a_prefix() {
        let printer = Printer::new(OutputFormat::Table, false, false, false);
        assert_eq!(printer.line(Status::Warning, "no filter map"), "warning: no filter map");
        assert_eq!(printer.line(Status::Failure, "bad date"), "error: bad date");
    }

    #[test]
    fn tables_use_ascii_without_color() {
        let printer = Printer::new(OutputFormat::Table, false, false, false);
        let rendered = Tally { view: "profiles", filters: 3 }.table(&printer).to_string();
        assert!(rendered.contains("| View"));
        assert!(rendered.contains("profiles"));
    }

    #[test]
    fn quiet_reports_print_nothing() {
        let printer = Printer::new(OutputFormat::Json, true, false, false);
        assert!(printer.is_json());
        assert!(printer.report(&Tally { view: "tags", filters: 0 }).is_ok());
        assert_eq!(Tally { view: "tags", filters: 0 }.summary(), "tags:0");
    }
}
