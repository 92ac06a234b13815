use std::io::Write;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::warn;

use crate::admin_tui::ui::fit;
use crate::catalog::ResourceSpec;
use crate::models::Resource;
use crate::table::{Column, FilterDescriptor, FilterInput, FilterKind, TableFilter};

#[derive(Parser)]
#[command(name = "sonata-admin")]
#[command(about = "Terminal administration client for the music school management API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List one page of a resource
    List {
        /// Resource to list (students, teachers, classes, ...)
        resource: String,

        /// Server page, starting at 1
        #[arg(long, default_value = "1")]
        page: u32,

        /// Rows per server page
        #[arg(long)]
        per_page: Option<u32>,

        /// Client-side filter as column:expression, e.g. defaultFee:>=100
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Print CSV instead of a table
        #[arg(long)]
        csv: bool,
    },

    /// Delete records by id
    Delete {
        resource: String,

        /// Id of a record to delete; repeat for several
        #[arg(long = "id", required = true)]
        ids: Vec<i64>,
    },

    /// Sign in and remember the session token
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Forget the stored session token
    Logout,

    /// Show record counts of the main resources
    Summary,

    /// Choose the TUI colour theme
    Theme {
        #[arg(long, conflicts_with = "light")]
        dark: bool,

        #[arg(long)]
        light: bool,
    },

    /// Launch the interactive terminal UI
    Tui,
}

impl Commands {
    pub fn parse_resource(resource: &str) -> Result<Resource> {
        Resource::from_slug(resource).ok_or_else(|| {
            let known: Vec<&str> = Resource::ALL.iter().map(Resource::slug).collect();
            anyhow!(
                "Unknown resource: {}. Supported resources: {}",
                resource,
                known.join(", ")
            )
        })
    }
}

/// Literal of a select filter: JSON when it parses, a string otherwise
fn parse_literal(expr: &str) -> Value {
    serde_json::from_str(expr).unwrap_or_else(|_| Value::String(expr.to_string()))
}

/// Turn `column:expression` arguments into table filters.
///
/// The column's declared filter kind decides how the expression is read;
/// columns without a declared filter get a text filter.
pub fn parse_filters(spec: &ResourceSpec, raw: &[String]) -> Result<Vec<TableFilter>> {
    let mut filters = Vec::new();
    for item in raw {
        let (key, expr) = item
            .split_once(':')
            .ok_or_else(|| anyhow!("Invalid filter '{}': expected column:expression", item))?;

        let descriptor = spec
            .filters
            .iter()
            .find(|f| f.key == key)
            .cloned()
            .unwrap_or_else(|| FilterDescriptor::text(key, key));

        let input = match descriptor.kind {
            FilterKind::Select { .. } => FilterInput::Selection(vec![parse_literal(expr)]),
            _ => FilterInput::Text(expr.to_string()),
        };

        match TableFilter::from_input(&descriptor, &input) {
            Some(filter) => filters.push(filter),
            None => warn!("Filter '{}' does not constrain the rows and is ignored", item),
        }
    }
    Ok(filters)
}

/// Fixed-width table of the `visible` rows
pub fn format_table(columns: &[Column], rows: &[Value], visible: &[usize]) -> String {
    let line = |cells: Vec<String>| cells.join("  ").trim_end().to_string();
    let mut out = String::new();

    out.push_str(&line(
        columns
            .iter()
            .map(|c| fit(&c.header, c.width as usize))
            .collect(),
    ));
    out.push('\n');
    let total_width: usize = columns.iter().map(|c| c.width as usize + 2).sum();
    out.push_str(&"-".repeat(total_width.saturating_sub(2)));
    out.push('\n');

    for &index in visible {
        let Some(row) = rows.get(index) else {
            continue;
        };
        out.push_str(&line(
            columns
                .iter()
                .map(|c| fit(&c.cell(row).display(), c.width as usize))
                .collect(),
        ));
        out.push('\n');
    }
    out
}

/// CSV export of the `visible` rows, untruncated
pub fn write_csv<W: Write>(writer: W, columns: &[Column], rows: &[Value], visible: &[usize]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns.iter().map(|c| c.header.as_str()))
        .context("Failed to write CSV header")?;
    for &index in visible {
        if let Some(row) = rows.get(index) {
            csv.write_record(columns.iter().map(|c| c.cell(row).display()))
                .context("Failed to write CSV row")?;
        }
    }
    csv.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::table::apply_filters;
    use serde_json::json;

    fn course_rows() -> Vec<Value> {
        vec![
            json!({ "id": 1, "instrument": { "name": "Piano" }, "grade": { "name": "1" }, "defaultFee": 100 }),
            json!({ "id": 2, "instrument": { "name": "Violin" }, "grade": { "name": "2" }, "defaultFee": 250 }),
            json!({ "id": 3, "instrument": { "name": "Piano" }, "grade": { "name": "3" }, "defaultFee": 400 }),
        ]
    }

    #[test]
    fn test_cli_parses_list() {
        let cli = Cli::try_parse_from([
            "sonata-admin", "list", "courses", "--filter", "defaultFee:>=200", "-f", "instrument.name:Piano", "--csv",
        ])
        .unwrap();
        match cli.command {
            Commands::List { resource, page, filters, csv, .. } => {
                assert_eq!(resource, "courses");
                assert_eq!(page, 1);
                assert_eq!(filters.len(), 2);
                assert!(csv);
            }
            _ => panic!("expected list command"),
        }

        assert!(Cli::try_parse_from(["sonata-admin", "theme", "--dark", "--light"]).is_err());
        assert!(Cli::try_parse_from(["sonata-admin", "delete", "classes"]).is_err());
    }

    #[test]
    fn test_parse_resource() {
        assert_eq!(Commands::parse_resource("class").unwrap(), Resource::Class);
        assert!(Commands::parse_resource("lessons").is_err());
    }

    #[test]
    fn test_filters_follow_declared_kind() {
        let spec = catalog::spec(Resource::Course);
        let rows = course_rows();

        let filters = parse_filters(
            &spec,
            &["defaultFee:>=200".to_string(), "instrument.name:Piano".to_string()],
        )
        .unwrap();
        assert_eq!(apply_filters(&rows, &filters), vec![2]);

        // bare numbers do not constrain an arithmetic column
        let filters = parse_filters(&spec, &["defaultFee:250".to_string()]).unwrap();
        assert!(filters.is_empty());

        let filters = parse_filters(&spec, &["defaultFee:cheap".to_string()]).unwrap();
        assert!(filters.is_empty());

        assert!(parse_filters(&spec, &["defaultFee".to_string()]).is_err());
    }

    #[test]
    fn test_table_and_csv_output() {
        let spec = catalog::spec(Resource::Course);
        let rows = course_rows();

        let table = format_table(&spec.columns, &rows, &[1]);
        assert!(table.contains("Violin"));
        assert!(!table.contains("Piano"));

        let mut out = Vec::new();
        write_csv(&mut out, &spec.columns, &rows, &[0, 2]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID,Instrument"));
        assert!(lines[2].contains("Piano"));
    }
}
