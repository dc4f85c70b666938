//! Parse command - turn a saved model response into a table.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use chrono::{Local, Timelike};
use clap::Args;
use console::style;
use serde_json::{Map, Value};
use tracing::debug;

use invex_core::{CsvResponseParser, ResponseParser, ResponsePayload, Table};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// File holding the model response ("-" reads stdin)
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Do not append the timestamp column
    #[arg(long)]
    no_timestamp: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV output
    Csv,
    /// JSON array of records
    Json,
    /// Plain text summary
    Text,
}

pub fn run(args: ParseArgs) -> anyhow::Result<()> {
    let response = read_input(&args.input)?;
    debug!(
        fenced = ResponsePayload::detect(&response).is_fenced(),
        "Read {} bytes of model output",
        response.len()
    );

    let parser = if args.no_timestamp {
        CsvResponseParser::without_timestamp()
    } else {
        let now = Local::now().naive_local();
        CsvResponseParser::new(now.with_nanosecond(0).unwrap_or(now))
    };
    let table = parser.parse(&response)?;

    let content = match args.format {
        OutputFormat::Csv => format_table_csv(&table)?,
        OutputFormat::Json => format_table_json(&table)?,
        OutputFormat::Text => format_table_text(&table),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, content)?;
            eprintln!(
                "{} Wrote {} rows to {}",
                style("✓").green(),
                table.row_count(),
                path.display()
            );
        }
        None => {
            io::stdout().write_all(content.as_bytes())?;
        }
    }

    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }

    let path = PathBuf::from(input);
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(fs::read_to_string(&path)?)
}

fn format_table_csv(table: &Table) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    table.write_csv(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}

fn format_table_json(table: &Table) -> anyhow::Result<String> {
    let records: Vec<Map<String, Value>> = table
        .rows()
        .iter()
        .map(|row| {
            table
                .columns()
                .iter()
                .zip(row)
                .map(|(column, cell)| serde_json::to_value(cell).map(|v| (column.clone(), v)))
                .collect::<serde_json::Result<_>>()
        })
        .collect::<serde_json::Result<_>>()?;

    let mut json = serde_json::to_string_pretty(&records)?;
    json.push('\n');
    Ok(json)
}

fn format_table_text(table: &Table) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} columns, {} rows\n",
        table.column_count(),
        table.row_count()
    ));

    for (i, row) in table.rows().iter().enumerate() {
        output.push_str(&format!("\nRow {}\n", i + 1));
        for (column, cell) in table.columns().iter().zip(row) {
            if !cell.is_empty() {
                output.push_str(&format!("  {}: {}\n", column, cell));
            }
        }
    }

    output
}
