//! Inspect command - summarize the sheets of a workbook store.

use std::path::PathBuf;

use clap::Args;
use console::style;

use invex_core::{TableStore, WorkbookStore};

use super::load_config;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Workbook to inspect (default: the configured output path)
    file: Option<PathBuf>,

    /// List column names for each sheet
    #[arg(long)]
    columns: bool,
}

pub fn run(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = match args.file {
        Some(path) => path,
        None => load_config(config_path)?.paths.output_path,
    };

    let store = WorkbookStore::new(&path);
    if !store.exists() {
        println!(
            "{} No workbook at {} yet.",
            style("ℹ").blue(),
            path.display()
        );
        return Ok(());
    }

    let tables = store.load()?;

    println!("{}", style(path.display()).bold());
    for (kind, table) in tables.iter() {
        println!(
            "  {:<14} {:>6} rows  {:>3} columns",
            kind.sheet_name(),
            table.row_count(),
            table.column_count()
        );
        if args.columns && !table.columns().is_empty() {
            println!("    {}", style(table.columns().join(", ")).dim());
        }
    }

    Ok(())
}
