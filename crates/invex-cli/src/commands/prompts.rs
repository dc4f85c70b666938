//! Prompts command - print the fixed prompt catalog.

use clap::Args;
use console::style;

use invex_core::TableKind;

/// Arguments for the prompts command.
#[derive(Args)]
pub struct PromptsArgs {
    /// Show only the prompt for this table (invoice-info, item-details, tax-details)
    #[arg(short, long)]
    table: Option<TableKind>,

    /// Print only the requested column names
    #[arg(long)]
    columns: bool,
}

pub fn run(args: PromptsArgs) -> anyhow::Result<()> {
    let kinds: Vec<TableKind> = match args.table {
        Some(kind) => vec![kind],
        None => TableKind::ALL.to_vec(),
    };

    for kind in kinds {
        println!(
            "{} {} ({})",
            style(format!("[{}]", kind.index() + 1)).cyan(),
            style(kind.sheet_name()).bold(),
            kind.slug()
        );

        if args.columns {
            for column in kind.requested_columns() {
                println!("  - {}", column);
            }
        } else {
            println!("{}", kind.prompt());
        }
        println!();
    }

    Ok(())
}
