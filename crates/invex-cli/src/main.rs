//! CLI application for extracting invoice tables into a workbook.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, inspect, parse, prompts, run};

/// Invoice extraction - Turn invoice images into spreadsheet tables
#[derive(Parser)]
#[command(name = "invex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract tables from every image in a folder and append them to the workbook
    Run(run::RunArgs),

    /// Parse a saved model response into a table
    Parse(parse::ParseArgs),

    /// Show the sheets held by a workbook
    Inspect(inspect::InspectArgs),

    /// Print the prompt catalog
    Prompts(prompts::PromptsArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => run::run(args, config_path).await,
        Commands::Parse(args) => parse::run(args),
        Commands::Inspect(args) => inspect::run(args, config_path),
        Commands::Prompts(args) => prompts::run(args),
        Commands::Config(args) => config::run(args, config_path),
    }
}
