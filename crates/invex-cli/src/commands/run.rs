//! Run command - extract tables from a folder of invoice images.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use invex_core::models::table::DATETIME_FORMAT;
use invex_core::{
    Extractor, FixedPacing, GeminiClient, NoPacing, Progress, TableKind, WorkbookStore,
    list_images,
};

use super::load_config;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Folder containing invoice images
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Workbook to append the extracted tables to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model identifier
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the model service
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Skip the pauses between model calls
    #[arg(long)]
    no_pause: bool,
}

pub async fn run(args: RunArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(input_dir) = args.input_dir {
        config.paths.input_dir = input_dir;
    }
    if let Some(output) = args.output {
        config.paths.output_path = output;
    }
    if let Some(model) = args.model {
        config.model.name = model;
    }
    if args.api_key.is_some() {
        config.model.api_key = args.api_key;
    }

    let client = GeminiClient::from_config(&config.model)?;
    let store = WorkbookStore::new(&config.paths.output_path);
    let extractor = Extractor::new(client, store);
    let extractor = if args.no_pause {
        extractor.with_pacing(NoPacing)
    } else {
        extractor.with_pacing(FixedPacing::from_config(&config.pacing))
    };

    let input_dir = &config.paths.input_dir;
    if !input_dir.is_dir() {
        anyhow::bail!("Input folder not found: {}", input_dir.display());
    }

    let files = list_images(input_dir)?;
    if files.is_empty() {
        println!(
            "{} No images found in {}",
            style("ℹ").blue(),
            input_dir.display()
        );
        return Ok(());
    }

    println!(
        "{} Found {} images to process with {}",
        style("ℹ").blue(),
        files.len(),
        config.model.name
    );
    info!(
        output = %config.paths.output_path.display(),
        run_timestamp = %extractor.run_timestamp().format(DATETIME_FORMAT),
        "Appending to workbook"
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images {msg}")?
            .progress_chars("=>-"),
    );

    let result = extractor
        .run_files(&files, |event: Progress<'_>| match event {
            Progress::Prompting { image, kind } => {
                pb.set_message(format!("{image}: {kind}"));
            }
            Progress::ImageDone(report) => {
                pb.println(format!(
                    "{} {} ({} / {} / {} rows)",
                    style("✓").green(),
                    report.image,
                    report.rows_added[0],
                    report.rows_added[1],
                    report.rows_added[2]
                ));
                pb.inc(1);
            }
        })
        .await;

    let summary = match result {
        Ok(summary) => {
            pb.finish_with_message("Complete");
            summary
        }
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e.into());
        }
    };

    println!();
    println!(
        "{} Processed {} images in {:?}",
        style("✓").green(),
        summary.images,
        start.elapsed()
    );
    for kind in TableKind::ALL {
        println!(
            "   {}: {} rows added",
            kind.sheet_name(),
            style(summary.rows_added[kind.index()]).green()
        );
    }
    println!(
        "   Workbook: {}",
        config.paths.output_path.display()
    );

    Ok(())
}
