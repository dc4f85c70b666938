//! The extraction loop: images in, tables merged into the store.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::GenerativeModel;
use crate::models::table::DATETIME_FORMAT;
use crate::source::{InvoiceImage, list_images};
use crate::store::{TableSet, TableStore};

use super::pacing::{FixedPacing, PacingPolicy};
use super::prompts::TableKind;
use super::response::{CsvResponseParser, ResponseParser};

/// Outcome of one image: rows parsed and rows now held by the store, per table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReport {
    /// File name of the image.
    pub image: String,
    /// Rows parsed from this image, in catalog order.
    pub rows_added: [usize; 3],
    /// Rows in each sheet after the merge, in catalog order.
    pub rows_stored: [usize; 3],
}

/// Totals for a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Timestamp stamped on every row written by this run.
    pub run_timestamp: NaiveDateTime,
    /// Images fully processed and merged.
    pub images: usize,
    /// Rows appended per table, in catalog order.
    pub rows_added: [usize; 3],
}

/// Progress notifications for front ends.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// About to send the prompt for `kind` with `image`.
    Prompting { image: &'a str, kind: TableKind },
    /// The image's tables have been merged into the store.
    ImageDone(&'a ImageReport),
}

/// Drives prompt + image calls, parses the answers and merges them into a store.
pub struct Extractor<M, S> {
    model: M,
    store: S,
    pacing: Box<dyn PacingPolicy>,
    parser: CsvResponseParser,
    run_timestamp: NaiveDateTime,
}

impl<M: GenerativeModel, S: TableStore> Extractor<M, S> {
    /// Create an extractor; the run timestamp is captured here, once.
    pub fn new(model: M, store: S) -> Self {
        let now = Local::now().naive_local();
        let run_timestamp = now.with_nanosecond(0).unwrap_or(now);
        Self {
            model,
            store,
            pacing: Box::new(FixedPacing::default()),
            parser: CsvResponseParser::new(run_timestamp),
            run_timestamp,
        }
    }

    /// Set the pacing policy.
    pub fn with_pacing(mut self, pacing: impl PacingPolicy + 'static) -> Self {
        self.pacing = Box::new(pacing);
        self
    }

    /// Override the run timestamp.
    pub fn with_run_timestamp(mut self, run_timestamp: NaiveDateTime) -> Self {
        self.run_timestamp = run_timestamp;
        self.parser = CsvResponseParser::new(run_timestamp);
        self
    }

    pub fn run_timestamp(&self) -> NaiveDateTime {
        self.run_timestamp
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process every plain file in `folder`.
    pub async fn run<F>(&self, folder: &Path, on_progress: F) -> Result<RunSummary>
    where
        F: FnMut(Progress<'_>),
    {
        let files = list_images(folder)?;
        self.run_files(&files, on_progress).await
    }

    /// Process the given files in order. The first failure aborts the run;
    /// images merged before it stay in the store.
    pub async fn run_files<F>(&self, files: &[PathBuf], mut on_progress: F) -> Result<RunSummary>
    where
        F: FnMut(Progress<'_>),
    {
        info!(
            run_timestamp = %self.run_timestamp.format(DATETIME_FORMAT),
            images = files.len(),
            model = self.model.name(),
            "Starting extraction run"
        );

        let mut summary = RunSummary {
            run_timestamp: self.run_timestamp,
            images: 0,
            rows_added: [0; 3],
        };

        for path in files {
            let report = self.process(path, &mut on_progress).await?;
            for (total, added) in summary.rows_added.iter_mut().zip(report.rows_added) {
                *total += added;
            }
            summary.images += 1;
            on_progress(Progress::ImageDone(&report));

            sleep(self.pacing.delay_after_image()).await;
        }

        Ok(summary)
    }

    /// Extract the three tables from one image and merge them into the store.
    pub async fn process_image(&self, path: &Path) -> Result<ImageReport> {
        self.process(path, &mut ignore_progress).await
    }

    async fn process<F>(&self, path: &Path, on_progress: &mut F) -> Result<ImageReport>
    where
        F: FnMut(Progress<'_>),
    {
        let image = InvoiceImage::open(path)?;
        let batch = self.extract_tables(&image, on_progress).await?;
        let rows_added = batch.row_counts();

        let stored = self.store.append(batch)?;
        info!(image = image.name(), rows_added = ?rows_added, "Data appended to store");

        Ok(ImageReport {
            image: image.name().to_string(),
            rows_added,
            rows_stored: stored.row_counts(),
        })
    }

    async fn extract_tables<F>(&self, image: &InvoiceImage, on_progress: &mut F) -> Result<TableSet>
    where
        F: FnMut(Progress<'_>),
    {
        let mut batch = TableSet::new();

        for kind in TableKind::ALL {
            on_progress(Progress::Prompting {
                image: image.name(),
                kind,
            });
            info!(
                image = image.name(),
                prompt = kind.index() + 1,
                table = %kind,
                "Requesting model output"
            );

            let response = self.model.generate(kind.prompt(), image).await?;
            debug!(table = %kind, output = %response, "Model output");

            let table = self.parser.parse(&response)?;
            info!(
                table = %kind,
                rows = table.row_count(),
                columns = table.column_count(),
                "Parsed model output"
            );
            batch.set(kind, table);

            sleep(self.pacing.delay_after_prompt(kind)).await;
        }

        Ok(batch)
    }
}

fn ignore_progress(_: Progress<'_>) {}
