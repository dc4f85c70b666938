//! Core library for invoice table extraction.
//!
//! This crate provides:
//! - A fixed prompt catalog for the three invoice tables
//! - A generative model client that sends prompt + image pairs
//! - Response parsing from free-form model output into typed tables
//! - A workbook store that accumulates the tables across runs
//! - The extraction driver tying the stages together

pub mod error;
pub mod extract;
pub mod model;
pub mod models;
pub mod source;
pub mod store;

pub use error::{InvexError, ModelError, ParseError, Result, StoreError};
pub use extract::{
    CsvResponseParser, Extractor, FixedPacing, ImageReport, NoPacing, PacingPolicy, Progress,
    ResponseParser, ResponsePayload, RunSummary, TableKind, extract_csv, parse_csv,
};
pub use model::{GeminiClient, GenerativeModel};
pub use models::config::InvexConfig;
pub use models::table::{CellValue, Table};
pub use source::{InvoiceImage, list_images};
pub use store::{TableSet, TableStore, WorkbookStore};
