//! Invoice table extraction: prompts, response parsing, pacing, and the driver loop.

mod driver;
mod pacing;
mod prompts;
mod response;

pub use driver::{Extractor, ImageReport, Progress, RunSummary};
pub use pacing::{FixedPacing, NoPacing, PacingPolicy};
pub use prompts::TableKind;
pub use response::{
    CsvResponseParser, ResponseParser, ResponsePayload, TIMESTAMP_COLUMN, extract_csv, parse_csv,
};
