//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// Generative model call failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Model output could not be turned into a table.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Reading or writing the workbook store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Image decoding or encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised at the model service boundary.
#[derive(Error, Debug)]
pub enum ModelError {
    /// No credential was configured for the service.
    #[error("no API key configured (set GEMINI_API_KEY or model.api_key)")]
    MissingApiKey,

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The service answered but produced no text.
    #[error("empty response: {reason}")]
    EmptyResponse { reason: String },

    /// The service body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors raised while parsing a model response as CSV.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Nothing to parse after unwrapping the response.
    #[error("response contains no tabular data")]
    Empty,

    /// The payload is not well-formed CSV.
    #[error("malformed CSV: {reason}")]
    Malformed { reason: String },
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        Self::Malformed {
            reason: err.to_string(),
        }
    }
}

/// Errors related to the workbook store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The existing store could not be opened as a workbook.
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    /// Building or serializing the workbook failed.
    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// Swapping the finished workbook into place failed.
    #[error("failed to replace {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
