//! Generative model service boundary.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::ModelError;
use crate::source::InvoiceImage;

/// A text-and-image in, text out generation capability.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier, for logging.
    fn name(&self) -> &str;

    /// Send one prompt with one image and return the model's text answer.
    async fn generate(&self, prompt: &str, image: &InvoiceImage) -> Result<String, ModelError>;
}
