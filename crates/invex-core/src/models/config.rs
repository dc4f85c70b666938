//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// Generative model service configuration.
    pub model: ModelConfig,

    /// Input folder and output workbook locations.
    pub paths: PathsConfig,

    /// Pauses inserted between model calls.
    pub pacing: PacingConfig,
}

/// Generative model service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Service credential. Usually supplied through `GEMINI_API_KEY` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier, e.g. `gemini-2.5-flash`.
    pub name: String,

    /// Base URL of the REST API.
    pub base_url: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Folder scanned (non-recursively) for invoice images.
    pub input_dir: PathBuf,

    /// Workbook that accumulates the extracted tables.
    pub output_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("invoices"),
            output_path: PathBuf::from("output/invoice_output.xlsx"),
        }
    }
}

/// Fixed pauses between model calls, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause after each prompt except the last one of an image.
    pub prompt_pause_secs: u64,

    /// Pause after the last prompt of an image.
    pub final_prompt_pause_secs: u64,

    /// Pause after an image has been merged into the store.
    pub image_pause_secs: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            prompt_pause_secs: 25,
            final_prompt_pause_secs: 2,
            image_pause_secs: 25,
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Copy of the configuration safe for display, with the credential masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.model.api_key.is_some() {
            config.model.api_key = Some("********".to_string());
        }
        config
    }
}
