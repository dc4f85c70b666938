//! Subcommand implementations.

pub mod config;
pub mod inspect;
pub mod parse;
pub mod prompts;
pub mod run;

use std::path::{Path, PathBuf};

use tracing::debug;

use invex_core::InvexConfig;

/// Location of the per-user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invex")
        .join("config.json")
}

/// Resolve the configuration file: the explicit path if given, else the
/// per-user file when it exists.
pub fn config_file(config_path: Option<&str>) -> Option<PathBuf> {
    match config_path {
        Some(path) => Some(PathBuf::from(path)),
        None => Some(default_config_path()).filter(|p| p.exists()),
    }
}

/// Load configuration, falling back to defaults when no file is present.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvexConfig> {
    match config_file(config_path) {
        Some(path) => read_config(&path),
        None => {
            debug!("No config file found, using defaults");
            Ok(InvexConfig::default())
        }
    }
}

fn read_config(path: &Path) -> anyhow::Result<InvexConfig> {
    debug!("Loading config from {}", path.display());
    InvexConfig::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))
}
