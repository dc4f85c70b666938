//! Pauses between model calls to stay under the service's request rate.

use std::time::Duration;

use crate::models::config::PacingConfig;

use super::TableKind;

/// Strategy deciding how long the driver waits between calls.
pub trait PacingPolicy: Send + Sync {
    /// Pause after the model has answered the prompt for `kind`.
    fn delay_after_prompt(&self, kind: TableKind) -> Duration;

    /// Pause after an image's tables have been merged into the store.
    fn delay_after_image(&self) -> Duration;
}

/// Unconditional fixed pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPacing {
    prompt: Duration,
    final_prompt: Duration,
    image: Duration,
}

impl FixedPacing {
    pub fn new(prompt: Duration, final_prompt: Duration, image: Duration) -> Self {
        Self {
            prompt,
            final_prompt,
            image,
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_secs(config.prompt_pause_secs),
            Duration::from_secs(config.final_prompt_pause_secs),
            Duration::from_secs(config.image_pause_secs),
        )
    }
}

impl Default for FixedPacing {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

impl PacingPolicy for FixedPacing {
    fn delay_after_prompt(&self, kind: TableKind) -> Duration {
        if kind.is_last() {
            self.final_prompt
        } else {
            self.prompt
        }
    }

    fn delay_after_image(&self) -> Duration {
        self.image
    }
}

/// No pauses at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPacing;

impl PacingPolicy for NoPacing {
    fn delay_after_prompt(&self, _kind: TableKind) -> Duration {
        Duration::ZERO
    }

    fn delay_after_image(&self) -> Duration {
        Duration::ZERO
    }
}
