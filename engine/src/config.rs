//! Engine settings.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::registry::DEFAULT_CUSTOM_RENDERER_KEY;

/// Tunables of a [`RenderingEngine`](crate::RenderingEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Leave the run loop after the first idle pass instead of sleeping.
    pub one_shot: bool,
    /// How long the default idle advisor sleeps when nothing is pending.
    pub idle_sleep_ms: u64,
    /// Persisted state key naming an element's custom renderer.
    pub custom_renderer_key: String,
    /// Ask the styling engine to restyle a container after children change.
    pub style_after_structural_change: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            one_shot: false,
            idle_sleep_ms: 16,
            custom_renderer_key: DEFAULT_CUSTOM_RENDERER_KEY.into(),
            style_after_structural_change: true,
        }
    }
}

impl EngineConfig {
    /// [`idle_sleep_ms`](Self::idle_sleep_ms) as a duration.
    #[must_use]
    pub const fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }
}
