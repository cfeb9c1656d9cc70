//! Demo settings.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Settings for the demo form and its fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Whether committing an empty field clears the value.
    pub allow_clear: bool,
    /// Whether navigating the list previews items in the field.
    pub preview: bool,
    /// Whether a stale commit that found a match moves to the next field.
    pub advance_on_commit: bool,
    /// Simulated catalog latency in milliseconds.
    pub latency_ms: u64,
    /// Maximum number of candidates a lookup returns.
    pub max_results: usize,
    /// Maximum number of rows the dropdown draws.
    pub max_visible_rows: usize,
    /// Event poll interval in milliseconds.
    pub tick_rate_ms: u64,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            allow_clear: true,
            preview: true,
            advance_on_commit: true,
            latency_ms: 150,
            max_results: 20,
            max_visible_rows: 8,
            tick_rate_ms: 100,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` for zero row, result or tick
    /// limits.
    pub fn validate(&self) -> Result<()> {
        if self.max_visible_rows == 0 {
            return Err(ConfigError::ValidationError(
                "max_visible_rows must be at least 1".to_string(),
            ));
        }
        if self.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "max_results must be at least 1".to_string(),
            ));
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick_rate_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
