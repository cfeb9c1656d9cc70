//! Configuration management for typeahead.
//!
//! Settings live in a TOML file under the platform config directory. A
//! missing file is not an error; defaults are used instead.

mod settings;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use settings::Settings;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    #[error("Failed to create configuration directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Failed to read configuration file: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write configuration file: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A setting holds an unusable value.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// The configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Get the default configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("typeahead").join("config.toml"))
    }

    /// Load the configuration from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the configuration from `path`.
    ///
    /// Returns defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or holds invalid settings.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save the configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(ConfigError::WriteError)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()
    }
}
