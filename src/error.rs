//! Centralized error types for typeahead.
//!
//! Internal races (superseded or stale lookups) are settled by the state
//! machine and never show up here. What remains are construction-time
//! contract violations, configuration problems, backend failures and
//! terminal failures.

use thiserror::Error;

use crate::config::ConfigError;
use crate::typeahead::LookupError;

/// The main error type.
#[derive(Debug, Error)]
pub enum TypeaheadError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A search backend failed. Controls log it and keep running.
    #[error("{0}")]
    Lookup(#[from] LookupError),

    /// A required capability was not supplied when building a control.
    #[error("Missing required capability: {capability}")]
    ContractViolation { capability: &'static str },

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal-related errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Generic errors with a message.
    #[error("{0}")]
    Other(String),
}

impl TypeaheadError {
    /// Create a contract violation for a missing capability.
    pub fn contract(capability: &'static str) -> Self {
        TypeaheadError::ContractViolation { capability }
    }

    /// Create a terminal error.
    pub fn terminal(msg: impl Into<String>) -> Self {
        TypeaheadError::Terminal(msg.into())
    }

    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        TypeaheadError::Other(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            TypeaheadError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::CreateDirError(_) => {
                    "Could not create configuration directory. Check file permissions.".to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file is readable."
                        .to_string()
                }
                ConfigError::WriteError(_) => {
                    "Could not save configuration. Please check file permissions.".to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::SerializeError(_) => {
                    "Could not save configuration. Internal error.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
            },
            TypeaheadError::Lookup(LookupError::Unavailable) => {
                "The search backend is unavailable. Please try again.".to_string()
            }
            TypeaheadError::Lookup(LookupError::Backend(msg)) => {
                format!("Search failed: {}", msg)
            }
            TypeaheadError::ContractViolation { capability } => {
                format!("The field is misconfigured: '{}' is required.", capability)
            }
            TypeaheadError::Io(_) => {
                "A file operation failed. Please check file permissions.".to_string()
            }
            TypeaheadError::Terminal(msg) => format!("Terminal error: {}", msg),
            TypeaheadError::Other(msg) => msg.clone(),
        }
    }

    /// Check if this error is critical and should stop the program.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            TypeaheadError::Config(_)
                | TypeaheadError::ContractViolation { .. }
                | TypeaheadError::Terminal(_)
        )
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors can be retried or the user can continue working.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TypeaheadError::Lookup(_))
    }
}

/// Result type for typeahead operations.
pub type Result<T, E = TypeaheadError> = std::result::Result<T, E>;
