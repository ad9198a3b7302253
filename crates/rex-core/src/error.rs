//! Error handling for the rex matching core
//!
//! Construction of the network is the only fallible operation in the core:
//! fact insertion, retraction and firing never fail. Every error names the
//! fragment of input that caused it so callers can report it verbatim.

use std::fmt;
use thiserror::Error;

/// Error type for network construction and configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReteError {
    /// A production could not be compiled as a whole
    #[error("Production error: {message}")]
    Production { message: String, production: Option<String> },

    /// One condition inside a production is malformed
    #[error("Condition error: {message} (in {fragment})")]
    Condition { message: String, fragment: String },

    /// Configuration values that cannot be used
    #[error("Configuration error: {message}")]
    Configuration { message: String, setting: Option<String> },
}

impl ReteError {
    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ReteError::Production { .. } => "production",
            ReteError::Condition { .. } => "condition",
            ReteError::Configuration { .. } => "configuration",
        }
    }

    /// Create a production-level validation error
    pub fn invalid_production(production: &str, message: impl Into<String>) -> Self {
        Self::Production {
            message: message.into(),
            production: (!production.is_empty()).then(|| production.to_string()),
        }
    }

    /// Create a condition-level validation error
    pub fn invalid_condition(fragment: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Condition { message: message.into(), fragment: fragment.to_string() }
    }

    /// Create a configuration error
    pub fn configuration(setting: &str, message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into(), setting: Some(setting.to_string()) }
    }

    /// The offending fragment or setting, when one is known
    pub fn fragment(&self) -> Option<&str> {
        match self {
            ReteError::Production { production, .. } => production.as_deref(),
            ReteError::Condition { fragment, .. } => Some(fragment),
            ReteError::Configuration { setting, .. } => setting.as_deref(),
        }
    }
}

/// Result type alias for core operations
pub type ReteResult<T> = Result<T, ReteError>;
