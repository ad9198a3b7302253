//! Errors raised while loading rule and fact documents

use rex_core::ReteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleParseError {
    /// The input is not JSON at all
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON with the wrong shape
    #[error("{message}: {fragment}")]
    Structure { message: String, fragment: String },

    /// Well-formed input asking for something the core does not model
    #[error("Unsupported {feature}: {fragment}")]
    Unsupported { feature: String, fragment: String },

    /// The parsed rule was rejected by the network builder
    #[error(transparent)]
    Rete(#[from] ReteError),
}

impl RuleParseError {
    pub(crate) fn structure(message: impl Into<String>, fragment: &serde_json::Value) -> Self {
        Self::Structure { message: message.into(), fragment: fragment.to_string() }
    }

    pub(crate) fn unsupported(feature: impl Into<String>, fragment: &serde_json::Value) -> Self {
        Self::Unsupported { feature: feature.into(), fragment: fragment.to_string() }
    }

    /// Offending input, rendered as compact JSON where available
    pub fn fragment(&self) -> Option<&str> {
        match self {
            Self::Structure { fragment, .. } | Self::Unsupported { fragment, .. } => Some(fragment),
            Self::Rete(err) => err.fragment(),
            Self::Json(_) => None,
        }
    }
}

pub type RuleResult<T> = Result<T, RuleParseError>;
