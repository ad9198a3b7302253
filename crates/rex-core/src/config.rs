//! Network configuration
//!
//! Every field has a serde default so partial configuration documents (for
//! example a `[network]` table with a single key) deserialize cleanly.

use crate::condition::{DEFAULT_VARIABLE_PREFIX, Pattern, Term};
use crate::error::{ReteError, ReteResult};
use crate::types::FIELD_COUNT;
use serde::{Deserialize, Serialize};

/// What a filter node does when no predicate is registered under its name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFilterPolicy {
    /// Drop the activation
    #[default]
    Reject,
    /// Forward the activation as if the predicate had accepted it
    Accept,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReteConfig {
    /// Leading text that marks a rule field as a variable
    #[serde(default = "default_variable_prefix")]
    pub variable_prefix: String,
    #[serde(default)]
    pub missing_filter: MissingFilterPolicy,
}

impl Default for ReteConfig {
    fn default() -> Self {
        Self { variable_prefix: default_variable_prefix(), missing_filter: MissingFilterPolicy::default() }
    }
}

impl ReteConfig {
    pub fn validate(&self) -> ReteResult<()> {
        if self.variable_prefix.is_empty() {
            return Err(ReteError::configuration(
                "variable_prefix",
                "variable prefix must not be empty",
            ));
        }
        if self.variable_prefix.chars().any(char::is_whitespace) {
            return Err(ReteError::configuration(
                "variable_prefix",
                format!("variable prefix {:?} contains whitespace", self.variable_prefix),
            ));
        }
        Ok(())
    }

    /// Classify one raw rule field with the configured prefix
    pub fn classify(&self, raw: &str) -> Term {
        Term::classify(raw, &self.variable_prefix)
    }

    /// Build a pattern from raw rule fields with the configured prefix
    pub fn pattern(&self, fields: [&str; FIELD_COUNT]) -> Pattern {
        Pattern::with_prefix(fields, &self.variable_prefix)
    }
}

fn default_variable_prefix() -> String {
    DEFAULT_VARIABLE_PREFIX.to_string()
}
