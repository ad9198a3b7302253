//! Structured rule definitions consumed by the network builder.
//!
//! Rule text is parsed elsewhere; the core only sees these trees. A field of a
//! pattern is either a constant that the alpha network tests, or a variable
//! that the beta network binds and joins on.

use crate::types::{FIELD_COUNT, FIELD_NAMES, Fact};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix that marks a pattern field as a variable unless configured otherwise
pub const DEFAULT_VARIABLE_PREFIX: &str = "$";

/// One field of a pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Const(String),
    Var(String),
}

impl Term {
    /// Classify raw rule text as a constant or a variable
    pub fn classify(raw: &str, variable_prefix: &str) -> Self {
        if !variable_prefix.is_empty() && raw.starts_with(variable_prefix) {
            Term::Var(raw.to_string())
        } else {
            Term::Const(raw.to_string())
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Term::Var(name) => Some(name),
            Term::Const(_) => None,
        }
    }

    pub fn as_const(&self) -> Option<&str> {
        match self {
            Term::Const(value) => Some(value),
            Term::Var(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Const(value) | Term::Var(value) => f.write_str(value),
        }
    }
}

/// A four-field fact pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    terms: [Term; FIELD_COUNT],
}

impl Pattern {
    /// Build a pattern, treating fields with the default `$` prefix as variables
    pub fn new(class: &str, identifier: &str, attribute: &str, value: &str) -> Self {
        Self::with_prefix([class, identifier, attribute, value], DEFAULT_VARIABLE_PREFIX)
    }

    pub fn with_prefix(fields: [&str; FIELD_COUNT], variable_prefix: &str) -> Self {
        Self { terms: fields.map(|raw| Term::classify(raw, variable_prefix)) }
    }

    pub fn from_terms(terms: [Term; FIELD_COUNT]) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[Term; FIELD_COUNT] {
        &self.terms
    }

    /// `(field, literal)` for every constant field, in field order
    pub fn constant_tests(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.terms.iter().enumerate().filter_map(|(field, term)| term.as_const().map(|c| (field, c)))
    }

    /// `(field, variable)` for every variable field, in field order
    pub fn variables(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.terms.iter().enumerate().filter_map(|(field, term)| term.as_var().map(|v| (field, v)))
    }

    /// First field holding the given variable
    pub fn field_of(&self, variable: &str) -> Option<usize> {
        self.terms.iter().position(|term| term.as_var() == Some(variable))
    }

    /// Whether a fact passes every constant test of this pattern
    pub fn matches_constants(&self, fact: &Fact) -> bool {
        self.constant_tests().all(|(field, literal)| fact.field(field) == Some(literal))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = &self.terms;
        write!(f, "({a} {b} {c} {d})")
    }
}

/// One entry of a rule's left-hand side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum Condition {
    /// Positive fact condition
    Has { pattern: Pattern },
    /// Negated fact condition: holds while no fact matches
    Neg { pattern: Pattern },
    /// Predicate hook evaluated against the bindings seen so far
    Filter { template: String },
    /// Negated conjunction: holds while the nested list has no match
    Ncc { conditions: Vec<Condition> },
}

impl Condition {
    pub fn has(class: &str, identifier: &str, attribute: &str, value: &str) -> Self {
        Condition::Has { pattern: Pattern::new(class, identifier, attribute, value) }
    }

    pub fn neg(class: &str, identifier: &str, attribute: &str, value: &str) -> Self {
        Condition::Neg { pattern: Pattern::new(class, identifier, attribute, value) }
    }

    pub fn filter(template: impl Into<String>) -> Self {
        Condition::Filter { template: template.into() }
    }

    pub fn ncc(conditions: Vec<Condition>) -> Self {
        Condition::Ncc { conditions }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Condition::Has { .. } => "has",
            Condition::Neg { .. } => "neg",
            Condition::Filter { .. } => "filter",
            Condition::Ncc { .. } => "ncc",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Has { pattern } => write!(f, "(has {pattern})"),
            Condition::Neg { pattern } => write!(f, "(neg {pattern})"),
            Condition::Filter { template } => write!(f, "(filter {template:?})"),
            Condition::Ncc { conditions } => {
                f.write_str("(ncc")?;
                for condition in conditions {
                    write!(f, " {condition}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Right-hand side of a production: a handler template and free-form parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub template: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Action {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into(), params: serde_json::Map::new() }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A rule: named, prioritized conditions plus one action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    pub conditions: Vec<Condition>,
    pub action: Action,
}

impl Production {
    pub fn new(name: impl Into<String>, conditions: Vec<Condition>, action: Action) -> Self {
        Self { name: name.into(), priority: 0, conditions, action }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Human-readable field label, used in diagnostics
pub fn field_name(field: usize) -> &'static str {
    FIELD_NAMES.get(field).copied().unwrap_or("?")
}
