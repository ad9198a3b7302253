//! Core types shared across the network: handles, facts and bindings.

use crate::arena::RawId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of positional fields in every fact
pub const FIELD_COUNT: usize = 4;

/// Positional field names, in field-index order
pub const FIELD_NAMES: [&str; FIELD_COUNT] = ["class", "identifier", "attribute", "value"];

/// Variable name → bound value
pub type Bindings = BTreeMap<String, String>;

/// Handle of a fact in working memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactId(pub(crate) RawId);

/// Handle of a token in the match graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub(crate) RawId);

/// Index of a beta-network node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

/// Index of an alpha memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlphaMemoryId(pub(crate) usize);

/// Index of a registered production, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductionId(pub(crate) usize);

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact#{}.{}", self.0.index(), self.0.generation())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token#{}.{}", self.0.index(), self.0.generation())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

impl fmt::Display for AlphaMemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "amem#{}", self.0)
    }
}

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl AlphaMemoryId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl ProductionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A working-memory element: four positional fields, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    fields: [String; FIELD_COUNT],
}

impl Fact {
    pub fn new(
        class: impl Into<String>,
        identifier: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self { fields: [class.into(), identifier.into(), attribute.into(), value.into()] }
    }

    pub fn from_fields(fields: [String; FIELD_COUNT]) -> Self {
        Self { fields }
    }

    /// Field at a position, `None` past the last field
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn fields(&self) -> &[String; FIELD_COUNT] {
        &self.fields
    }

    pub fn class(&self) -> &str {
        &self.fields[0]
    }

    pub fn identifier(&self) -> &str {
        &self.fields[1]
    }

    pub fn attribute(&self) -> &str {
        &self.fields[2]
    }

    pub fn value(&self) -> &str {
        &self.fields[3]
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {} {})", self.fields[0], self.fields[1], self.fields[2], self.fields[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_positional_access() {
        let fact = Fact::new("ClassName", "ID", "Attribute", "Value");
        assert_eq!(fact.field(0), Some("ClassName"));
        assert_eq!(fact.field(3), Some("Value"));
        assert_eq!(fact.field(4), None);
        assert_eq!(fact.attribute(), "Attribute");
        assert_eq!(fact.to_string(), "(ClassName ID Attribute Value)");
    }

    #[test]
    fn test_equal_facts_compare_equal() {
        assert_eq!(Fact::new("a", "b", "c", "d"), Fact::new("a", "b", "c", "d"));
        assert_ne!(Fact::new("a", "b", "c", "d"), Fact::new("a", "b", "c", "e"));
    }
}
