//! Fact documents: a JSON array of facts, each either an object with the four
//! named fields or a four-element array.

use crate::error::{RuleParseError, RuleResult};
use rex_core::{FIELD_COUNT, FIELD_NAMES, Fact};
use serde_json::Value;

/// Object keys accepted for each field, in field order
const FIELD_KEYS: [[&str; 2]; FIELD_COUNT] =
    [["class", "classname"], ["identifier", "id"], ["attribute", "attr"], ["value", "value"]];

pub fn parse_facts(text: &str) -> RuleResult<Vec<Fact>> {
    let root: Value = serde_json::from_str(text)?;
    facts_from_value(&root)
}

pub fn facts_from_value(root: &Value) -> RuleResult<Vec<Fact>> {
    let items = match root {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("facts") {
            Some(Value::Array(items)) => items,
            _ => return Err(RuleParseError::structure("facts not a list", root)),
        },
        other => return Err(RuleParseError::structure("facts not a list", other)),
    };
    items.iter().map(fact_from_value).collect()
}

fn fact_from_value(item: &Value) -> RuleResult<Fact> {
    let mut fields: [String; FIELD_COUNT] = Default::default();
    match item {
        Value::Array(values) if values.len() == FIELD_COUNT => {
            for (slot, value) in fields.iter_mut().zip(values) {
                *slot = scalar_text(value).ok_or_else(|| RuleParseError::structure("fact field not a scalar", item))?;
            }
        }
        Value::Object(object) => {
            for (index, slot) in fields.iter_mut().enumerate() {
                let value = FIELD_KEYS[index]
                    .iter()
                    .find_map(|key| object.get(*key))
                    .ok_or_else(|| RuleParseError::structure(format!("fact missing {}", FIELD_NAMES[index]), item))?;
                *slot = scalar_text(value).ok_or_else(|| RuleParseError::structure("fact field not a scalar", item))?;
            }
        }
        other => return Err(RuleParseError::structure("fact not an object or 4-element list", other)),
    }
    Ok(Fact::from_fields(fields))
}

/// Strings are taken verbatim; numbers and booleans as their JSON text
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_and_array_forms() {
        let text = r#"[
            {"class": "Person", "identifier": "p1", "attribute": "age_bracket", "value": "adult"},
            ["Person", "p1", "age", 42],
            {"classname": "Block", "id": "b1", "attr": "locked", "value": false}
        ]"#;
        let facts = parse_facts(text).unwrap();
        assert_eq!(facts.len(), 3);
        assert_eq!(facts[0], Fact::new("Person", "p1", "age_bracket", "adult"));
        assert_eq!(facts[1].value(), "42");
        assert_eq!(facts[2], Fact::new("Block", "b1", "locked", "false"));
    }

    #[test]
    fn test_wrapped_document() {
        let facts = parse_facts(r#"{"facts": [["A", "1", "on", "2"]]}"#).unwrap();
        assert_eq!(facts, vec![Fact::new("A", "1", "on", "2")]);
    }

    #[test]
    fn test_rejections() {
        let cases = [
            (r#""nope""#, "facts not a list"),
            (r#"[["A", "1", "on"]]"#, "fact not an object"),
            (r#"[["A", "1", "on", null]]"#, "fact field not a scalar"),
            (r#"[{"class": "A", "identifier": "1", "attribute": "on"}]"#, "fact missing value"),
        ];
        for (text, message) in cases {
            let err = parse_facts(text).unwrap_err();
            assert!(err.to_string().starts_with(message), "{text}: got {err}");
        }
    }
}
