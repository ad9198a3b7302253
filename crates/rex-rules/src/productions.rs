//! The `productions` document: tagged condition lists with a template RHS.
//!
//! ```json
//! {"productions": [
//!   {"name": "clear-box", "priority": 2,
//!    "lhs": [{"tag": "has", "classname": "Block", "identifier": "$b",
//!             "attribute": "kind", "value": "box"},
//!            {"tag": "ncc", "items": [ ... ]}],
//!    "rhs": {"tmpl": "report", "channel": "ops"}}]}
//! ```
//!
//! The document is walked as a `serde_json::Value` rather than derived, so
//! each rejection can quote the exact fragment that caused it.

use crate::error::{RuleParseError, RuleResult};
use rex_core::{Action, Condition, Production, ReteConfig};
use serde_json::{Map, Value};
use tracing::debug;

const FIELD_KEYS: [&str; 4] = ["classname", "identifier", "attribute", "value"];

pub fn parse_productions(text: &str, config: &ReteConfig) -> RuleResult<Vec<Production>> {
    let root: Value = serde_json::from_str(text)?;
    productions_from_value(&root, config)
}

pub fn productions_from_value(root: &Value, config: &ReteConfig) -> RuleResult<Vec<Production>> {
    let productions = match root.get("productions") {
        None | Some(Value::Null) => return Err(RuleParseError::structure("no productions", root)),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(RuleParseError::structure("productions not a list", other)),
    };

    let parsed = productions
        .iter()
        .enumerate()
        .map(|(index, item)| parse_production(index, item, config))
        .collect::<RuleResult<Vec<_>>>()?;
    debug!(count = parsed.len(), "Parsed productions document");
    Ok(parsed)
}

fn parse_production(index: usize, item: &Value, config: &ReteConfig) -> RuleResult<Production> {
    let Value::Object(object) = item else {
        return Err(RuleParseError::structure("production not an object", item));
    };

    let name = match object.get("name") {
        None => format!("production-{index}"),
        Some(Value::String(name)) => name.clone(),
        Some(other) => return Err(RuleParseError::structure("production name not a string", other)),
    };
    let priority = match object.get("priority") {
        None => 0,
        Some(value) => value
            .as_i64()
            .and_then(|p| i32::try_from(p).ok())
            .ok_or_else(|| RuleParseError::structure("priority not an integer", value))?,
    };

    let rhs = match object.get("rhs") {
        Some(Value::Object(rhs)) => rhs,
        other => {
            return Err(RuleParseError::structure("rhs not an object", other.unwrap_or(&Value::Null)));
        }
    };
    let lhs = match object.get("lhs") {
        Some(Value::Array(lhs)) => lhs,
        other => {
            return Err(RuleParseError::structure("lhs not a list", other.unwrap_or(&Value::Null)));
        }
    };

    let conditions = parse_lhs(lhs, config)?;
    let action = parse_rhs(rhs)?;
    Ok(Production { name, priority, conditions, action })
}

/// Parse one condition list; `ncc` items recurse
pub fn parse_lhs(lhs: &[Value], config: &ReteConfig) -> RuleResult<Vec<Condition>> {
    lhs.iter().map(|element| parse_condition(element, config)).collect()
}

fn parse_condition(element: &Value, config: &ReteConfig) -> RuleResult<Condition> {
    let Value::Object(cond) = element else {
        return Err(RuleParseError::structure("lhs element not an object", element));
    };

    match cond.get("tag").and_then(Value::as_str) {
        Some(tag @ ("has" | "neg")) => {
            let mut fields = [""; 4];
            for (slot, key) in fields.iter_mut().zip(FIELD_KEYS) {
                *slot = cond
                    .get(key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| RuleParseError::structure("condition missing fields", element))?;
            }
            let pattern = config.pattern(fields);
            Ok(if tag == "has" { Condition::Has { pattern } } else { Condition::Neg { pattern } })
        }
        Some("filter") => match cond.get("tmpl") {
            Some(Value::String(template)) => Ok(Condition::filter(template.clone())),
            _ => Err(RuleParseError::structure("filter tmpl not a string", element)),
        },
        Some("ncc") => match cond.get("items") {
            Some(Value::Array(items)) => Ok(Condition::ncc(parse_lhs(items, config)?)),
            other => Err(RuleParseError::structure("ncc items not a list", other.unwrap_or(&Value::Null))),
        },
        _ => Err(RuleParseError::structure("unknown condition tag", cond.get("tag").unwrap_or(&Value::Null))),
    }
}

fn parse_rhs(rhs: &Map<String, Value>) -> RuleResult<Action> {
    let template = match rhs.get("tmpl") {
        None => String::new(),
        Some(Value::String(template)) => template.clone(),
        Some(other) => return Err(RuleParseError::structure("rhs tmpl not a string", other)),
    };
    let params = rhs.iter().filter(|(key, _)| key.as_str() != "tmpl").map(|(k, v)| (k.clone(), v.clone())).collect();
    Ok(Action { template, params })
}
