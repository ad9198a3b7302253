//! Event rules: flat `fact operator value` checks about a single entity.
//!
//! Every `all` condition becomes `has($class, $id, <fact>, <value>)`, so the
//! checks join on the shared entity variables. Only `equal` is supported;
//! `any` blocks are rejected until disjunction exists in the core.

use crate::error::{RuleParseError, RuleResult};
use rex_core::{Action, Condition, Production, ReteConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

pub const CLASS_VARIABLE: &str = "class";
pub const IDENTIFIER_VARIABLE: &str = "id";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRule {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    pub conditions: EventConditions,
    pub event: RuleEvent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventConditions {
    #[serde(default)]
    pub all: Vec<EventCondition>,
    #[serde(default)]
    pub any: Vec<EventCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCondition {
    pub fact: String,
    pub operator: String,
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvent {
    pub event_type: String,
    #[serde(default)]
    pub custom_property: Option<String>,
}

/// One rule object, or an array of them
pub fn parse_event_rules(text: &str, config: &ReteConfig) -> RuleResult<Vec<Production>> {
    let root: Value = serde_json::from_str(text)?;
    event_rules_from_value(&root, config)
}

pub fn event_rules_from_value(root: &Value, config: &ReteConfig) -> RuleResult<Vec<Production>> {
    let rules: Vec<EventRule> = match root {
        Value::Array(items) => items.iter().map(decode_rule).collect::<RuleResult<_>>()?,
        other => vec![decode_rule(other)?],
    };
    let productions = rules.iter().map(|rule| rule.to_production(config)).collect::<RuleResult<Vec<_>>>()?;
    debug!(count = productions.len(), "Parsed event rules");
    Ok(productions)
}

fn decode_rule(value: &Value) -> RuleResult<EventRule> {
    EventRule::deserialize(value)
        .map_err(|err| RuleParseError::structure(format!("invalid event rule ({err})"), value))
}

impl EventRule {
    pub fn to_production(&self, config: &ReteConfig) -> RuleResult<Production> {
        if !self.conditions.any.is_empty() {
            let fragment = serde_json::to_value(&self.conditions.any)?;
            return Err(RuleParseError::unsupported("'any' conditions", &fragment));
        }

        let class = format!("{}{CLASS_VARIABLE}", config.variable_prefix);
        let identifier = format!("{}{IDENTIFIER_VARIABLE}", config.variable_prefix);
        let conditions = self
            .conditions
            .all
            .iter()
            .map(|condition| {
                let value = condition.expected_value()?;
                let fields = [class.as_str(), identifier.as_str(), condition.fact.as_str(), value.as_str()];
                let pattern = config.pattern(fields);
                Ok(Condition::Has { pattern })
            })
            .collect::<RuleResult<Vec<_>>>()?;

        let mut action = Action::new(&self.event.event_type);
        if let Some(property) = &self.event.custom_property {
            action = action.with_param("customProperty", property.as_str());
        }
        Ok(Production::new(&self.name, conditions, action).with_priority(self.priority))
    }
}

impl EventCondition {
    /// The literal a matching fact must carry in its value field
    fn expected_value(&self) -> RuleResult<String> {
        if self.operator != "equal" {
            let fragment = serde_json::to_value(self)?;
            return Err(RuleParseError::unsupported(format!("operator '{}'", self.operator), &fragment));
        }
        match &self.value {
            Value::String(text) => Ok(text.clone()),
            Value::Number(_) | Value::Bool(_) => Ok(self.value.to_string()),
            other => Err(RuleParseError::structure("condition value not a scalar", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rex_core::Term;

    const ADULT: &str = r#"{
        "name": "adult-discount",
        "priority": 5,
        "conditions": {"all": [
            {"fact": "age_bracket", "operator": "equal", "value": "adult"},
            {"fact": "member", "operator": "equal", "value": true},
            {"fact": "visits", "operator": "equal", "value": 12}
        ]},
        "event": {"eventType": "discount", "customProperty": "ten-percent"}
    }"#;

    #[test]
    fn test_equal_conditions_share_entity_variables() {
        let productions = parse_event_rules(ADULT, &ReteConfig::default()).unwrap();
        assert_eq!(productions.len(), 1);
        let production = &productions[0];
        assert_eq!(production.name, "adult-discount");
        assert_eq!(production.priority, 5);
        assert_eq!(production.action.template, "discount");
        assert_eq!(production.action.params.get("customProperty"), Some(&Value::from("ten-percent")));

        let values: Vec<_> = production
            .conditions
            .iter()
            .map(|condition| {
                let Condition::Has { pattern } = condition else { panic!("expected has") };
                assert_eq!(pattern.terms()[0], Term::Var("$class".to_string()));
                assert_eq!(pattern.terms()[1], Term::Var("$id".to_string()));
                pattern.terms()[3].as_const().unwrap().to_string()
            })
            .collect();
        assert_eq!(values, vec!["adult", "true", "12"]);
    }

    #[test]
    fn test_array_of_rules() {
        let text = format!("[{ADULT}, {ADULT}]");
        assert_eq!(parse_event_rules(&text, &ReteConfig::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_unsupported_operator_rejected() {
        let text = r#"{"name": "r", "conditions": {"all": [
            {"fact": "age", "operator": "greaterThanInclusive", "value": 18}
        ]}, "event": {"eventType": "e"}}"#;
        let err = parse_event_rules(text, &ReteConfig::default()).unwrap_err();
        assert!(matches!(err, RuleParseError::Unsupported { .. }));
        assert!(err.fragment().unwrap().contains("greaterThanInclusive"));
    }

    #[test]
    fn test_any_block_rejected() {
        let text = r#"{"name": "r", "conditions": {"any": [
            {"fact": "age", "operator": "equal", "value": 18}
        ]}, "event": {"eventType": "e"}}"#;
        let err = parse_event_rules(text, &ReteConfig::default()).unwrap_err();
        assert!(err.to_string().contains("'any'"));
    }

    #[test]
    fn test_missing_event_is_structure_error() {
        let err = parse_event_rules(r#"{"name": "r", "conditions": {}}"#, &ReteConfig::default()).unwrap_err();
        assert!(matches!(err, RuleParseError::Structure { .. }));
    }

    #[test]
    fn test_custom_prefix_used_for_entity_variables() {
        let config = ReteConfig { variable_prefix: "?".to_string(), ..ReteConfig::default() };
        let productions = parse_event_rules(ADULT, &config).unwrap();
        let Condition::Has { pattern } = &productions[0].conditions[0] else { panic!("expected has") };
        assert_eq!(pattern.terms()[1], Term::Var("?id".to_string()));
    }
}
