//! Loaded rule documents behave in a network like hand-built productions.

use rex_core::{HandlerRegistry, Network, ReteConfig};
use rex_rules::{RuleParseError, install, parse_facts, parse_rules};
use std::cell::RefCell;
use std::rc::Rc;

const BLOCKS: &str = r#"{"productions": [
    {"name": "clear-box", "priority": 2,
     "lhs": [
        {"tag": "has", "classname": "Block", "identifier": "$b", "attribute": "kind", "value": "box"},
        {"tag": "ncc", "items": [
            {"tag": "has", "classname": "Block", "identifier": "$t", "attribute": "on", "value": "$b"}
        ]}
     ],
     "rhs": {"tmpl": "report", "channel": "ops"}}
]}"#;

const DISCOUNT: &str = r#"[{
    "name": "adult-member",
    "conditions": {"all": [
        {"fact": "age_bracket", "operator": "equal", "value": "adult"},
        {"fact": "member", "operator": "equal", "value": true}
    ]},
    "event": {"eventType": "discount", "customProperty": "ten-percent"}
}]"#;

fn recorder(handlers: &mut HandlerRegistry, template: &str) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    handlers.register(template, move |_, activation| {
        let subject = activation.binding("$b").or(activation.binding("$id")).unwrap_or_default();
        sink.borrow_mut().push(format!("{}:{subject}", activation.param_str("channel").unwrap_or_default()));
        Ok(())
    });
    seen
}

#[test]
fn test_productions_document_drives_network() -> anyhow::Result<()> {
    let mut network = Network::new();
    install(&mut network, parse_rules(BLOCKS, &ReteConfig::default())?)?;

    let facts = parse_facts(r#"[["Block", "b1", "kind", "box"], ["Block", "b2", "kind", "box"],
                                ["Block", "b3", "on", "b2"]]"#)?;
    for fact in facts {
        network.add_fact(fact);
    }

    let mut handlers = HandlerRegistry::new();
    let seen = recorder(&mut handlers, "report");
    let report = network.fire(&mut handlers);
    assert!(report.is_clean());
    assert_eq!(*seen.borrow(), vec!["ops:b1".to_string()]);
    Ok(())
}

#[test]
fn test_event_rules_join_on_entity() -> anyhow::Result<()> {
    let mut network = Network::new();
    let handles = install(&mut network, parse_rules(DISCOUNT, &ReteConfig::default())?)?;
    assert_eq!(handles.len(), 1);

    let facts = parse_facts(
        r#"[
        {"class": "Person", "identifier": "p1", "attribute": "age_bracket", "value": "adult"},
        {"class": "Person", "identifier": "p1", "attribute": "member", "value": true},
        {"class": "Person", "identifier": "p2", "attribute": "age_bracket", "value": "adult"},
        {"class": "Person", "identifier": "p2", "attribute": "member", "value": false}
    ]"#,
    )?;
    for fact in facts {
        network.add_fact(fact);
    }

    let tokens = network.memory_tokens(handles[0].terminal);
    assert_eq!(tokens.len(), 1);
    assert_eq!(network.binding(tokens[0], "$id"), Some("p1"));
    Ok(())
}

#[test]
fn test_rejected_production_surfaces_core_error() {
    let text = r#"{"productions": [{"name": "empty", "lhs": [], "rhs": {"tmpl": "t"}}]}"#;
    let mut network = Network::new();
    let productions = parse_rules(text, &ReteConfig::default()).unwrap();
    let err = install(&mut network, productions).unwrap_err();
    assert!(matches!(err, RuleParseError::Rete(_)));
    assert!(network.productions().is_empty());
}
