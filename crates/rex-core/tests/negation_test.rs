//! Negated conditions and negated conjunctions: blocking, revocation and
//! re-propagation on retraction.

use rex_core::{Action, Condition, Network, NodeKind, Production};

fn unpainted_box() -> Production {
    Production::new(
        "unpainted-box",
        vec![Condition::has("Block", "$b", "kind", "box"), Condition::neg("Block", "$b", "color", "red")],
        Action::new("paint"),
    )
}

/// A box with no red block resting on it
fn clear_box() -> Production {
    Production::new(
        "clear-box",
        vec![
            Condition::has("Block", "$b", "kind", "box"),
            Condition::ncc(vec![
                Condition::has("Block", "$t", "on", "$b"),
                Condition::has("Block", "$t", "color", "red"),
            ]),
        ],
        Action::new("report"),
    )
}

#[test]
fn test_negation_revokes_and_restores_match() {
    let mut network = Network::new();
    let handle = network.add_production(unpainted_box()).unwrap();

    network.add_wme("Block", "b1", "kind", "box");
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1);

    let red = network.add_wme("Block", "b1", "color", "red");
    assert!(network.memory_tokens(handle.terminal).is_empty(), "blocker must revoke the match");

    network.add_wme("Block", "b2", "color", "red");
    assert!(network.memory_tokens(handle.terminal).is_empty());

    assert!(network.retract_fact(red));
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1, "match must return once unblocked");
}

#[test]
fn test_negation_needs_every_blocker_gone() {
    let mut network = Network::new();
    let handle = network.add_production(unpainted_box()).unwrap();
    network.add_wme("Block", "b1", "kind", "box");
    let first = network.add_wme("Block", "b1", "color", "red");
    let second = network.add_wme("Block", "b1", "color", "red");

    let negative = network.node(handle.terminal).parent.unwrap();
    assert!(matches!(network.node(negative).kind, NodeKind::Negative { .. }));
    let owner = network.memory_tokens(negative)[0];
    assert_eq!(network.token(owner).unwrap().blockers(), &[first, second]);

    network.retract_fact(first);
    assert!(network.memory_tokens(handle.terminal).is_empty());
    network.retract_fact(second);
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1);
}

#[test]
fn test_negation_added_after_facts_catches_up() {
    let mut network = Network::new();
    network.add_wme("Block", "b1", "kind", "box");
    network.add_wme("Block", "b2", "kind", "box");
    network.add_wme("Block", "b2", "color", "red");

    let handle = network.add_production(unpainted_box()).unwrap();
    let tokens = network.memory_tokens(handle.terminal).to_vec();
    assert_eq!(tokens.len(), 1);
    assert_eq!(network.binding(tokens[0], "$b"), Some("b1"));
}

#[test]
fn test_ncc_blocks_while_sub_network_matches() {
    let mut network = Network::new();
    let handle = network.add_production(clear_box()).unwrap();

    network.add_wme("Block", "b1", "kind", "box");
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1);

    let on = network.add_wme("Block", "t1", "on", "b1");
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1, "a partial sub-match does not block");

    let red = network.add_wme("Block", "t1", "color", "red");
    assert!(network.memory_tokens(handle.terminal).is_empty());

    network.retract_fact(red);
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1);

    let red = network.add_wme("Block", "t1", "color", "red");
    assert!(network.memory_tokens(handle.terminal).is_empty());
    network.retract_fact(on);
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1);
    network.retract_fact(red);
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1);
}

#[test]
fn test_ncc_result_arriving_before_owner_is_buffered() {
    let mut network = Network::new();
    let handle = network.add_production(clear_box()).unwrap();

    network.add_wme("Block", "t1", "on", "b1");
    network.add_wme("Block", "t1", "color", "red");
    // The owner is created after the sub-network has already produced a result.
    network.add_wme("Block", "b1", "kind", "box");
    assert!(network.memory_tokens(handle.terminal).is_empty());

    network.add_wme("Block", "b2", "kind", "box");
    assert_eq!(network.memory_tokens(handle.terminal).len(), 1);
}

#[test]
fn test_ncc_added_after_facts_catches_up() {
    let mut network = Network::new();
    network.add_wme("Block", "b1", "kind", "box");
    network.add_wme("Block", "t1", "on", "b1");
    let red = network.add_wme("Block", "t1", "color", "red");
    network.add_wme("Block", "b2", "kind", "box");

    let handle = network.add_production(clear_box()).unwrap();
    let tokens = network.memory_tokens(handle.terminal).to_vec();
    assert_eq!(tokens.len(), 1);
    assert_eq!(network.binding(tokens[0], "$b"), Some("b2"));

    network.retract_fact(red);
    assert_eq!(network.memory_tokens(handle.terminal).len(), 2);
}

#[test]
fn test_ncc_of_single_negation_matches_plain_negation() {
    let mut network = Network::new();
    let plain = network.add_production(unpainted_box()).unwrap();
    let wrapped = network
        .add_production(Production::new(
            "unpainted-box-ncc",
            vec![
                Condition::has("Block", "$b", "kind", "box"),
                Condition::ncc(vec![Condition::has("Block", "$b", "color", "red")]),
            ],
            Action::new("paint"),
        ))
        .unwrap();

    network.add_wme("Block", "b1", "kind", "box");
    network.add_wme("Block", "b2", "kind", "box");
    let red = network.add_wme("Block", "b1", "color", "red");
    assert_eq!(network.memory_tokens(plain.terminal).len(), 1);
    assert_eq!(network.memory_tokens(wrapped.terminal).len(), 1);

    network.retract_fact(red);
    assert_eq!(network.memory_tokens(plain.terminal).len(), 2);
    assert_eq!(network.memory_tokens(wrapped.terminal).len(), 2);
}
