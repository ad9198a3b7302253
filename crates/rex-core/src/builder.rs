//! Network construction with node sharing.
//!
//! A production's conditions are compiled left to right by walking the beta
//! network from its root, reusing an existing child whenever one with the same
//! key exists and creating (then catching up) a new one otherwise. The walk
//! tracks which token level each positive condition's fact lands on, so join
//! tests can say how far up the token chain an earlier binding lives.
//!
//! Validation runs over the whole condition tree before the first node is
//! touched, so a rejected production leaves the network unchanged.

use crate::beta_network::{BindingLayout, JoinTest, NodeKind};
use crate::condition::{Condition, Pattern, Production};
use crate::config::ReteConfig;
use crate::error::{ReteError, ReteResult};
use crate::network::{CompiledProduction, Network, ProductionHandle};
use crate::types::{AlphaMemoryId, NodeId, ProductionId};
use tracing::{debug, info, instrument};

/// Position of the construction walk
#[derive(Debug, Clone)]
struct BuildState {
    /// Node the next condition attaches under
    node: NodeId,
    /// Pattern whose fact each token level carries, root level first
    levels: Vec<Option<Pattern>>,
    /// Positive pattern matched by a join but not yet stored in a token
    pending: Option<Pattern>,
}

impl BuildState {
    fn root(node: NodeId) -> Self {
        Self { node, levels: vec![None], pending: None }
    }

    /// Level index of the tokens the current node sees
    fn current_level(&self) -> usize {
        self.levels.len() - 1
    }
}

/// Explicit construction context for one production
struct BuildContext<'n> {
    network: &'n mut Network,
    created: usize,
    shared: usize,
}

impl<'n> BuildContext<'n> {
    fn new(network: &'n mut Network) -> Self {
        Self { network, created: 0, shared: 0 }
    }

    fn build_conditions(&mut self, mut state: BuildState, conditions: &[Condition]) -> BuildState {
        for condition in conditions {
            match condition {
                Condition::Has { pattern } => self.build_join(&mut state, pattern),
                Condition::Neg { pattern } => self.build_negative(&mut state, pattern),
                Condition::Filter { template } => self.build_filter(&mut state, template),
                Condition::Ncc { conditions } => state = self.build_ncc(state, conditions),
            }
        }
        state
    }

    /// Make sure the walk stands on a beta memory, storing any pending fact
    fn ensure_memory(&mut self, state: &mut BuildState) -> NodeId {
        if matches!(self.network.beta.node(state.node).kind, NodeKind::BetaMemory { .. }) {
            return state.node;
        }
        let existing = self
            .network
            .beta
            .find_child(state.node, |node| matches!(node.kind, NodeKind::BetaMemory { .. }));
        let memory = match existing {
            Some(memory) => {
                self.shared += 1;
                memory
            }
            None => {
                let memory = self.network.beta.insert(state.node, NodeKind::BetaMemory { items: Vec::new() });
                self.created += 1;
                debug!(node = %memory, parent = %state.node, "Created beta memory");
                self.network.catch_up(memory);
                memory
            }
        };
        state.levels.push(state.pending.take());
        state.node = memory;
        memory
    }

    fn build_join(&mut self, state: &mut BuildState, pattern: &Pattern) {
        let parent = self.ensure_memory(state);
        let alpha_memory = self.alpha_memory(pattern);
        let tests = join_tests(&state.levels, state.current_level(), pattern);
        let layout = binding_layout(pattern);

        let existing = self.network.beta.find_child(parent, |node| match &node.kind {
            NodeKind::Join { alpha_memory: a, tests: t, layout: l } => {
                *a == alpha_memory && *t == tests && *l == layout
            }
            _ => false,
        });
        let join = match existing {
            Some(join) => {
                self.shared += 1;
                debug!(node = %join, pattern = %pattern, "Shared join node");
                join
            }
            None => {
                let join = self.network.beta.insert(parent, NodeKind::Join { alpha_memory, tests, layout });
                self.network.alpha.memory_mut(alpha_memory).register_successor(join);
                self.created += 1;
                debug!(node = %join, pattern = %pattern, memory = %alpha_memory, "Created join node");
                join
            }
        };
        state.node = join;
        state.pending = Some(pattern.clone());
    }

    fn build_negative(&mut self, state: &mut BuildState, pattern: &Pattern) {
        state.levels.push(state.pending.take());
        let alpha_memory = self.alpha_memory(pattern);
        let tests = join_tests(&state.levels, state.current_level(), pattern);

        let existing = self.network.beta.find_child(state.node, |node| match &node.kind {
            NodeKind::Negative { alpha_memory: a, tests: t, .. } => *a == alpha_memory && *t == tests,
            _ => false,
        });
        let negative = match existing {
            Some(negative) => {
                self.shared += 1;
                negative
            }
            None => {
                let negative = self.network.beta.insert(
                    state.node,
                    NodeKind::Negative { alpha_memory, tests, items: Vec::new() },
                );
                self.network.alpha.memory_mut(alpha_memory).register_successor(negative);
                self.created += 1;
                debug!(node = %negative, pattern = %pattern, "Created negative node");
                self.network.catch_up(negative);
                negative
            }
        };
        state.node = negative;
    }

    fn build_filter(&mut self, state: &mut BuildState, template: &str) {
        let existing = self.network.beta.find_child(state.node, |node| {
            matches!(&node.kind, NodeKind::Filter { template: t } if t == template)
        });
        state.node = match existing {
            Some(filter) => {
                self.shared += 1;
                filter
            }
            None => {
                let filter = self
                    .network
                    .beta
                    .insert(state.node, NodeKind::Filter { template: template.to_string() });
                self.created += 1;
                debug!(node = %filter, template, "Created filter node");
                filter
            }
        };
    }

    /// The sub-network hangs off the same parent as the NCC node and is built
    /// first, so it sees every activation before the NCC node does.
    fn build_ncc(&mut self, start: BuildState, conditions: &[Condition]) -> BuildState {
        let sub = self.build_conditions(start.clone(), conditions);
        let bottom = sub.node;
        let levels_up = sub.levels.len() - start.levels.len();
        let match_fact = start.pending.is_some();

        let existing = self.network.beta.find_child(start.node, |node| match node.kind {
            NodeKind::Ncc { partner, .. } => self.network.beta.node(partner).parent == Some(bottom),
            _ => false,
        });
        let ncc = match existing {
            Some(ncc) => {
                self.shared += 1;
                ncc
            }
            None => {
                let ncc = self.network.beta.next_id();
                let partner = NodeId(ncc.index() + 1);
                self.network.beta.insert(start.node, NodeKind::Ncc { partner, items: Vec::new() });
                self.network.beta.insert(
                    bottom,
                    NodeKind::NccPartner { ncc, levels_up, match_fact, new_results: Vec::new() },
                );
                self.created += 2;
                debug!(node = %ncc, partner = %partner, levels_up, "Created NCC node pair");
                self.network.catch_up(ncc);
                self.network.catch_up(partner);
                ncc
            }
        };

        let mut state = start;
        state.levels.push(state.pending.take());
        state.node = ncc;
        state
    }

    /// Shared alpha memory for a pattern, filled from working memory when new
    fn alpha_memory(&mut self, pattern: &Pattern) -> AlphaMemoryId {
        let (memory, created) = self.network.alpha.build_or_share(pattern);
        if created {
            let working_memory = self.network.alpha.working_memory();
            let candidates = self.network.alpha.memory(working_memory).facts().to_vec();
            for fact in candidates {
                let matches = self.network.facts.get(fact).is_some_and(|f| pattern.matches_constants(f));
                if matches {
                    self.network.alpha.memory_mut(memory).seed_fact(fact);
                    self.network.facts.add_alpha_memory(fact, memory);
                }
            }
        }
        memory
    }
}

/// Equality tests for a pattern joined at `level`.
///
/// A variable repeated inside the pattern is tested against its first field;
/// otherwise it is tested against the nearest earlier level that binds it.
/// Variables bound nowhere earlier get no test.
fn join_tests(levels: &[Option<Pattern>], level: usize, pattern: &Pattern) -> Vec<JoinTest> {
    let mut tests = Vec::new();
    for (field, variable) in pattern.variables() {
        if let Some(first) = pattern.field_of(variable).filter(|first| *first < field) {
            tests.push(JoinTest::SameFact { field, other_field: first });
            continue;
        }
        let earlier = levels.iter().enumerate().rev().find_map(|(bound_at, p)| {
            p.as_ref().and_then(|p| p.field_of(variable)).map(|ancestor_field| (bound_at, ancestor_field))
        });
        if let Some((bound_at, ancestor_field)) = earlier {
            tests.push(JoinTest::Ancestor { field, depth: level - bound_at, ancestor_field });
        }
    }
    tests
}

/// Fields recorded as bindings: the first occurrence of each variable
fn binding_layout(pattern: &Pattern) -> BindingLayout {
    pattern
        .variables()
        .filter(|(field, variable)| pattern.field_of(variable) == Some(*field))
        .map(|(field, variable)| (field, variable.to_string()))
        .collect()
}

fn validate_conditions(config: &ReteConfig, conditions: &[Condition]) -> ReteResult<()> {
    for condition in conditions {
        match condition {
            Condition::Has { pattern } | Condition::Neg { pattern } => {
                let unnamed = pattern
                    .variables()
                    .any(|(_, variable)| variable.is_empty() || variable == config.variable_prefix);
                if unnamed {
                    return Err(ReteError::invalid_condition(condition, "variable has no name"));
                }
            }
            Condition::Filter { template } => {
                if template.trim().is_empty() {
                    return Err(ReteError::invalid_condition(condition, "filter template is empty"));
                }
            }
            Condition::Ncc { conditions: inner } => {
                if inner.is_empty() {
                    return Err(ReteError::invalid_condition(
                        condition,
                        "negated conjunction has no conditions",
                    ));
                }
                validate_conditions(config, inner)?;
            }
        }
    }
    Ok(())
}

impl Network {
    /// Compile a production into the network and register it for firing.
    ///
    /// Matches already implied by working memory are available immediately.
    #[instrument(skip(self, production), fields(production = %production.name))]
    pub fn add_production(&mut self, production: Production) -> ReteResult<ProductionHandle> {
        if production.conditions.is_empty() {
            return Err(ReteError::invalid_production(&production.name, "production has no conditions"));
        }
        validate_conditions(&self.config, &production.conditions)
            .inspect_err(|err| debug!(error = %err, "Production rejected"))?;

        let root = self.beta.root();
        let mut ctx = BuildContext::new(self);
        let mut state = ctx.build_conditions(BuildState::root(root), &production.conditions);
        let terminal = ctx.ensure_memory(&mut state);
        let (created, shared) = (ctx.created, ctx.shared);

        let id = ProductionId(self.productions.len());
        info!(
            production = %production.name,
            terminal = %terminal,
            nodes_created = created,
            nodes_shared = shared,
            matches = self.memory_tokens(terminal).len(),
            "Added production to RETE network"
        );
        self.productions.push(CompiledProduction { production, terminal });
        Ok(ProductionHandle { id, terminal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Action;

    fn production(name: &str, conditions: Vec<Condition>) -> Production {
        Production::new(name, conditions, Action::new("noop"))
    }

    #[test]
    fn test_join_tests_reference_earlier_levels() {
        let first = Pattern::new("$x", "on", "$y", "$z");
        let levels = vec![None, Some(first)];
        let second = Pattern::new("$y", "left-of", "$w", "$z");
        let tests = join_tests(&levels, 1, &second);
        assert_eq!(
            tests,
            vec![
                JoinTest::Ancestor { field: 0, depth: 0, ancestor_field: 2 },
                JoinTest::Ancestor { field: 3, depth: 0, ancestor_field: 3 },
            ]
        );
    }

    #[test]
    fn test_join_tests_use_nearest_binding_and_same_fact() {
        let levels = vec![None, Some(Pattern::new("$a", "p", "$b", "v")), Some(Pattern::new("$b", "q", "$a", "v"))];
        let pattern = Pattern::new("$a", "r", "$a", "$b");
        let tests = join_tests(&levels, 2, &pattern);
        assert_eq!(
            tests,
            vec![
                JoinTest::Ancestor { field: 0, depth: 0, ancestor_field: 2 },
                JoinTest::SameFact { field: 2, other_field: 0 },
                JoinTest::Ancestor { field: 3, depth: 0, ancestor_field: 0 },
            ]
        );
    }

    #[test]
    fn test_binding_layout_keeps_first_occurrence() {
        let layout = binding_layout(&Pattern::new("$x", "is", "$x", "$y"));
        assert_eq!(layout, vec![(0, "$x".to_string()), (3, "$y".to_string())]);
    }

    #[test]
    fn test_empty_lhs_rejected() {
        let mut network = Network::new();
        let err = network.add_production(production("empty", vec![])).unwrap_err();
        assert_eq!(err.category(), "production");
        assert_eq!(err.fragment(), Some("empty"));
    }

    #[test]
    fn test_invalid_nested_condition_leaves_network_untouched() {
        let mut network = Network::new();
        let before = network.stats();
        let conditions = vec![
            Condition::has("$x", "on", "$y", "$z"),
            Condition::ncc(vec![Condition::has("$y", "color", "red", "$z"), Condition::filter("  ")]),
        ];
        let err = network.add_production(production("bad", conditions)).unwrap_err();
        assert_eq!(err.category(), "condition");
        assert_eq!(network.stats(), before);
    }

    #[test]
    fn test_empty_ncc_and_unnamed_variable_rejected() {
        let mut network = Network::new();
        assert!(network.add_production(production("p", vec![Condition::ncc(vec![])])).is_err());
        assert!(network.add_production(production("p", vec![Condition::has("$", "a", "b", "c")])).is_err());
        assert!(network.productions().is_empty());
    }

    #[test]
    fn test_identical_prefixes_share_nodes() {
        let mut network = Network::new();
        let shared = Condition::has("$x", "on", "$y", "$z");
        let first = network
            .add_production(production("a", vec![shared.clone(), Condition::has("$y", "color", "red", "$z")]))
            .unwrap();
        let nodes_after_first = network.beta().len();
        let second = network
            .add_production(production("b", vec![shared, Condition::has("$y", "color", "red", "$z")]))
            .unwrap();
        assert_eq!(first.terminal, second.terminal);
        assert_eq!(network.beta().len(), nodes_after_first);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_ncc_pair_is_wired_to_sub_network_bottom() {
        let mut network = Network::new();
        let handle = network
            .add_production(production(
                "ncc",
                vec![
                    Condition::has("$x", "on", "$y", "$z"),
                    Condition::ncc(vec![Condition::has("$y", "color", "red", "$z")]),
                ],
            ))
            .unwrap();
        let ncc = network.node(handle.terminal).parent.unwrap();
        let NodeKind::Ncc { partner, .. } = network.node(ncc).kind else {
            panic!("terminal should hang off the NCC node");
        };
        let NodeKind::NccPartner { ncc: back, levels_up, match_fact, .. } = network.node(partner).kind else {
            panic!("partner missing");
        };
        assert_eq!(back, ncc);
        assert_eq!(levels_up, 1);
        assert!(match_fact);
        let bottom = network.node(partner).parent.unwrap();
        assert!(matches!(network.node(bottom).kind, NodeKind::Join { .. }));
    }
}
