//! RETE Network Implementation
//!
//! [`Network`] owns the alpha network, the beta network, working memory and
//! every token. Fact insertion drives right activation through the alpha
//! memories; beta nodes pass partial matches down by left activation.
//!
//! ## Left activation
//!
//! A left activation carries `(parent token, pending fact, bindings)`. Only
//! token-holding nodes (beta memories, negative nodes, NCC nodes and NCC
//! partners) turn it into a token; joins produce the pending fact and filters
//! forward it untouched. A token therefore extends its parent by at most one
//! fact, and the facts along a token's parent chain are exactly the facts the
//! positive conditions above it matched.
//!
//! ## Deletion
//!
//! Deleting a token removes its whole subtree in post order with an explicit
//! worklist. NCC owners whose last result disappears are re-propagated after
//! the worklist drains, and only if they survived it.
//!
//! Construction lives in [`crate::builder`] and firing in [`crate::firing`].

use crate::alpha_memory::AlphaNetwork;
use crate::arena::Arena;
use crate::beta_network::{BetaNetwork, BindingLayout, JoinTest, NodeKind, ReteNode};
use crate::condition::{Pattern, Production};
use crate::config::{MissingFilterPolicy, ReteConfig};
use crate::environment::SharedObjects;
use crate::error::ReteResult;
use crate::fact_store::FactStore;
use crate::token::Token;
use crate::types::{AlphaMemoryId, Bindings, Fact, FactId, NodeId, ProductionId, TokenId};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Predicate consulted by filter nodes, keyed by template name
pub type FilterPredicate = Box<dyn Fn(&Bindings) -> bool>;

/// One message travelling down the beta network
pub(crate) type LeftInput = (TokenId, Option<FactId>, Bindings);

/// A registered production and the memory holding its complete matches
#[derive(Debug, Clone)]
pub struct CompiledProduction {
    pub(crate) production: Production,
    pub(crate) terminal: NodeId,
}

impl CompiledProduction {
    pub fn production(&self) -> &Production {
        &self.production
    }

    pub fn terminal(&self) -> NodeId {
        self.terminal
    }
}

/// Returned by [`Network::add_production`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductionHandle {
    pub id: ProductionId,
    /// Beta memory accumulating the production's complete matches
    pub terminal: NodeId,
}

/// Network-wide counters and sizes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub facts: usize,
    pub tokens: usize,
    pub beta_nodes: usize,
    pub alpha_memories: usize,
    pub constant_test_nodes: usize,
    pub productions: usize,
    pub right_activations: u64,
    pub left_activations: u64,
    pub tokens_created: u64,
    pub tokens_deleted: u64,
}

pub struct Network {
    pub(crate) config: ReteConfig,
    pub(crate) alpha: AlphaNetwork,
    pub(crate) beta: BetaNetwork,
    pub(crate) facts: FactStore,
    pub(crate) tokens: Arena<Token>,
    pub(crate) root_token: TokenId,
    pub(crate) productions: Vec<CompiledProduction>,
    pub(crate) filters: HashMap<String, FilterPredicate>,
    pub(crate) objects: SharedObjects,
    pub(crate) halted: bool,
    tokens_created: u64,
    tokens_deleted: u64,
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("objects", &self.objects)
            .field("halted", &self.halted)
            .finish()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Empty network with the default configuration
    pub fn new() -> Self {
        Self::build(ReteConfig::default())
    }

    /// Empty network with a validated configuration
    pub fn with_config(config: ReteConfig) -> ReteResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ReteConfig) -> Self {
        let beta = BetaNetwork::new();
        let mut tokens = Arena::new();
        let root_token = TokenId(tokens.insert(Token::new(beta.root(), None, None, Bindings::new())));
        let mut network = Self {
            config,
            alpha: AlphaNetwork::new(),
            beta,
            facts: FactStore::new(),
            tokens,
            root_token,
            productions: Vec::new(),
            filters: HashMap::new(),
            objects: SharedObjects::new(),
            halted: false,
            tokens_created: 0,
            tokens_deleted: 0,
        };
        let root = network.beta.root();
        network.beta.push_item(root, root_token);
        network
    }

    pub fn config(&self) -> &ReteConfig {
        &self.config
    }

    // ---- working memory -------------------------------------------------

    /// Insert a fact and propagate it through the network
    #[instrument(skip(self, fact), fields(fact = %fact))]
    pub fn add_fact(&mut self, fact: Fact) -> FactId {
        let memories = self.alpha.matching_memories(&fact);
        let id = self.facts.insert(fact);
        debug!(fact_id = %id, memories = memories.len(), "Fact added");
        for memory in memories {
            let successors = self.alpha.memory_mut(memory).activate(id);
            self.facts.add_alpha_memory(id, memory);
            for node in successors {
                self.right_activate(node, id);
            }
        }
        id
    }

    /// Insert a fact given as its four fields
    pub fn add_wme(
        &mut self,
        class: impl Into<String>,
        identifier: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> FactId {
        self.add_fact(Fact::new(class, identifier, attribute, value))
    }

    /// Remove a fact and everything derived from it.
    ///
    /// Returns `false` for an unknown or already retracted id.
    #[instrument(skip(self), fields(fact_id = %id))]
    pub fn retract_fact(&mut self, id: FactId) -> bool {
        let Some(entry) = self.facts.entry(id) else {
            debug!("Retracting unknown fact ignored");
            return false;
        };
        for memory in entry.alpha_memories.clone() {
            self.alpha.memory_mut(memory).remove_fact(id);
        }

        while let Some(token) = self.facts.entry(id).and_then(|entry| entry.tokens.first().copied()) {
            if self.tokens.contains(token.0) {
                self.delete_token(token);
            } else {
                self.facts.remove_token(id, token);
            }
        }

        let blocked = self
            .facts
            .entry_mut(id)
            .map(|entry| std::mem::take(&mut entry.blocking))
            .unwrap_or_default();
        for token in blocked {
            let Some(tok) = self.tokens.get_mut(token.0) else { continue };
            tok.blockers.retain(|fact| *fact != id);
            if tok.blockers.is_empty() {
                let node = tok.node;
                debug!(token = %token, node = %node, "Token unblocked");
                self.propagate_token(node, token);
            }
        }

        self.facts.remove(id);
        true
    }

    // ---- activation -----------------------------------------------------

    fn right_activate(&mut self, node: NodeId, fact: FactId) {
        self.beta.node_mut(node).stats.right_activations += 1;
        match &self.beta.node(node).kind {
            NodeKind::Join { .. } => self.join_right_activate(node, fact),
            NodeKind::Negative { .. } => self.negative_right_activate(node, fact),
            _ => {}
        }
    }

    fn join_right_activate(&mut self, node: NodeId, fact: FactId) {
        let (tests, layout) = match &self.beta.node(node).kind {
            NodeKind::Join { tests, layout, .. } => (tests.clone(), layout.clone()),
            _ => return,
        };
        let candidates = self.parent_items(node);
        for token in candidates {
            if !self.tokens.contains(token.0) {
                continue;
            }
            self.beta.node_mut(node).stats.join_attempts += 1;
            if self.join_passes(&tests, token, fact) {
                self.beta.node_mut(node).stats.successful_joins += 1;
                let bindings = self.layout_bindings(&layout, fact);
                self.activate_children(node, token, Some(fact), &bindings);
            }
        }
    }

    fn negative_right_activate(&mut self, node: NodeId, fact: FactId) {
        let tests = self.beta.node(node).kind.tests().to_vec();
        let items = self.items(node);
        for token in items {
            if !self.tokens.contains(token.0) || !self.join_passes(&tests, token, fact) {
                continue;
            }
            let was_unblocked = self.tokens.get(token.0).is_some_and(|t| t.blockers.is_empty());
            if was_unblocked {
                debug!(token = %token, node = %node, blocker = %fact, "Token blocked");
                self.delete_descendants(token);
            }
            if let Some(tok) = self.tokens.get_mut(token.0) {
                tok.blockers.push(fact);
            }
            self.facts.add_blocked(fact, token);
        }
    }

    pub(crate) fn left_activate(
        &mut self,
        node: NodeId,
        parent: TokenId,
        fact: Option<FactId>,
        bindings: Bindings,
    ) {
        self.beta.node_mut(node).stats.left_activations += 1;
        match &self.beta.node(node).kind {
            NodeKind::BetaMemory { .. } => {
                let token = self.make_token(node, parent, fact, bindings);
                self.propagate_token(node, token);
            }
            NodeKind::Join { alpha_memory, tests, layout } => {
                let (tests, layout) = (tests.clone(), layout.clone());
                let facts = self.alpha.memory(*alpha_memory).facts().to_vec();
                for candidate in facts {
                    self.beta.node_mut(node).stats.join_attempts += 1;
                    if self.join_passes(&tests, parent, candidate) {
                        self.beta.node_mut(node).stats.successful_joins += 1;
                        let bindings = self.layout_bindings(&layout, candidate);
                        self.activate_children(node, parent, Some(candidate), &bindings);
                    }
                }
            }
            NodeKind::Negative { alpha_memory, tests, .. } => {
                let tests = tests.clone();
                let facts = self.alpha.memory(*alpha_memory).facts().to_vec();
                let token = self.make_token(node, parent, fact, bindings);
                for candidate in facts {
                    if self.join_passes(&tests, token, candidate) {
                        if let Some(tok) = self.tokens.get_mut(token.0) {
                            tok.blockers.push(candidate);
                        }
                        self.facts.add_blocked(candidate, token);
                    }
                }
                if self.tokens.get(token.0).is_some_and(|t| t.blockers.is_empty()) {
                    self.propagate_token(node, token);
                }
            }
            NodeKind::Filter { template } => {
                if self.filter_accepts(template, parent, &bindings) {
                    self.activate_children(node, parent, fact, &bindings);
                }
            }
            NodeKind::Ncc { partner, .. } => {
                let partner = *partner;
                let token = self.make_token(node, parent, fact, bindings);
                self.claim_buffered_results(partner, token);
                if self.tokens.get(token.0).is_some_and(|t| t.ncc_results.is_empty()) {
                    self.propagate_token(node, token);
                }
            }
            NodeKind::NccPartner { .. } => self.partner_activate(node, parent, fact, bindings),
        }
    }

    fn partner_activate(
        &mut self,
        node: NodeId,
        parent: TokenId,
        fact: Option<FactId>,
        bindings: Bindings,
    ) {
        let NodeKind::NccPartner { ncc, levels_up, match_fact, .. } = self.beta.node(node).kind else {
            return;
        };
        let result = self.make_token(node, parent, fact, bindings);
        let owner = self
            .owner_key(levels_up, match_fact, parent, fact)
            .and_then(|key| self.find_owner(ncc, key));

        match owner {
            Some(owner) => {
                if let Some(tok) = self.tokens.get_mut(result.0) {
                    tok.owner = Some(owner);
                }
                let first = match self.tokens.get_mut(owner.0) {
                    Some(owner_tok) => {
                        owner_tok.ncc_results.push(result);
                        owner_tok.ncc_results.len() == 1
                    }
                    None => false,
                };
                if first {
                    debug!(owner = %owner, node = %ncc, "NCC owner blocked");
                    self.delete_descendants(owner);
                }
            }
            None => {
                if let NodeKind::NccPartner { new_results, .. } = &mut self.beta.node_mut(node).kind {
                    new_results.push(result);
                }
            }
        }
    }

    /// Identify the NCC owner a sub-network result belongs to: the owner's
    /// parent token and, when owners carry one, its fact
    fn owner_key(
        &self,
        levels_up: usize,
        match_fact: bool,
        parent: TokenId,
        fact: Option<FactId>,
    ) -> Option<(TokenId, Option<FactId>)> {
        let (mut token, mut pending) = (parent, fact);
        for _ in 0..levels_up {
            let tok = self.tokens.get(token.0)?;
            pending = tok.fact;
            token = tok.parent?;
        }
        Some((token, if match_fact { pending } else { None }))
    }

    fn find_owner(&self, ncc: NodeId, (parent, fact): (TokenId, Option<FactId>)) -> Option<TokenId> {
        self.items(ncc).into_iter().find(|owner| {
            self.tokens.get(owner.0).is_some_and(|tok| tok.parent == Some(parent) && tok.fact == fact)
        })
    }

    /// Move buffered partner results that belong to a new owner onto it
    fn claim_buffered_results(&mut self, partner: NodeId, owner: TokenId) {
        let NodeKind::NccPartner { levels_up, match_fact, ref new_results, .. } =
            self.beta.node(partner).kind
        else {
            return;
        };
        if new_results.is_empty() {
            return;
        }
        let Some(owner_key) = self.tokens.get(owner.0).and_then(|tok| tok.parent.map(|p| (p, tok.fact)))
        else {
            return;
        };

        let mut claimed = Vec::new();
        for result in new_results.clone() {
            let Some(tok) = self.tokens.get(result.0) else { continue };
            let Some(parent) = tok.parent else { continue };
            if self.owner_key(levels_up, match_fact, parent, tok.fact) == Some(owner_key) {
                claimed.push(result);
            }
        }
        if claimed.is_empty() {
            return;
        }
        if let NodeKind::NccPartner { new_results, .. } = &mut self.beta.node_mut(partner).kind {
            new_results.retain(|result| !claimed.contains(result));
        }
        for result in &claimed {
            if let Some(tok) = self.tokens.get_mut(result.0) {
                tok.owner = Some(owner);
            }
        }
        if let Some(owner_tok) = self.tokens.get_mut(owner.0) {
            owner_tok.ncc_results.extend(claimed);
        }
    }

    fn activate_children(
        &mut self,
        node: NodeId,
        parent: TokenId,
        fact: Option<FactId>,
        bindings: &Bindings,
    ) {
        for child in self.beta.node(node).children.clone() {
            self.left_activate(child, parent, fact, bindings.clone());
        }
    }

    /// Pass a stored token on to the node's children
    fn propagate_token(&mut self, node: NodeId, token: TokenId) {
        self.activate_children(node, token, None, &Bindings::new());
    }

    fn filter_accepts(&self, template: &str, parent: TokenId, pending: &Bindings) -> bool {
        match self.filters.get(template) {
            Some(predicate) => {
                let mut visible = self.all_bindings(parent);
                visible.extend(pending.iter().map(|(k, v)| (k.clone(), v.clone())));
                predicate(&visible)
            }
            None => {
                warn!(template, "No filter predicate registered");
                self.config.missing_filter == MissingFilterPolicy::Accept
            }
        }
    }

    pub(crate) fn join_passes(&self, tests: &[JoinTest], token: TokenId, fact: FactId) -> bool {
        let Some(candidate) = self.facts.get(fact) else {
            return false;
        };
        tests.iter().all(|test| {
            let ancestor = test.depth().and_then(|depth| self.ancestor_fact(token, depth));
            test.passes(candidate, ancestor)
        })
    }

    fn ancestor_fact(&self, token: TokenId, depth: usize) -> Option<&Fact> {
        let mut current = self.tokens.get(token.0)?;
        for _ in 0..depth {
            current = self.tokens.get(current.parent?.0)?;
        }
        self.facts.get(current.fact?)
    }

    fn layout_bindings(&self, layout: &BindingLayout, fact: FactId) -> Bindings {
        let Some(fact) = self.facts.get(fact) else {
            return Bindings::new();
        };
        layout
            .iter()
            .filter_map(|(field, variable)| fact.field(*field).map(|v| (variable.clone(), v.to_string())))
            .collect()
    }

    fn parent_items(&self, node: NodeId) -> Vec<TokenId> {
        self.beta.node(node).parent.map(|parent| self.items(parent)).unwrap_or_default()
    }

    fn items(&self, node: NodeId) -> Vec<TokenId> {
        self.beta.node(node).kind.items().map(<[TokenId]>::to_vec).unwrap_or_default()
    }

    // ---- catch-up -------------------------------------------------------

    /// Left activations a node would currently send to a new child
    pub(crate) fn outputs_of(&self, node: NodeId) -> Vec<LeftInput> {
        let n = self.beta.node(node);
        match &n.kind {
            NodeKind::BetaMemory { items } => {
                items.iter().map(|&token| (token, None, Bindings::new())).collect()
            }
            NodeKind::Negative { items, .. } => items
                .iter()
                .filter(|token| self.tokens.get(token.0).is_some_and(|t| t.blockers.is_empty()))
                .map(|&token| (token, None, Bindings::new()))
                .collect(),
            NodeKind::Ncc { items, .. } => items
                .iter()
                .filter(|token| self.tokens.get(token.0).is_some_and(|t| t.ncc_results.is_empty()))
                .map(|&token| (token, None, Bindings::new()))
                .collect(),
            NodeKind::Join { alpha_memory, tests, layout } => {
                let mut outputs = Vec::new();
                for token in self.parent_items(node) {
                    for &fact in self.alpha.memory(*alpha_memory).facts() {
                        if self.join_passes(tests, token, fact) {
                            outputs.push((token, Some(fact), self.layout_bindings(layout, fact)));
                        }
                    }
                }
                outputs
            }
            NodeKind::Filter { template } => match n.parent {
                Some(parent) => self
                    .outputs_of(parent)
                    .into_iter()
                    .filter(|(token, _, bindings)| self.filter_accepts(template, *token, bindings))
                    .collect(),
                None => Vec::new(),
            },
            NodeKind::NccPartner { .. } => Vec::new(),
        }
    }

    /// Replay the parent's current output into a newly created node
    pub(crate) fn catch_up(&mut self, node: NodeId) {
        let Some(parent) = self.beta.node(node).parent else {
            return;
        };
        let outputs = self.outputs_of(parent);
        if !outputs.is_empty() {
            debug!(node = %node, activations = outputs.len(), "Catching up new node");
        }
        for (token, fact, bindings) in outputs {
            self.left_activate(node, token, fact, bindings);
        }
    }

    // ---- tokens ---------------------------------------------------------

    fn make_token(
        &mut self,
        node: NodeId,
        parent: TokenId,
        fact: Option<FactId>,
        bindings: Bindings,
    ) -> TokenId {
        let token = TokenId(self.tokens.insert(Token::new(node, Some(parent), fact, bindings)));
        self.beta.push_item(node, token);
        if let Some(parent_tok) = self.tokens.get_mut(parent.0) {
            parent_tok.children.push(token);
        }
        if let Some(fact) = fact {
            self.facts.add_token(fact, token);
        }
        self.tokens_created += 1;
        token
    }

    fn delete_descendants(&mut self, token: TokenId) {
        let children = self.tokens.get(token.0).map(|t| t.children.clone()).unwrap_or_default();
        for child in children {
            self.delete_token(child);
        }
    }

    /// Delete a token and its subtree, children before parents
    pub(crate) fn delete_token(&mut self, token: TokenId) {
        let mut reactivate = Vec::new();
        let mut stack = vec![(token, false)];
        while let Some((current, expanded)) = stack.pop() {
            let Some(tok) = self.tokens.get(current.0) else { continue };
            if expanded {
                self.unlink_token(current, &mut reactivate);
            } else {
                stack.push((current, true));
                stack.extend(tok.children.iter().rev().map(|&child| (child, false)));
            }
        }

        for owner in reactivate {
            let Some(tok) = self.tokens.get(owner.0) else { continue };
            if tok.ncc_results.is_empty() {
                let node = tok.node;
                debug!(owner = %owner, node = %node, "NCC owner unblocked");
                self.propagate_token(node, owner);
            }
        }
    }

    fn unlink_token(&mut self, id: TokenId, reactivate: &mut Vec<TokenId>) {
        let Some(token) = self.tokens.remove(id.0) else {
            return;
        };
        self.tokens_deleted += 1;

        if let NodeKind::NccPartner { .. } = self.beta.node(token.node).kind {
            match token.owner {
                Some(owner) => {
                    if let Some(owner_tok) = self.tokens.get_mut(owner.0) {
                        owner_tok.ncc_results.retain(|r| *r != id);
                        if owner_tok.ncc_results.is_empty() && !reactivate.contains(&owner) {
                            reactivate.push(owner);
                        }
                    }
                }
                None => {
                    if let NodeKind::NccPartner { new_results, .. } =
                        &mut self.beta.node_mut(token.node).kind
                    {
                        new_results.retain(|r| *r != id);
                    }
                }
            }
        } else {
            self.beta.remove_item(token.node, id);
        }

        for blocker in &token.blockers {
            self.facts.remove_blocked(*blocker, id);
        }
        for result in &token.ncc_results {
            self.discard_result(*result);
        }
        if let Some(fact) = token.fact {
            self.facts.remove_token(fact, id);
        }
        if let Some(parent) = token.parent.and_then(|p| self.tokens.get_mut(p.0)) {
            parent.children.retain(|c| *c != id);
        }
    }

    /// Drop a partner result whose owner is going away
    fn discard_result(&mut self, result: TokenId) {
        let Some(token) = self.tokens.remove(result.0) else {
            return;
        };
        self.tokens_deleted += 1;
        if let Some(fact) = token.fact {
            self.facts.remove_token(fact, result);
        }
        if let Some(parent) = token.parent.and_then(|p| self.tokens.get_mut(p.0)) {
            parent.children.retain(|c| *c != result);
        }
    }

    // ---- filters & shared objects ----------------------------------------

    /// Register the predicate consulted by filter nodes with this template name
    pub fn register_filter(
        &mut self,
        template: impl Into<String>,
        predicate: impl Fn(&Bindings) -> bool + 'static,
    ) {
        self.filters.insert(template.into(), Box::new(predicate));
    }

    pub fn add_object<T: Any>(&mut self, name: impl Into<String>, value: T) {
        self.objects.insert(name, value);
    }

    pub fn object<T: Any>(&self, name: &str) -> Option<&T> {
        self.objects.get(name)
    }

    pub fn object_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.objects.get_mut(name)
    }

    pub fn objects(&self) -> &SharedObjects {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut SharedObjects {
        &mut self.objects
    }

    // ---- introspection --------------------------------------------------

    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id)
    }

    pub fn contains_fact(&self, id: FactId) -> bool {
        self.facts.contains(id)
    }

    /// Live facts in insertion order
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        let working_memory = self.alpha.working_memory();
        self.alpha
            .memory(working_memory)
            .facts()
            .iter()
            .filter_map(move |&id| self.facts.get(id).map(|fact| (id, fact)))
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.0)
    }

    pub fn root_token(&self) -> TokenId {
        self.root_token
    }

    /// Facts along a token's parent chain, oldest first
    pub fn token_facts(&self, id: TokenId) -> Vec<FactId> {
        let mut facts = Vec::new();
        let mut current = self.tokens.get(id.0);
        while let Some(token) = current {
            facts.extend(token.fact);
            current = token.parent.and_then(|p| self.tokens.get(p.0));
        }
        facts.reverse();
        facts
    }

    /// Value bound to a variable, nearest binding on the ancestor chain wins
    pub fn binding(&self, id: TokenId, variable: &str) -> Option<&str> {
        let mut current = self.tokens.get(id.0);
        while let Some(token) = current {
            if let Some(value) = token.bindings.get(variable) {
                return Some(value);
            }
            current = token.parent.and_then(|p| self.tokens.get(p.0));
        }
        None
    }

    /// Every binding visible from a token, nearer levels overriding farther ones
    pub fn all_bindings(&self, id: TokenId) -> Bindings {
        let mut chain = Vec::new();
        let mut current = self.tokens.get(id.0);
        while let Some(token) = current {
            chain.push(token);
            current = token.parent.and_then(|p| self.tokens.get(p.0));
        }
        let mut bindings = Bindings::new();
        for token in chain.into_iter().rev() {
            bindings.extend(token.bindings.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        bindings
    }

    /// `[(a b c d), (e f g h)]` for the facts along a token's chain
    pub fn render_token(&self, id: TokenId) -> String {
        let facts: Vec<String> = self
            .token_facts(id)
            .into_iter()
            .filter_map(|fact| self.facts.get(fact).map(ToString::to_string))
            .collect();
        format!("[{}]", facts.join(", "))
    }

    /// Tokens stored in a beta memory, negative node or NCC node
    pub fn memory_tokens(&self, node: NodeId) -> &[TokenId] {
        self.beta.node(node).kind.items().unwrap_or(&[])
    }

    pub fn node(&self, id: NodeId) -> &ReteNode {
        self.beta.node(id)
    }

    pub fn beta(&self) -> &BetaNetwork {
        &self.beta
    }

    pub fn alpha(&self) -> &AlphaNetwork {
        &self.alpha
    }

    pub fn production(&self, id: ProductionId) -> Option<&CompiledProduction> {
        self.productions.get(id.0)
    }

    pub fn productions(&self) -> &[CompiledProduction] {
        &self.productions
    }

    /// Alpha memory already built for a pattern's constant tests
    pub fn alpha_memory_for(&self, pattern: &Pattern) -> Option<AlphaMemoryId> {
        self.alpha.find(pattern)
    }

    pub fn alpha_memory_facts(&self, id: AlphaMemoryId) -> &[FactId] {
        self.alpha.memory(id).facts()
    }

    pub fn stats(&self) -> NetworkStats {
        let (left, right) = self.beta.nodes().iter().fold((0, 0), |(l, r), node| {
            (l + node.stats.left_activations, r + node.stats.right_activations)
        });
        NetworkStats {
            facts: self.facts.len(),
            tokens: self.tokens.len(),
            beta_nodes: self.beta.len(),
            alpha_memories: self.alpha.memories().len(),
            constant_test_nodes: self.alpha.test_node_count(),
            productions: self.productions.len(),
            right_activations: right,
            left_activations: left,
            tokens_created: self.tokens_created,
            tokens_deleted: self.tokens_deleted,
        }
    }
}
