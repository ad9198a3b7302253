//! Beta Network Implementation
//!
//! The beta network joins partial matches across facts. Every node is one
//! variant of a closed [`NodeKind`] enum and lives in a flat vector addressed by
//! [`NodeId`]; the root is always a beta memory at index 0 holding the single
//! empty token.
//!
//! ## Node kinds
//!
//! ```text
//! BetaMemory ─ stores tokens, feeds joins
//! Join       ─ token × alpha-memory fact under equality tests (stateless)
//! Negative   ─ stores tokens with their blockers, propagates unblocked ones
//! Filter     ─ forwards while a named predicate accepts (stateless)
//! Ncc        ─ stores owner tokens, propagates those with no sub-network result
//! NccPartner ─ bottom of an NCC sub-network, reports results to its Ncc node
//! ```
//!
//! Nodes only record their wiring and memories here; activation logic lives
//! on [`crate::network::Network`], which owns the tokens and facts the nodes
//! refer to.

use crate::types::{AlphaMemoryId, Fact, NodeId, TokenId};
use std::fmt;

/// A positional equality test evaluated by join and negative nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinTest {
    /// `fact[field] == ancestor(depth).fact[ancestor_field]`, where depth 0 is
    /// the token being extended
    Ancestor { field: usize, depth: usize, ancestor_field: usize },
    /// `fact[field] == fact[other_field]`, for a variable repeated inside one condition
    SameFact { field: usize, other_field: usize },
}

impl JoinTest {
    /// Evaluate against the candidate fact and the fact found on the ancestor
    /// chain. `SameFact` ignores the ancestor.
    pub fn passes(&self, fact: &Fact, ancestor: Option<&Fact>) -> bool {
        match *self {
            JoinTest::Ancestor { field, ancestor_field, .. } => match ancestor {
                Some(other) => {
                    fact.field(field).is_some() && fact.field(field) == other.field(ancestor_field)
                }
                None => false,
            },
            JoinTest::SameFact { field, other_field } => fact.field(field) == fact.field(other_field),
        }
    }

    /// How far up the token chain the test reads, if at all
    pub fn depth(&self) -> Option<usize> {
        match *self {
            JoinTest::Ancestor { depth, .. } => Some(depth),
            JoinTest::SameFact { .. } => None,
        }
    }
}

impl fmt::Display for JoinTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinTest::Ancestor { field, depth, ancestor_field } => {
                write!(f, "[{field}] = up{depth}[{ancestor_field}]")
            }
            JoinTest::SameFact { field, other_field } => write!(f, "[{field}] = [{other_field}]"),
        }
    }
}

/// Fields of a matched fact recorded as bindings: `(field, variable)`
pub type BindingLayout = Vec<(usize, String)>;

#[derive(Debug, Clone)]
pub enum NodeKind {
    BetaMemory {
        items: Vec<TokenId>,
    },
    Join {
        alpha_memory: AlphaMemoryId,
        tests: Vec<JoinTest>,
        layout: BindingLayout,
    },
    Negative {
        alpha_memory: AlphaMemoryId,
        tests: Vec<JoinTest>,
        items: Vec<TokenId>,
    },
    Filter {
        template: String,
    },
    Ncc {
        partner: NodeId,
        items: Vec<TokenId>,
    },
    NccPartner {
        ncc: NodeId,
        /// Token levels added by the sub-network below the NCC node's parent
        levels_up: usize,
        /// Whether owners carry the fact pending at the NCC node's position
        match_fact: bool,
        /// Results whose owner token did not exist yet
        new_results: Vec<TokenId>,
    },
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::BetaMemory { .. } => "beta-memory",
            NodeKind::Join { .. } => "join",
            NodeKind::Negative { .. } => "negative",
            NodeKind::Filter { .. } => "filter",
            NodeKind::Ncc { .. } => "ncc",
            NodeKind::NccPartner { .. } => "ncc-partner",
        }
    }

    /// Nodes that keep tokens of their own
    pub fn is_stateful(&self) -> bool {
        !matches!(self, NodeKind::Join { .. } | NodeKind::Filter { .. })
    }

    /// Token list of a memory-like node
    pub fn items(&self) -> Option<&[TokenId]> {
        match self {
            NodeKind::BetaMemory { items }
            | NodeKind::Negative { items, .. }
            | NodeKind::Ncc { items, .. } => Some(items),
            _ => None,
        }
    }

    pub(crate) fn items_mut(&mut self) -> Option<&mut Vec<TokenId>> {
        match self {
            NodeKind::BetaMemory { items }
            | NodeKind::Negative { items, .. }
            | NodeKind::Ncc { items, .. } => Some(items),
            _ => None,
        }
    }

    pub fn alpha_memory(&self) -> Option<AlphaMemoryId> {
        match self {
            NodeKind::Join { alpha_memory, .. } | NodeKind::Negative { alpha_memory, .. } => {
                Some(*alpha_memory)
            }
            _ => None,
        }
    }

    pub fn tests(&self) -> &[JoinTest] {
        match self {
            NodeKind::Join { tests, .. } | NodeKind::Negative { tests, .. } => tests,
            _ => &[],
        }
    }
}

/// Per-node activation counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub left_activations: u64,
    pub right_activations: u64,
    pub join_attempts: u64,
    pub successful_joins: u64,
}

#[derive(Debug, Clone)]
pub struct ReteNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Left-activated in insertion order
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    pub stats: NodeStats,
}

/// Flat storage for beta nodes
#[derive(Debug, Clone)]
pub struct BetaNetwork {
    nodes: Vec<ReteNode>,
}

impl Default for BetaNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl BetaNetwork {
    pub fn new() -> Self {
        let root = ReteNode {
            id: NodeId(0),
            parent: None,
            children: Vec::new(),
            kind: NodeKind::BetaMemory { items: Vec::new() },
            stats: NodeStats::default(),
        };
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &ReteNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ReteNode {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[ReteNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The id the next inserted node will receive
    pub(crate) fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len())
    }

    /// Append a node and link it under its parent
    pub(crate) fn insert(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = self.next_id();
        self.nodes.push(ReteNode {
            id,
            parent: Some(parent),
            children: Vec::new(),
            kind,
            stats: NodeStats::default(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// First child of `parent` satisfying `predicate`
    pub(crate) fn find_child(
        &self,
        parent: NodeId,
        mut predicate: impl FnMut(&ReteNode) -> bool,
    ) -> Option<NodeId> {
        self.nodes[parent.0].children.iter().copied().find(|&child| predicate(&self.nodes[child.0]))
    }

    pub(crate) fn push_item(&mut self, node: NodeId, token: TokenId) {
        if let Some(items) = self.nodes[node.0].kind.items_mut() {
            items.push(token);
        }
    }

    pub(crate) fn remove_item(&mut self, node: NodeId, token: TokenId) {
        if let Some(items) = self.nodes[node.0].kind.items_mut() {
            if let Some(index) = items.iter().position(|t| *t == token) {
                items.remove(index);
            }
        }
    }
}
