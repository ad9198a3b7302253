//! Tokens: partial and complete matches in the beta network.
//!
//! A token is owned by exactly one node, extends its parent token by at most
//! one fact, and owns the child tokens built on it. Reading the facts along a
//! token's parent chain gives the facts matched so far.

use crate::types::{Bindings, FactId, NodeId, TokenId};

#[derive(Debug, Clone)]
pub struct Token {
    pub(crate) node: NodeId,
    pub(crate) parent: Option<TokenId>,
    pub(crate) fact: Option<FactId>,
    pub(crate) bindings: Bindings,
    pub(crate) children: Vec<TokenId>,
    /// Negative-node tokens: facts currently satisfying the negated condition
    pub(crate) blockers: Vec<FactId>,
    /// NCC owner tokens: sub-network results recorded against this token
    pub(crate) ncc_results: Vec<TokenId>,
    /// NCC partner results: the owner this result counts against
    pub(crate) owner: Option<TokenId>,
}

impl Token {
    pub(crate) fn new(
        node: NodeId,
        parent: Option<TokenId>,
        fact: Option<FactId>,
        bindings: Bindings,
    ) -> Self {
        Self {
            node,
            parent,
            fact,
            bindings,
            children: Vec::new(),
            blockers: Vec::new(),
            ncc_results: Vec::new(),
            owner: None,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn parent(&self) -> Option<TokenId> {
        self.parent
    }

    pub fn fact(&self) -> Option<FactId> {
        self.fact
    }

    /// Bindings recorded at this level only; see
    /// [`crate::network::Network::all_bindings`] for the full view
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn children(&self) -> &[TokenId] {
        &self.children
    }

    pub fn blockers(&self) -> &[FactId] {
        &self.blockers
    }

    pub fn ncc_results(&self) -> &[TokenId] {
        &self.ncc_results
    }

    pub fn owner(&self) -> Option<TokenId> {
        self.owner
    }
}
