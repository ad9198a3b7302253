//! Working-memory fact storage
//!
//! Each stored fact carries its own back-references: the alpha memories that
//! index it, the tokens anchored on it, and the negative-node tokens it blocks.
//! Retraction walks those lists instead of searching the network.

use crate::arena::Arena;
use crate::types::{AlphaMemoryId, Fact, FactId, TokenId};

#[derive(Debug, Clone)]
pub(crate) struct FactEntry {
    pub(crate) fact: Fact,
    pub(crate) alpha_memories: Vec<AlphaMemoryId>,
    pub(crate) tokens: Vec<TokenId>,
    pub(crate) blocking: Vec<TokenId>,
}

impl FactEntry {
    fn new(fact: Fact) -> Self {
        Self { fact, alpha_memories: Vec::new(), tokens: Vec::new(), blocking: Vec::new() }
    }
}

/// Arena of facts keyed by generation-checked [`FactId`]s
#[derive(Debug, Clone, Default)]
pub(crate) struct FactStore {
    entries: Arena<FactEntry>,
}

impl FactStore {
    pub(crate) fn new() -> Self {
        Self { entries: Arena::new() }
    }

    /// Every insertion gets a fresh id; equal facts are not merged
    pub(crate) fn insert(&mut self, fact: Fact) -> FactId {
        FactId(self.entries.insert(FactEntry::new(fact)))
    }

    pub(crate) fn get(&self, id: FactId) -> Option<&Fact> {
        self.entries.get(id.0).map(|entry| &entry.fact)
    }

    pub(crate) fn entry(&self, id: FactId) -> Option<&FactEntry> {
        self.entries.get(id.0)
    }

    pub(crate) fn entry_mut(&mut self, id: FactId) -> Option<&mut FactEntry> {
        self.entries.get_mut(id.0)
    }

    pub(crate) fn contains(&self, id: FactId) -> bool {
        self.entries.contains(id.0)
    }

    pub(crate) fn remove(&mut self, id: FactId) -> Option<Fact> {
        self.entries.remove(id.0).map(|entry| entry.fact)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn add_token(&mut self, id: FactId, token: TokenId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.tokens.push(token);
        }
    }

    pub(crate) fn remove_token(&mut self, id: FactId, token: TokenId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.tokens.retain(|t| *t != token);
        }
    }

    pub(crate) fn add_blocked(&mut self, id: FactId, token: TokenId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.blocking.push(token);
        }
    }

    pub(crate) fn remove_blocked(&mut self, id: FactId, token: TokenId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            if let Some(index) = entry.blocking.iter().position(|t| *t == token) {
                entry.blocking.remove(index);
            }
        }
    }

    pub(crate) fn add_alpha_memory(&mut self, id: FactId, memory: AlphaMemoryId) {
        if let Some(entry) = self.entries.get_mut(id.0) {
            entry.alpha_memories.push(memory);
        }
    }
}
