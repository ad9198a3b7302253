//! Alpha Network Implementation
//!
//! The alpha network discriminates facts by constant field tests alone. It is a
//! tree of constant-test nodes rooted at a no-test node; a node that ends the
//! constant-test chain of some condition owns an alpha memory, which indexes
//! the facts that passed every test on the path and fans them out to the beta
//! network.
//!
//! ```text
//!            root (no test) ── working memory (every fact)
//!           /                \
//!   attribute == "on"     attribute == "color"
//!          |                    |
//!        amem              value == "red"
//!                               |
//!                             amem
//! ```
//!
//! Alpha memories are shared: two conditions with the same constant tests, in
//! the same field order, resolve to the same memory.

use crate::condition::Pattern;
use crate::types::{AlphaMemoryId, Fact, FactId, NodeId};
use tracing::debug;

/// A single constant test in the alpha tree
#[derive(Debug, Clone)]
pub struct ConstantTestNode {
    /// Field under test; `None` is the root's "no test" sentinel
    field: Option<usize>,
    literal: String,
    children: Vec<usize>,
    memory: Option<AlphaMemoryId>,
}

impl ConstantTestNode {
    fn root(memory: AlphaMemoryId) -> Self {
        Self { field: None, literal: String::new(), children: Vec::new(), memory: Some(memory) }
    }

    fn new(field: usize, literal: &str) -> Self {
        Self { field: Some(field), literal: literal.to_string(), children: Vec::new(), memory: None }
    }

    /// Whether a fact passes this node's test
    pub fn passes(&self, fact: &Fact) -> bool {
        match self.field {
            None => true,
            Some(field) => fact.field(field) == Some(self.literal.as_str()),
        }
    }

    pub fn field(&self) -> Option<usize> {
        self.field
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn memory(&self) -> Option<AlphaMemoryId> {
        self.memory
    }
}

/// Facts that passed one conjunction of constant tests
#[derive(Debug, Clone)]
pub struct AlphaMemory {
    id: AlphaMemoryId,
    facts: Vec<FactId>,
    /// Join and negative nodes fed by this memory, newest first
    successors: Vec<NodeId>,
    activations: u64,
}

impl AlphaMemory {
    fn new(id: AlphaMemoryId) -> Self {
        Self { id, facts: Vec::new(), successors: Vec::new(), activations: 0 }
    }

    pub fn id(&self) -> AlphaMemoryId {
        self.id
    }

    /// Facts in insertion order
    pub fn facts(&self) -> &[FactId] {
        &self.facts
    }

    /// Successors in right-activation order
    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }

    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Append a fact and return the successors to right-activate, in order.
    ///
    /// The fact is stored before any successor runs, so left activations
    /// triggered downstream already see it.
    pub(crate) fn activate(&mut self, fact: FactId) -> Vec<NodeId> {
        self.facts.push(fact);
        self.activations += 1;
        self.successors.clone()
    }

    /// Fill a freshly built memory from working memory, without activation
    pub(crate) fn seed_fact(&mut self, fact: FactId) {
        self.facts.push(fact);
    }

    /// Newer successors are activated first.
    ///
    /// A node is always registered after its ancestors, so descendants see a
    /// new fact before their ancestors propagate it. When one memory feeds two
    /// nodes of the same rule, this keeps the fact from pairing with itself twice.
    pub(crate) fn register_successor(&mut self, node: NodeId) {
        self.successors.insert(0, node);
    }

    /// Remove this exact fact instance
    pub(crate) fn remove_fact(&mut self, fact: FactId) -> bool {
        match self.facts.iter().position(|f| *f == fact) {
            Some(index) => {
                self.facts.remove(index);
                true
            }
            None => false,
        }
    }
}

/// The constant-test tree and the memories hanging off it
#[derive(Debug, Clone)]
pub struct AlphaNetwork {
    tests: Vec<ConstantTestNode>,
    memories: Vec<AlphaMemory>,
}

impl Default for AlphaNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl AlphaNetwork {
    const ROOT: usize = 0;

    pub fn new() -> Self {
        let working_memory = AlphaMemoryId(0);
        Self {
            tests: vec![ConstantTestNode::root(working_memory)],
            memories: vec![AlphaMemory::new(working_memory)],
        }
    }

    /// The root's memory, which receives every fact
    pub fn working_memory(&self) -> AlphaMemoryId {
        AlphaMemoryId(0)
    }

    pub fn memory(&self, id: AlphaMemoryId) -> &AlphaMemory {
        &self.memories[id.0]
    }

    pub(crate) fn memory_mut(&mut self, id: AlphaMemoryId) -> &mut AlphaMemory {
        &mut self.memories[id.0]
    }

    pub fn memories(&self) -> &[AlphaMemory] {
        &self.memories
    }

    pub fn test_node_count(&self) -> usize {
        self.tests.len()
    }

    pub fn root(&self) -> &ConstantTestNode {
        &self.tests[Self::ROOT]
    }

    /// Memories whose constant tests the fact satisfies, in activation order.
    ///
    /// This is the constant-test activation walk: a node that passes yields
    /// its memory, then its children in insertion order; a node that fails
    /// prunes its whole subtree.
    pub fn matching_memories(&self, fact: &Fact) -> Vec<AlphaMemoryId> {
        let mut matched = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(index) = stack.pop() {
            let node = &self.tests[index];
            if !node.passes(fact) {
                continue;
            }
            if let Some(memory) = node.memory {
                matched.push(memory);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        matched
    }

    /// Memory for a pattern's constant tests if one was built already
    pub fn find(&self, pattern: &Pattern) -> Option<AlphaMemoryId> {
        let mut current = Self::ROOT;
        for (field, literal) in pattern.constant_tests() {
            current = self.find_child(current, field, literal)?;
        }
        self.tests[current].memory
    }

    /// Walk or extend the test chain for a pattern and return its memory.
    ///
    /// The flag is `true` when the memory is new and still has to be filled
    /// from working memory.
    pub(crate) fn build_or_share(&mut self, pattern: &Pattern) -> (AlphaMemoryId, bool) {
        let mut current = Self::ROOT;
        for (field, literal) in pattern.constant_tests() {
            current = match self.find_child(current, field, literal) {
                Some(child) => child,
                None => {
                    let child = self.tests.len();
                    self.tests.push(ConstantTestNode::new(field, literal));
                    self.tests[current].children.push(child);
                    child
                }
            };
        }
        if let Some(memory) = self.tests[current].memory {
            return (memory, false);
        }
        let id = AlphaMemoryId(self.memories.len());
        self.memories.push(AlphaMemory::new(id));
        self.tests[current].memory = Some(id);
        debug!(memory = %id, pattern = %pattern, "Created alpha memory");
        (id, true)
    }

    fn find_child(&self, parent: usize, field: usize, literal: &str) -> Option<usize> {
        self.tests[parent].children.iter().copied().find(|&child| {
            let node = &self.tests[child];
            node.field == Some(field) && node.literal == literal
        })
    }
}
