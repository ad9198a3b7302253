//! Core matching engine for the rex production-rule system.
//!
//! This crate implements the RETE algorithm: an incremental, shared
//! discrimination network that keeps the complete matches of every registered
//! production up to date as facts are added and retracted, without re-scanning
//! working memory.
//!
//! ```text
//! add_fact ─▶ alpha network ─▶ alpha memories ─▶ beta network ─▶ terminal memories
//!                                                                    │
//!                                               fire(handlers) ◀─────┘
//! ```
//!
//! Rules arrive as structured [`Production`]s; parsing rule text is left to
//! other crates.

/// Alpha network: constant tests and alpha memories
pub mod alpha_memory;
/// Generation-checked slot storage for facts and tokens
mod arena;
/// Beta network node kinds and storage
pub mod beta_network;
/// Production compilation with node sharing
pub mod builder;
/// Structured rule definitions
pub mod condition;
/// Network configuration
pub mod config;
/// Named objects shared with action handlers
pub mod environment;
/// Error types
pub mod error;
/// Working-memory storage
mod fact_store;
/// Firing passes and action handlers
pub mod firing;
/// The network: activation, retraction and introspection
pub mod network;
/// Partial and complete matches
pub mod token;
/// Handles, facts and bindings
pub mod types;

pub use beta_network::{JoinTest, NodeKind, NodeStats, ReteNode};
pub use condition::{Action, Condition, DEFAULT_VARIABLE_PREFIX, Pattern, Production, Term};
pub use config::{MissingFilterPolicy, ReteConfig};
pub use environment::SharedObjects;
pub use error::{ReteError, ReteResult};
pub use firing::{Activation, FiringReport, Handler, HandlerFailure, HandlerRegistry};
pub use network::{CompiledProduction, FilterPredicate, Network, NetworkStats, ProductionHandle};
pub use token::Token;
pub use types::{
    AlphaMemoryId, Bindings, FIELD_COUNT, FIELD_NAMES, Fact, FactId, NodeId, ProductionId, TokenId,
};
