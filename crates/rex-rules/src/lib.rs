//! Rule and fact loading for rex.
//!
//! Two rule document shapes are understood:
//!
//! * a `productions` document, whose conditions map one-to-one onto
//!   [`rex_core::Condition`] (`has`, `neg`, `filter`, `ncc`);
//! * event rules (`name`/`priority`/`conditions.all`/`event`), whose equality
//!   checks about one entity are lowered to joined `has` conditions.
//!
//! [`parse_rules`] picks the shape from the document itself.

pub mod error;
pub mod event_rule;
pub mod facts;
pub mod productions;

pub use error::{RuleParseError, RuleResult};
pub use event_rule::{EventCondition, EventConditions, EventRule, RuleEvent, parse_event_rules};
pub use facts::parse_facts;
pub use productions::parse_productions;

use rex_core::{Network, Production, ProductionHandle, ReteConfig};
use serde_json::Value;
use tracing::info;

/// Parse either rule document shape
pub fn parse_rules(text: &str, config: &ReteConfig) -> RuleResult<Vec<Production>> {
    let root: Value = serde_json::from_str(text)?;
    if root.get("productions").is_some() {
        productions::productions_from_value(&root, config)
    } else {
        event_rule::event_rules_from_value(&root, config)
    }
}

/// Compile parsed productions into a network, stopping at the first rejection
pub fn install(network: &mut Network, productions: Vec<Production>) -> RuleResult<Vec<ProductionHandle>> {
    let handles = productions
        .into_iter()
        .map(|production| network.add_production(production))
        .collect::<Result<Vec<_>, _>>()?;
    info!(count = handles.len(), "Installed rules");
    Ok(handles)
}
