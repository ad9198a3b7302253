//! Built-in action handlers available to rule files run through the CLI.
//!
//! | template  | effect |
//! |-----------|--------|
//! | `log`     | print the production name, matched facts and bindings |
//! | `assert`  | add a fact built from the `class`/`identifier`/`attribute`/`value` params |
//! | `retract` | retract the matched fact at param `fact` (default: the last one) |
//! | `halt`    | stop the firing pass |
//!
//! Every invocation is tallied per production in the [`FIRE_COUNTS`] shared
//! object.

use anyhow::{Context, bail};
use rex_core::{Activation, Fact, HandlerRegistry, Network};
use std::collections::BTreeMap;
use tracing::info;

pub const FIRE_COUNTS: &str = "fire_counts";

pub type FireCounts = BTreeMap<String, usize>;

pub fn builtin_handlers() -> HandlerRegistry {
    let mut handlers = HandlerRegistry::new();
    handlers.register("log", |network, activation| {
        record(network, activation);
        println!("{} {}", activation.production_name, network.render_token(activation.token));
        info!(production = %activation.production_name, bindings = ?activation.bindings, "Rule fired");
        Ok(())
    });
    handlers.register("assert", |network, activation| {
        record(network, activation);
        let fact = asserted_fact(activation)?;
        info!(production = %activation.production_name, %fact, "Asserting fact");
        network.add_fact(fact);
        Ok(())
    });
    handlers.register("retract", |network, activation| {
        record(network, activation);
        let index = match activation.param("fact") {
            None => activation.facts.len().checked_sub(1).context("activation has no facts")?,
            Some(value) => value
                .as_u64()
                .and_then(|index| usize::try_from(index).ok())
                .with_context(|| format!("retract param 'fact' is not an index: {value}"))?,
        };
        let Some(&id) = activation.facts.get(index) else {
            bail!("retract index {index} out of range for {} facts", activation.facts.len());
        };
        network.retract_fact(id);
        Ok(())
    });
    handlers.register("halt", |network, activation| {
        record(network, activation);
        info!(production = %activation.production_name, "Halting");
        network.halt();
        Ok(())
    });
    handlers
}

fn asserted_fact(activation: &Activation) -> anyhow::Result<Fact> {
    let field = |key: &str| {
        activation.param_str(key).with_context(|| format!("assert is missing param '{key}'"))
    };
    Ok(Fact::new(field("class")?, field("identifier")?, field("attribute")?, field("value")?))
}

fn record(network: &mut Network, activation: &Activation) {
    if network.object::<FireCounts>(FIRE_COUNTS).is_none() {
        network.add_object(FIRE_COUNTS, FireCounts::new());
    }
    if let Some(counts) = network.object_mut::<FireCounts>(FIRE_COUNTS) {
        *counts.entry(activation.production_name.clone()).or_default() += 1;
    }
}
