//! Production firing.
//!
//! A firing pass visits productions in registration order and, for each, the
//! complete matches in its terminal memory in the order they accumulated. The
//! action template names a handler in a caller-supplied [`HandlerRegistry`].
//!
//! Handlers receive the network mutably, so they may add or retract facts,
//! register productions or call [`Network::halt`] while the pass runs. Each
//! production's matches are snapshotted when it is reached and matches deleted
//! by an earlier handler are skipped. A handler error is recorded against its
//! invocation and the pass moves on.

use crate::network::Network;
use crate::types::{Bindings, FactId, ProductionId, TokenId};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, error, info, instrument};

/// An action handler
pub type Handler = Box<dyn FnMut(&mut Network, &Activation) -> anyhow::Result<()>>;

/// Handlers keyed by action template name
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry").field("templates", &names).finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler to a template, replacing any previous one
    pub fn register(
        &mut self,
        template: impl Into<String>,
        handler: impl FnMut(&mut Network, &Activation) -> anyhow::Result<()> + 'static,
    ) {
        self.handlers.insert(template.into(), Box::new(handler));
    }

    pub fn remove(&mut self, template: &str) -> bool {
        self.handlers.remove(template).is_some()
    }

    pub fn contains(&self, template: &str) -> bool {
        self.handlers.contains_key(template)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn get_mut(&mut self, template: &str) -> Option<&mut Handler> {
        self.handlers.get_mut(template)
    }
}

/// What a handler sees for one complete match
#[derive(Debug, Clone)]
pub struct Activation {
    pub production: ProductionId,
    pub production_name: String,
    pub template: String,
    pub params: Map<String, Value>,
    pub token: TokenId,
    /// Matched facts, oldest first
    pub facts: Vec<FactId>,
    pub bindings: Bindings,
}

impl Activation {
    pub fn binding(&self, variable: &str) -> Option<&str> {
        self.bindings.get(variable).map(String::as_str)
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// String parameter, with `$var` references resolved against the bindings
    pub fn param_str(&self, key: &str) -> Option<String> {
        match self.params.get(key)? {
            Value::String(text) => Some(self.binding(text).map(str::to_string).unwrap_or_else(|| text.clone())),
            other => Some(other.to_string()),
        }
    }
}

/// A handler invocation that returned an error
#[derive(Debug)]
pub struct HandlerFailure {
    pub production: String,
    pub template: String,
    pub token: TokenId,
    pub error: anyhow::Error,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) failed on {}: {:#}", self.template, self.production, self.token, self.error)
    }
}

/// Outcome of one firing pass
#[derive(Debug, Default)]
pub struct FiringReport {
    /// Handler invocations that returned `Ok`
    pub fired: usize,
    /// Matches without a bound handler
    pub skipped: usize,
    pub failures: Vec<HandlerFailure>,
    /// The pass stopped early because a handler called halt
    pub halted: bool,
}

impl FiringReport {
    pub fn invocations(&self) -> usize {
        self.fired + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Network {
    /// Stop the current firing pass before the next handler invocation
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Run one firing pass over every registered production
    #[instrument(skip_all, fields(productions = self.productions.len()))]
    pub fn fire(&mut self, handlers: &mut HandlerRegistry) -> FiringReport {
        self.halted = false;
        let mut report = FiringReport::default();

        // Productions registered by a handler are visited in the same pass.
        let mut index = 0;
        'productions: while index < self.productions.len() {
            let id = ProductionId(index);
            index += 1;
            let compiled = &self.productions[id.0];
            let terminal = compiled.terminal;
            let name = compiled.production.name.clone();
            let template = compiled.production.action.template.clone();
            let params = compiled.production.action.params.clone();

            for token in self.memory_tokens(terminal).to_vec() {
                if self.halted {
                    break 'productions;
                }
                if !self.tokens.contains(token.0) {
                    continue;
                }
                let handler = if template.is_empty() { None } else { handlers.get_mut(&template) };
                let Some(handler) = handler else {
                    debug!(production = %name, template = %template, "No handler bound, match skipped");
                    report.skipped += 1;
                    continue;
                };

                let activation = Activation {
                    production: id,
                    production_name: name.clone(),
                    template: template.clone(),
                    params: params.clone(),
                    token,
                    facts: self.token_facts(token),
                    bindings: self.all_bindings(token),
                };
                match handler(self, &activation) {
                    Ok(()) => report.fired += 1,
                    Err(err) => {
                        error!(
                            production = %name,
                            template = %template,
                            token = %token,
                            error = format!("{err:?}"),
                            "Action handler failed"
                        );
                        report.failures.push(HandlerFailure {
                            production: name.clone(),
                            template: template.clone(),
                            token,
                            error: err,
                        });
                    }
                }
            }
        }

        report.halted = self.halted;
        info!(
            fired = report.fired,
            skipped = report.skipped,
            failures = report.failures.len(),
            halted = report.halted,
            "Firing pass complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Action, Condition, Production};
    use anyhow::bail;

    fn single(name: &str, template: &str, attribute: &str) -> Production {
        Production::new(name, vec![Condition::has("$p", "$id", attribute, "$v")], Action::new(template))
    }

    #[test]
    fn test_failure_is_isolated_per_invocation() {
        let mut network = Network::new();
        network.add_production(single("p", "maybe_fail", "score")).unwrap();
        network.add_wme("Player", "a", "score", "bad");
        network.add_wme("Player", "b", "score", "good");

        let mut handlers = HandlerRegistry::new();
        handlers.register("maybe_fail", |_net, activation| {
            if activation.binding("$v") == Some("bad") {
                bail!("cannot score {}", activation.binding("$id").unwrap_or("?"));
            }
            Ok(())
        });

        let report = network.fire(&mut handlers);
        assert_eq!(report.fired, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].template, "maybe_fail");
        assert!(report.failures[0].to_string().contains("cannot score a"));
        assert!(!report.halted);
    }

    #[test]
    fn test_missing_handler_and_empty_template_are_skipped() {
        let mut network = Network::new();
        network.add_production(single("unbound", "nobody", "x")).unwrap();
        network.add_production(single("blank", "", "x")).unwrap();
        network.add_wme("A", "1", "x", "y");

        let report = network.fire(&mut HandlerRegistry::new());
        assert_eq!(report.skipped, 2);
        assert_eq!(report.invocations(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_halt_flag_resets_each_pass() {
        let mut network = Network::new();
        network.add_production(single("p", "stop", "x")).unwrap();
        network.add_wme("A", "1", "x", "y");
        network.add_wme("A", "2", "x", "y");

        let mut handlers = HandlerRegistry::new();
        handlers.register("stop", |net, _| {
            net.halt();
            Ok(())
        });

        let first = network.fire(&mut handlers);
        assert_eq!(first.fired, 1);
        assert!(first.halted);

        let second = network.fire(&mut handlers);
        assert_eq!(second.fired, 1, "halt from the previous pass must not carry over");
    }

    #[test]
    fn test_tokens_removed_mid_pass_are_skipped() {
        let mut network = Network::new();
        network.add_production(single("p", "retract_other", "x")).unwrap();
        network.add_wme("A", "1", "x", "y");
        let second = network.add_wme("A", "2", "x", "y");
        network.add_object("victim", second);

        let mut handlers = HandlerRegistry::new();
        handlers.register("retract_other", |net, _| {
            if let Some(victim) = net.object::<FactId>("victim").copied() {
                net.retract_fact(victim);
            }
            Ok(())
        });

        let report = network.fire(&mut handlers);
        assert_eq!(report.fired, 1);
    }

    #[test]
    fn test_param_str_resolves_bindings() {
        let mut network = Network::new();
        let production = Production::new(
            "greet",
            vec![Condition::has("Person", "$who", "mood", "happy")],
            Action::new("say").with_param("to", "$who").with_param("times", 2),
        );
        network.add_production(production).unwrap();
        network.add_wme("Person", "ann", "mood", "happy");

        let mut handlers = HandlerRegistry::new();
        let (tx, rx) = std::sync::mpsc::channel();
        handlers.register("say", move |_, activation| {
            tx.send((activation.param_str("to"), activation.param_str("times")))?;
            Ok(())
        });
        network.fire(&mut handlers);
        let seen: Vec<_> = rx.try_iter().collect();
        assert_eq!(seen, vec![(Some("ann".to_string()), Some("2".to_string()))]);
    }
}
