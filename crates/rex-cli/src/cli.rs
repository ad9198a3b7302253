//! Command-line interface: load a rule file and optionally a fact file, then
//! either report the compiled network or run firing passes over it.

use crate::config::RexConfig;
use crate::handlers::{FIRE_COUNTS, FireCounts, builtin_handlers};
use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rex_core::{Network, NetworkStats};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Parser, Debug)]
#[command(name = "rex")]
#[command(about = "Run production rules through a RETE network")]
#[command(version)]
pub struct RexCli {
    #[command(subcommand)]
    pub command: RexCommand,

    /// Configuration file (defaults to $REX_CONFIG_PATH, then rex.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum RexCommand {
    /// Load rules and facts, then fire
    Run {
        /// Rule document (productions or event rules, JSON)
        rules: PathBuf,

        /// Fact document (JSON)
        #[arg(long)]
        facts: Option<PathBuf>,

        /// Firing passes to run; a halted pass ends the run
        #[arg(long, default_value_t = 1)]
        passes: usize,

        /// Exit with an error if any handler failed
        #[arg(long)]
        strict: bool,
    },

    /// Parse and compile rules without firing
    Check {
        /// Rule document (productions or event rules, JSON)
        rules: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Totals across every pass of a run
#[derive(Serialize, Debug, Default)]
pub struct RunSummary {
    pub passes: usize,
    pub fired: usize,
    pub skipped: usize,
    pub failures: Vec<String>,
    pub halted: bool,
    pub fire_counts: FireCounts,
    pub stats: NetworkStats,
}

impl RexCli {
    pub fn execute(&self, config: &RexConfig) -> anyhow::Result<()> {
        match &self.command {
            RexCommand::Run { rules, facts, passes, strict } => {
                let summary = run(config, rules, facts.as_deref(), *passes)?;
                self.print_summary(&summary)?;
                if *strict && !summary.failures.is_empty() {
                    bail!("{} handler invocation(s) failed", summary.failures.len());
                }
                Ok(())
            }
            RexCommand::Check { rules } => {
                let network = load_network(config, rules)?;
                let stats = network.stats();
                match self.format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                    OutputFormat::Text => {
                        println!("{} production(s) compiled", stats.productions);
                        println!(
                            "  {} beta node(s), {} alpha memories, {} constant-test node(s)",
                            stats.beta_nodes, stats.alpha_memories, stats.constant_test_nodes
                        );
                    }
                }
                Ok(())
            }
        }
    }

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
            OutputFormat::Text => {
                println!(
                    "{} pass(es): {} fired, {} skipped, {} failed{}",
                    summary.passes,
                    summary.fired,
                    summary.skipped,
                    summary.failures.len(),
                    if summary.halted { " (halted)" } else { "" }
                );
                for failure in &summary.failures {
                    println!("  failed: {failure}");
                }
                for (production, count) in &summary.fire_counts {
                    println!("  {production}: {count}");
                }
            }
        }
        Ok(())
    }
}

pub fn load_network(config: &RexConfig, rules: &Path) -> anyhow::Result<Network> {
    let text = fs::read_to_string(rules).with_context(|| format!("Failed to read rules '{}'", rules.display()))?;
    let productions = rex_rules::parse_rules(&text, &config.network)
        .with_context(|| format!("Invalid rules in '{}'", rules.display()))?;
    let mut network = Network::with_config(config.network.clone())?;
    rex_rules::install(&mut network, productions)?;
    Ok(network)
}

#[instrument(skip(config))]
pub fn run(config: &RexConfig, rules: &Path, facts: Option<&Path>, passes: usize) -> anyhow::Result<RunSummary> {
    let mut network = load_network(config, rules)?;
    if let Some(path) = facts {
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read facts '{}'", path.display()))?;
        let facts = rex_rules::parse_facts(&text).with_context(|| format!("Invalid facts in '{}'", path.display()))?;
        info!(count = facts.len(), "Loading facts");
        for fact in facts {
            network.add_fact(fact);
        }
    }

    let mut handlers = builtin_handlers();
    let mut summary = RunSummary::default();
    for _ in 0..passes {
        let report = network.fire(&mut handlers);
        summary.passes += 1;
        summary.fired += report.fired;
        summary.skipped += report.skipped;
        for failure in &report.failures {
            warn!(%failure, "Handler failed");
        }
        summary.failures.extend(report.failures.iter().map(ToString::to_string));
        if report.halted {
            summary.halted = true;
            break;
        }
    }

    summary.fire_counts = network.object::<FireCounts>(FIRE_COUNTS).cloned().unwrap_or_default();
    summary.stats = network.stats();
    Ok(summary)
}
