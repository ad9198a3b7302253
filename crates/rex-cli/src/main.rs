mod cli;
mod config;
mod handlers;
mod tracing_setup;

use clap::Parser;
use cli::RexCli;
use config::RexConfig;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = RexCli::parse();
    let config = RexConfig::load(cli.config.as_deref())?.apply_profile();
    config.network.validate()?;

    tracing_setup::init_tracing(&config.logging, cli.verbose)?;
    config.report_source();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting rex");

    cli.execute(&config)
}
