//! Entry point: parses arguments, builds a pooled Postgres store, and
//! dispatches to the matching `commands` module. Exit codes follow
//! spec §6/§7: 0 success, 2 invalid input, 3 store error, 4 cancelled.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command};
use substrate_core::SubstrateError;
use substrate_store::{build_pool, PoolConfig, PostgresStore};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            tracing::error!(%err, "command failed");
            eprintln!("error: {err}");
            std::process::exit(err.exit_code());
        }
    }
}

fn run(cli: &Cli) -> substrate_core::Result<()> {
    let dsn = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("SUBSTRATE_DATABASE_URL").ok())
        .ok_or_else(|| SubstrateError::InvalidInput("no database URL given (--database-url or $SUBSTRATE_DATABASE_URL)".to_string()))?;

    let pool = build_pool(&PoolConfig::new(dsn))?;
    let store = PostgresStore::new(pool);

    match &cli.command {
        Command::Ingest { kind } => commands::ingest::run(&store, kind),
        Command::Seed { kind } => commands::seed::run(&store, kind),
        Command::Reconstruct { id, as_kind } => commands::reconstruct::run(&store, *id, *as_kind),
        Command::Lookup { hash } => commands::lookup::run(&store, hash),
    }
}
