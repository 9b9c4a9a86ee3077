//! `cardex`: migrate card-game reference data into a SQLite store and export
//! JSON snapshots.
//!
//! # Usage
//!
//! ```
//! cardex migrate
//! cardex migrate --only sides --only factions
//! cardex archive
//! cardex inspect transactions/cards.toml
//! ```
//!
//! Settings are read from `cardex.toml` (or the path given with `--config`)
//! and `CARDEX_*` environment variables.

mod commands;
mod config;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use cardex_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "cardex", version, about = "Card-data migration toolkit")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "cardex.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the configured transactions and write their snapshots.
  Migrate {
    /// Only run the named transactions (repeatable).
    #[arg(long, value_name = "NAME")]
    only: Vec<String>,
  },
  /// Export every stored entity kind to the output directory.
  Archive,
  /// Report how a descriptor's sources join, without writing anything.
  Inspect {
    descriptor: PathBuf,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match run(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      tracing::error!("{err:#}");
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
  if let Command::Inspect { descriptor } = &cli.command {
    return commands::inspect(descriptor);
  }

  let app = AppConfig::load(&cli.config)?;

  let store = SqliteStore::open(&app.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", app.store_path))?;

  let outcome = match &cli.command {
    Command::Migrate { only } => commands::migrate(&store, &app, only).await,
    Command::Archive => commands::archive(&store, &app.output_dir).await,
    Command::Inspect { .. } => Ok(()),
  };

  commands::close_after(store, outcome).await
}
