//! `perk` command-line binary.
//!
//! Reads `perk.toml` (or the path given with `--config`), opens the SQLite
//! member store and runs one subcommand against it.
//!
//! ```text
//! perk add "Ada Lovelace" --tier gold --email ada@example.com
//! perk transact 1 --amount 12.50
//! perk stats --json
//! ```

mod command;
mod logic;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use perk_store_sqlite::SqliteRepository;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{command::Command, logic::Logic, settings::Settings};

#[derive(Parser)]
#[command(author, version, about = "Loyalty member management")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "perk.toml")]
  config: PathBuf,

  /// SQLite file to use instead of the configured one.
  #[arg(long, env = "PERK_STORE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }
  let preferences = settings.preferences();

  let repository = SqliteRepository::open(&preferences.store_path)
    .with_context(|| {
      format!("failed to open store at {:?}", preferences.store_path)
    })?;

  let mut logic = Logic::load(repository, preferences)?;
  tracing::debug!(
    members = logic.model().number_of_members(),
    "loaded member list"
  );
  let result = logic.execute(cli.command)?;
  println!("{}", result.feedback);

  Ok(())
}
