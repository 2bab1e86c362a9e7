//! `docket`: command-line client for the Docket record store.
//!
//! Each invocation opens a sync session against the SQLite store, runs one
//! command through it, and closes the session.
//!
//! # Usage
//!
//! ```text
//! docket sync
//! docket list cases
//! docket add-case "OS 12/2024" "Rao v. Rao" "K. Rao" --next-date 2024-07-01
//! docket sofa-add <case-id> C1
//! docket attend present
//! docket watch
//! ```

mod commands;
mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use docket_core::{
  entity::EntityKind,
  record::{AttendanceStatus, Compartment},
};
use docket_store_sqlite::SqliteStore;
use docket_sync::{Session, SyncStore};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::{commands::Console, config::CliConfig};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "docket", author, version, about = "Docket record store client")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "docket.toml")]
  config: PathBuf,

  /// Act as this user instead of the configured `user_id`.
  #[arg(long, env = "DOCKET_USER")]
  user: Option<Uuid>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load every collection and print per-kind counts.
  Sync,
  /// Print every record of one kind as JSON lines.
  List {
    /// Entity kind, e.g. `case`, `sofa_item`, `court`.
    kind: EntityKind,
  },
  /// Open a new case.
  AddCase {
    number:    String,
    title:     String,
    client:    String,
    #[arg(long)]
    court:     Option<String>,
    #[arg(long)]
    case_type: Option<String>,
    #[arg(long)]
    district:  Option<String>,
    #[arg(long)]
    next_date: Option<NaiveDate>,
  },
  /// Shelve a case in a sofa compartment.
  SofaAdd {
    case_id:     Uuid,
    compartment: Compartment,
    #[arg(long)]
    notes:       Option<String>,
  },
  /// Mark attendance for the current user.
  Attend {
    status:    AttendanceStatus,
    /// Defaults to today.
    #[arg(long)]
    date:      Option<NaiveDate>,
    #[arg(long)]
    check_in:  Option<String>,
    #[arg(long)]
    check_out: Option<String>,
    #[arg(long)]
    notes:     Option<String>,
  },
  /// Keep the session open and report every reload until interrupted.
  Watch,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;

  let user_id = cli
    .user
    .or(cfg.user_id)
    .context("no user configured; set `user_id` in the config file or pass --user")?;

  let backend = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let store = SyncStore::with_notifier(backend, cfg.sync.clone(), Arc::new(Console));

  let report = store.open(Session { user_id }).await;
  if report.is_total_failure() {
    store.close().await;
    anyhow::bail!("could not load any data from {:?}", cfg.store_path);
  }

  let result = commands::run(&store, user_id, cli.command).await;
  store.close().await;
  result
}
