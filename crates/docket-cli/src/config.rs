//! Configuration for the `docket` binary.
//!
//! Read from `docket.toml` (or `--config`), then overridden by `DOCKET_*`
//! environment variables. Nested keys use a double underscore, e.g.
//! `DOCKET_SYNC__DEBOUNCE_MS=0`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use docket_sync::SyncConfig;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// SQLite file backing the record store.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// The signed-in user the session is opened for.
  #[serde(default)]
  pub user_id:    Option<Uuid>,
  #[serde(default)]
  pub sync:       SyncConfig,
}

fn default_store_path() -> PathBuf { PathBuf::from("docket.db") }

impl CliConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> { Self::load_with(path, environment()) }

  fn load_with(path: &Path, env: config::Environment) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env)
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }
}

/// `DOCKET_<KEY>` with `__` between nested keys.
fn environment() -> config::Environment {
  config::Environment::with_prefix("DOCKET")
    .prefix_separator("_")
    .separator("__")
    .try_parsing(true)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
