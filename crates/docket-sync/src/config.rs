//! Runtime configuration for the sync layer.

use std::time::Duration;

use serde::Deserialize;

/// Settings for a [`SyncStore`](crate::SyncStore), deserialisable from the
/// `[sync]` table of `docket.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  /// Window in which bursts of change notifications collapse into a single
  /// reload. Zero reloads on every notification.
  pub debounce_ms:             u64,
  /// Raise a user-visible notice when some (but not all) collections fail
  /// to load. Partial failures are always logged.
  pub notify_partial_failures: bool,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      debounce_ms:             250,
      notify_partial_failures: false,
    }
  }
}

impl SyncConfig {
  pub fn debounce(&self) -> Duration { Duration::from_millis(self.debounce_ms) }
}
