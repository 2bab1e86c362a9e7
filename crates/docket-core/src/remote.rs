//! The contract a remote record store fulfils.
//!
//! Backends (e.g. `docket-store-sqlite`) implement [`RemoteStore`] for
//! table-level CRUD and [`ChangeFeed`] for push notifications. Rows cross this
//! boundary in their external (`snake_case`) shape; the sync layer translates.

use std::future::Future;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Value;

// ─── Change notifications ────────────────────────────────────────────────────

pub type SubscriptionId = u64;

/// What happened to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEvent {
  Insert,
  Update,
  Delete,
}

/// Which events a subscription wants. `All` is the `'*'` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
  #[default]
  All,
  Only(ChangeEvent),
}

impl EventFilter {
  pub fn matches(self, event: ChangeEvent) -> bool {
    match self {
      Self::All => true,
      Self::Only(wanted) => wanted == event,
    }
  }
}

/// A single push notification. The sync layer treats it purely as a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
  pub table: String,
  pub event: ChangeEvent,
  /// The affected row, when the backend supplies one.
  pub row:   Option<Value>,
}

/// An open subscription. The stream ends when the subscription is closed on
/// the backend side.
pub struct Subscription {
  pub id:      SubscriptionId,
  pub table:   String,
  pub changes: BoxStream<'static, Change>,
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("id", &self.id)
      .field("table", &self.table)
      .finish_non_exhaustive()
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Table-level CRUD against the authoritative store.
///
/// All methods return `Send` futures so implementors can be shared across
/// tokio tasks.
pub trait RemoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every row of `table`.
  fn get_all<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Vec<Value>, Self::Error>> + Send + 'a;

  /// Insert a row and return it as stored (with its assigned `id` and
  /// `created_at`).
  fn create<'a>(
    &'a self,
    table: &'a str,
    row: Value,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  /// Patch the given columns of row `id` and return the full updated row.
  fn update<'a>(
    &'a self,
    table: &'a str,
    id: Uuid,
    patch: Value,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;

  fn delete<'a>(
    &'a self,
    table: &'a str,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Insert `row`, or update the existing row whose `conflict` columns match.
  fn upsert<'a>(
    &'a self,
    table: &'a str,
    row: Value,
    conflict: &'static [&'static str],
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;
}

/// Push notifications for remote table changes.
pub trait ChangeFeed: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn subscribe<'a>(
    &'a self,
    table: &'a str,
    filter: EventFilter,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + 'a;

  /// Close a subscription. Unknown ids are ignored.
  fn unsubscribe(
    &self,
    id: SubscriptionId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
