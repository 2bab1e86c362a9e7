//! In-process change fan-out for [`SqliteStore`](crate::SqliteStore).

use std::{
  collections::HashMap,
  sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
  },
};

use docket_core::{
  remote::{Change, ChangeEvent, EventFilter, Subscription, SubscriptionId},
  value::Value,
};
use futures::StreamExt as _;
use tokio::sync::mpsc;

struct Subscriber {
  table:  String,
  filter: EventFilter,
  tx:     mpsc::UnboundedSender<Change>,
}

/// Registry of open subscriptions, keyed by id.
#[derive(Default)]
pub struct Feed {
  next_id:     AtomicU64,
  subscribers: Mutex<HashMap<SubscriptionId, Subscriber>>,
}

impl Feed {
  fn subscribers(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Subscriber>> {
    self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn subscribe(&self, table: &str, filter: EventFilter) -> Subscription {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
    let (tx, rx) = mpsc::unbounded_channel();
    self.subscribers().insert(id, Subscriber {
      table: table.to_owned(),
      filter,
      tx,
    });

    let changes = futures::stream::unfold(rx, |mut rx| async move {
      rx.recv().await.map(|change| (change, rx))
    })
    .boxed();

    Subscription { id, table: table.to_owned(), changes }
  }

  /// Returns whether `id` was open. Dropping the sender ends the stream.
  pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
    self.subscribers().remove(&id).is_some()
  }

  /// Deliver a change to every matching subscriber, pruning closed ones.
  pub fn publish(&self, table: &str, event: ChangeEvent, row: Option<Value>) {
    let mut subscribers = self.subscribers();
    subscribers.retain(|id, sub| {
      if sub.table != table || !sub.filter.matches(event) {
        return true;
      }
      let change = Change { table: table.to_owned(), event, row: row.clone() };
      let delivered = sub.tx.send(change).is_ok();
      if !delivered {
        tracing::debug!(subscription = id, table, "pruning closed subscription");
      }
      delivered
    });
  }

  pub fn open_count(&self) -> usize { self.subscribers().len() }
}
