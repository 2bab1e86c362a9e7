//! Invalidation: remote change notifications trigger a full reload.
//!
//! Invalidation is coarse. Which row changed, and how, is ignored; any
//! notification on any watched table reloads every collection. Notifications
//! arriving within the debounce window of the first one share its reload.

use std::time::Duration;

use docket_core::{
  entity::EntityKind,
  remote::{Change, ChangeFeed, EventFilter, SubscriptionId},
};
use futures::{StreamExt as _, stream::BoxStream};
use tokio::task::JoinHandle;

use crate::{
  notify::Notice,
  store::{Backend, SyncStore, WeakInner},
};

/// Subscribe to every watched table. Tables that refuse a subscription are
/// logged and skipped; the rest still invalidate.
pub(crate) async fn subscribe_watched<F: ChangeFeed>(
  feed: &F,
) -> (Vec<SubscriptionId>, Vec<BoxStream<'static, Change>>) {
  let mut ids = Vec::new();
  let mut streams = Vec::new();
  for kind in EntityKind::watched() {
    match feed.subscribe(kind.table(), EventFilter::All).await {
      Ok(subscription) => {
        tracing::debug!(table = kind.table(), id = subscription.id, "watching table");
        ids.push(subscription.id);
        streams.push(subscription.changes);
      }
      Err(e) => {
        tracing::warn!(table = kind.table(), error = %e, "could not watch table");
      }
    }
  }
  (ids, streams)
}

/// Spawn the listener task. It holds only a weak reference, so dropping the
/// last [`SyncStore`] ends it at the next notification.
pub(crate) fn spawn<B: Backend>(
  inner: WeakInner<B>,
  streams: Vec<BoxStream<'static, Change>>,
) -> JoinHandle<()> {
  tokio::spawn(listen(inner, streams))
}

async fn listen<B: Backend>(inner: WeakInner<B>, streams: Vec<BoxStream<'static, Change>>) {
  let mut changes = futures::stream::select_all(streams);

  while let Some(change) = changes.next().await {
    let Some(strong) = inner.upgrade() else {
      return;
    };
    let store = SyncStore::from_inner(strong);
    tracing::debug!(table = %change.table, event = ?change.event, "remote change");

    let coalesced = 1 + drain_window(&mut changes, store.config().debounce()).await;
    tracing::debug!(coalesced, "reloading after remote change");
    let report = store.fetch_all().await;
    if !report.was_skipped() && !report.was_discarded() && !report.is_total_failure() {
      store.notify(Notice::info("Data refreshed after a remote change"));
    }
    drop(store);
  }

  tracing::warn!("change subscriptions ended; the mirror will not refresh on remote changes");
}

/// Swallow notifications for `window` after the first one. Returns how many
/// were absorbed.
async fn drain_window(
  changes: &mut futures::stream::SelectAll<BoxStream<'static, Change>>,
  window: Duration,
) -> usize {
  if window.is_zero() {
    return 0;
  }

  let deadline = tokio::time::sleep(window);
  tokio::pin!(deadline);
  let mut absorbed = 0;
  loop {
    tokio::select! {
      _ = &mut deadline => return absorbed,
      next = changes.next() => match next {
        Some(_) => absorbed += 1,
        None => return absorbed,
      },
    }
  }
}
