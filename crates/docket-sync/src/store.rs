//! [`SyncStore`]: the session-scoped owner of the mirror.
//!
//! A store is constructed once and handed to whatever needs the data. It is
//! inert until [`SyncStore::open`] starts a session: that subscribes to the
//! watched tables and loads every collection. [`SyncStore::close`] tears the
//! subscriptions down and resets the mirror.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::NaiveDate;
use docket_core::{
  record::{Attendance, Compartment},
  remote::{ChangeFeed, RemoteStore, SubscriptionId},
};
use tokio::{sync::watch, task::JoinHandle};
use uuid::Uuid;

use crate::{
  config::SyncConfig,
  error::{Error, Result},
  fetch::FetchReport,
  listener,
  mirror::{Mirror, Stored},
  notify::{LogNotifier, Notice, Notifier},
};

/// Anything that can serve as the remote side of a [`SyncStore`].
pub trait Backend: RemoteStore + ChangeFeed + 'static {}

impl<T: RemoteStore + ChangeFeed + 'static> Backend for T {}

/// The signed-in user a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
  pub user_id: Uuid,
}

/// Identifies one open session. Results that arrive after their session has
/// closed are dropped instead of applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Epoch(u64);

struct Active {
  session:       Session,
  epoch:         Epoch,
  subscriptions: Vec<SubscriptionId>,
  listener:      Option<JoinHandle<()>>,
}

struct State {
  mirror: Mirror,
  active: Option<Active>,
  epochs: u64,
}

pub(crate) struct Inner<B> {
  pub(crate) backend:  B,
  pub(crate) config:   SyncConfig,
  notifier:            Arc<dyn Notifier>,
  state:               Mutex<State>,
  refreshes:           watch::Sender<u64>,
}

impl<B> Drop for Inner<B> {
  fn drop(&mut self) {
    let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
    if let Some(listener) = state.active.take().and_then(|a| a.listener) {
      listener.abort();
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Client-side mirror of the remote record store.
///
/// Cloning is cheap; all clones share one mirror and one session.
pub struct SyncStore<B> {
  pub(crate) inner: Arc<Inner<B>>,
}

impl<B> Clone for SyncStore<B> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<B: Backend> SyncStore<B> {
  /// A store that reports notices to the log.
  pub fn new(backend: B, config: SyncConfig) -> Self {
    Self::with_notifier(backend, config, Arc::new(LogNotifier))
  }

  pub fn with_notifier(backend: B, config: SyncConfig, notifier: Arc<dyn Notifier>) -> Self {
    let (refreshes, _) = watch::channel(0);
    Self {
      inner: Arc::new(Inner {
        backend,
        config,
        notifier,
        state: Mutex::new(State {
          mirror: Mirror::seeded(),
          active: None,
          epochs: 0,
        }),
        refreshes,
      }),
    }
  }

  pub fn backend(&self) -> &B { &self.inner.backend }

  pub fn config(&self) -> &SyncConfig { &self.inner.config }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  /// Start a session for `session.user_id`: subscribe to every watched table,
  /// then load every collection. An already-open session is closed first.
  pub async fn open(&self, session: Session) -> FetchReport {
    if self.is_active() {
      self.close().await;
    }

    let epoch = {
      let mut state = self.state();
      state.epochs += 1;
      let epoch = Epoch(state.epochs);
      state.mirror.reset();
      state.active = Some(Active {
        session,
        epoch,
        subscriptions: Vec::new(),
        listener: None,
      });
      epoch
    };
    tracing::info!(user = %session.user_id, "session opened");

    let (ids, streams) = listener::subscribe_watched(&self.inner.backend).await;
    let handle = listener::spawn(Arc::downgrade(&self.inner), streams);

    let orphaned = {
      let mut state = self.state();
      match state.active.as_mut() {
        Some(active) if active.epoch == epoch => {
          active.subscriptions = ids;
          active.listener = Some(handle);
          None
        }
        _ => Some((ids, handle)),
      }
    };
    if let Some((ids, handle)) = orphaned {
      tracing::debug!("session closed while subscribing; releasing subscriptions");
      handle.abort();
      self.unsubscribe_all(ids).await;
    }

    self.fetch_all().await
  }

  /// End the session: stop listening, close every subscription and reset
  /// the mirror to its seeded state. A no-op without a session.
  pub async fn close(&self) {
    let active = {
      let mut state = self.state();
      state.mirror.reset();
      state.active.take()
    };
    let Some(active) = active else {
      return;
    };

    if let Some(listener) = active.listener {
      listener.abort();
    }
    self.unsubscribe_all(active.subscriptions).await;
    tracing::info!(user = %active.session.user_id, "session closed");
  }

  async fn unsubscribe_all(&self, ids: Vec<SubscriptionId>) {
    for id in ids {
      if let Err(e) = self.inner.backend.unsubscribe(id).await {
        tracing::warn!(subscription = id, error = %e, "failed to unsubscribe");
      }
    }
  }

  pub fn session(&self) -> Option<Session> { self.state().active.as_ref().map(|a| a.session) }

  pub fn is_active(&self) -> bool { self.state().active.is_some() }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Run `f` against the mirror. Keep it short; writers wait on it.
  pub fn read<R>(&self, f: impl FnOnce(&Mirror) -> R) -> R { f(&self.state().mirror) }

  /// Every record of kind `E`, in display order.
  pub fn snapshot<E: Stored>(&self) -> Vec<E> { self.read(|m| m.get::<E>().to_vec()) }

  pub fn get<E: Stored>(&self, id: Uuid) -> Option<E> {
    self.read(|m| m.get::<E>().get(id).cloned())
  }

  /// The attendance record for `user_id` on `date`, confirmed or local.
  pub fn attendance_for(&self, user_id: Uuid, date: NaiveDate) -> Option<Attendance> {
    self.read(|m| {
      m.attendance
        .iter()
        .find(|a| a.user_id == user_id && a.date == date)
        .cloned()
    })
  }

  /// Compartments currently holding `case_id`.
  pub fn sofa_occupancy(&self, case_id: Uuid) -> Vec<Compartment> {
    self.read(|m| {
      m.sofa_items
        .iter()
        .filter(|slot| slot.case_id == case_id)
        .map(|slot| slot.compartment)
        .collect()
    })
  }

  /// Counter of completed reloads; bumps after every Fetch-All.
  pub fn refreshes(&self) -> watch::Receiver<u64> { self.inner.refreshes.subscribe() }

  // ── Internals ─────────────────────────────────────────────────────────────

  fn state(&self) -> MutexGuard<'_, State> { self.inner.lock_state() }

  pub(crate) fn current(&self) -> Option<(Epoch, Session)> {
    self.state().active.as_ref().map(|a| (a.epoch, a.session))
  }

  pub(crate) fn require_session(&self) -> Result<(Epoch, Session)> {
    self.current().ok_or_else(|| {
      tracing::warn!("write attempted without an active session");
      Error::NoSession
    })
  }

  /// Mutate the mirror if `epoch` is still the open session. Returns whether
  /// `f` ran.
  pub(crate) fn apply(&self, epoch: Epoch, f: impl FnOnce(&mut Mirror)) -> bool {
    let mut state = self.state();
    if state.active.as_ref().map(|a| a.epoch) != Some(epoch) {
      tracing::debug!("dropping result from a closed session");
      return false;
    }
    f(&mut state.mirror);
    true
  }

  pub(crate) fn notify(&self, notice: Notice) { self.inner.notifier.notify(notice); }

  pub(crate) fn bump_refreshes(&self) { self.inner.refreshes.send_modify(|n| *n += 1); }

  pub(crate) fn from_inner(inner: Arc<Inner<B>>) -> Self { Self { inner } }
}

impl<B> Inner<B> {
  fn lock_state(&self) -> MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

pub(crate) type WeakInner<B> = Weak<Inner<B>>;
