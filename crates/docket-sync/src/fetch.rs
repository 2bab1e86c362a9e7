//! Fetch-All: reload every collection from the remote store at once.
//!
//! Each kind is queried concurrently and settles on its own. A failed query
//! leaves its collection as it was; a successful one replaces it wholesale,
//! except that an empty result never displaces seeded reference rows.

use docket_core::{
  entity::{EntityKind, decode_all},
  record::{
    Appointment, Attendance, Book, CaseFile, CaseType, Counsel, Court, District, Expense,
    LibraryLocation, SofaItem, StorageItem, StorageLocation, Task, Transaction,
  },
};
use futures::{FutureExt as _, future::BoxFuture};

use crate::{
  mirror::Stored,
  notify::Notice,
  store::{Backend, Epoch, SyncStore},
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// What a reload did to one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
  /// Contents replaced with this many records.
  Replaced(usize),
  /// Remote returned nothing; the seeded rows stay.
  KeptSeeded,
  /// The query or its decoding failed; previous contents kept.
  Failed(String),
  /// The session closed before the result arrived.
  Discarded,
}

/// Per-kind outcomes of one Fetch-All. Empty when no session was open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
  outcomes: Vec<(EntityKind, FetchOutcome)>,
}

impl FetchReport {
  pub fn outcomes(&self) -> &[(EntityKind, FetchOutcome)] { &self.outcomes }

  pub fn outcome(&self, kind: EntityKind) -> Option<&FetchOutcome> {
    self.outcomes.iter().find(|(k, _)| *k == kind).map(|(_, o)| o)
  }

  pub fn failed(&self) -> Vec<EntityKind> {
    self
      .outcomes
      .iter()
      .filter(|(_, o)| matches!(o, FetchOutcome::Failed(_)))
      .map(|(k, _)| *k)
      .collect()
  }

  /// Some, but not all, collections failed to load.
  pub fn is_partial_failure(&self) -> bool {
    let failed = self.failed().len();
    failed > 0 && failed < self.outcomes.len()
  }

  /// Every collection failed to load.
  pub fn is_total_failure(&self) -> bool {
    !self.outcomes.is_empty() && self.failed().len() == self.outcomes.len()
  }

  pub fn was_skipped(&self) -> bool { self.outcomes.is_empty() }

  /// The session closed before any result could be applied.
  pub fn was_discarded(&self) -> bool {
    !self.outcomes.is_empty() && self.outcomes.iter().all(|(_, o)| *o == FetchOutcome::Discarded)
  }
}

// ─── Orchestration ───────────────────────────────────────────────────────────

impl<B: Backend> SyncStore<B> {
  /// Reload every collection. Never fails; the report says what happened
  /// per kind. Without an open session nothing is queried.
  pub async fn fetch_all(&self) -> FetchReport {
    let Some((epoch, _)) = self.current() else {
      tracing::debug!("no active session; skipping reload");
      return FetchReport::default();
    };

    let queries: Vec<BoxFuture<'_, (EntityKind, FetchOutcome)>> = vec![
      self.fetch_kind::<CaseFile>(epoch).boxed(),
      self.fetch_kind::<Appointment>(epoch).boxed(),
      self.fetch_kind::<Counsel>(epoch).boxed(),
      self.fetch_kind::<Transaction>(epoch).boxed(),
      self.fetch_kind::<Task>(epoch).boxed(),
      self.fetch_kind::<Attendance>(epoch).boxed(),
      self.fetch_kind::<Expense>(epoch).boxed(),
      self.fetch_kind::<Book>(epoch).boxed(),
      self.fetch_kind::<StorageItem>(epoch).boxed(),
      self.fetch_kind::<SofaItem>(epoch).boxed(),
      self.fetch_kind::<LibraryLocation>(epoch).boxed(),
      self.fetch_kind::<StorageLocation>(epoch).boxed(),
      self.fetch_kind::<Court>(epoch).boxed(),
      self.fetch_kind::<CaseType>(epoch).boxed(),
      self.fetch_kind::<District>(epoch).boxed(),
    ];

    let report = FetchReport { outcomes: futures::future::join_all(queries).await };
    self.summarise(&report);
    report
  }

  async fn fetch_kind<E: Stored>(&self, epoch: Epoch) -> (EntityKind, FetchOutcome) {
    let kind = E::KIND;
    let table = kind.table();

    let rows = match self.inner.backend.get_all(table).await {
      Ok(rows) => rows,
      Err(e) => {
        tracing::warn!(table, error = %e, "load failed; keeping previous contents");
        return (kind, FetchOutcome::Failed(e.to_string()));
      }
    };

    let records = match decode_all::<E>(&rows) {
      Ok(records) => records,
      Err(e) => {
        tracing::warn!(table, error = %e, "undecodable rows; keeping previous contents");
        return (kind, FetchOutcome::Failed(e.to_string()));
      }
    };

    if kind.is_seeded() && records.is_empty() {
      tracing::debug!(table, "no remote rows; keeping seeded defaults");
      return (kind, FetchOutcome::KeptSeeded);
    }

    let count = records.len();
    if self.apply(epoch, |m| m.get_mut::<E>().replace_all(records)) {
      tracing::debug!(table, count, "collection replaced");
      (kind, FetchOutcome::Replaced(count))
    } else {
      (kind, FetchOutcome::Discarded)
    }
  }

  fn summarise(&self, report: &FetchReport) {
    if report.was_discarded() {
      return;
    }

    if report.is_total_failure() {
      tracing::error!("every collection failed to load");
      self.notify(Notice::error("Failed to load data. Check your connection and try again."));
    } else if report.is_partial_failure() {
      let failed = report.failed();
      tracing::warn!(?failed, "some collections failed to load");
      if self.config().notify_partial_failures {
        let names: Vec<String> = failed.iter().map(ToString::to_string).collect();
        self.notify(Notice::error(format!("Some data failed to load: {}", names.join(", "))));
      }
    } else {
      tracing::info!(collections = report.outcomes.len(), "mirror reloaded");
    }

    self.bump_refreshes();
  }
}
