//! The write path: guard → translate → remote call → apply.
//!
//! The mirror changes only after the remote store confirms a write, and then
//! with the row the store returned. A failed call leaves the mirror alone.
//! Attendance is the one exception: a failed upsert still records the mark
//! locally, flagged [`local_only`](docket_core::record::Attendance::local_only),
//! until the next reload or successful write replaces it.
//!
//! Each invocation makes exactly one remote call. Nothing is retried.

use chrono::Utc;
use docket_core::{
  entity::{Entity, EntityKind, decode, encode},
  record::{Attendance, Book, LibraryLocation, SofaItem, StorageItem, StorageLocation},
  value::{Payload, Value},
};
use uuid::Uuid;

use crate::{
  draft::{AttendanceMark, NewBook, NewLocation, NewSofaItem, NewStorageItem},
  error::{Error, Operation, Result},
  guard,
  mirror::{Mirror, Stored},
  notify::Notice,
  store::{Backend, Session, SyncStore},
};

/// Columns identifying an attendance row for upserts.
const ATTENDANCE_KEY: &[&str] = &["user_id", "date"];

impl<B: Backend> SyncStore<B> {
  // ── Generic operations ────────────────────────────────────────────────────

  /// Create a record of kind `E` from an internal-shape payload. The kind's
  /// guard runs first; on success the stored record is put at the front of
  /// its collection.
  pub async fn create<E: Stored>(&self, mut payload: Payload) -> Result<E> {
    let (epoch, session) = self.require_session()?;
    let kind = E::KIND;

    if let Err(failure) = self.read(|m| guard::check_create(kind, m, &payload)) {
      return Err(self.failed(kind, Operation::Create, failure.into()));
    }
    stamp_owner(kind, &mut payload, session);

    let row = encode::<E>(&payload);
    tracing::debug!(table = kind.table(), "creating record");

    let stored = match self.inner.backend.create(kind.table(), row).await {
      Ok(stored) => stored,
      Err(e) => return Err(self.failed(kind, Operation::Create, remote(kind, Operation::Create, e))),
    };
    let record = self.decode_stored::<E>(&stored, Operation::Create)?;

    if self.apply(epoch, |m| m.get_mut::<E>().insert_front(record.clone())) {
      tracing::debug!(table = kind.table(), id = %record.id(), "record created");
      self.notify(Notice::success(format!("{} added", label(kind))));
    }
    Ok(record)
  }

  /// Patch the fields in `patch` on record `id`. The record keeps its place
  /// in the collection. Moving a sofa slot is guarded like creating one.
  pub async fn update<E: Stored>(&self, id: Uuid, patch: Payload) -> Result<E> {
    let (epoch, _) = self.require_session()?;
    let kind = E::KIND;

    if let Err(failure) = self.read(|m| guard::check_update(kind, m, id, &patch)) {
      return Err(self.failed(kind, Operation::Update, failure.into()));
    }

    let row = encode::<E>(&patch);
    tracing::debug!(table = kind.table(), %id, "updating record");

    let stored = match self.inner.backend.update(kind.table(), id, row).await {
      Ok(stored) => stored,
      Err(e) => return Err(self.failed(kind, Operation::Update, remote(kind, Operation::Update, e))),
    };
    let record = self.decode_stored::<E>(&stored, Operation::Update)?;

    let applied = self.apply(epoch, |m| {
      if !m.get_mut::<E>().update_by_id(id, record.clone()) {
        tracing::debug!(table = kind.table(), %id, "updated record not mirrored");
      }
    });
    if applied {
      self.notify(Notice::success(format!("{} updated", label(kind))));
    }
    Ok(record)
  }

  pub async fn delete<E: Stored>(&self, id: Uuid) -> Result<()> {
    let (epoch, _) = self.require_session()?;
    let kind = E::KIND;
    tracing::debug!(table = kind.table(), %id, "deleting record");

    if let Err(e) = self.inner.backend.delete(kind.table(), id).await {
      return Err(self.failed(kind, Operation::Delete, remote(kind, Operation::Delete, e)));
    }

    let applied = self.apply(epoch, |m| {
      m.get_mut::<E>().remove_by_id(id);
    });
    if applied {
      self.notify(Notice::success(format!("{} deleted", label(kind))));
    }
    Ok(())
  }

  // ── Named operations ──────────────────────────────────────────────────────

  pub async fn add_book(&self, book: NewBook) -> Result<Book> {
    self.create(self.payload_of::<Book>(&book)?).await
  }

  pub async fn add_library_location(&self, location: NewLocation) -> Result<LibraryLocation> {
    self.create(self.payload_of::<LibraryLocation>(&location)?).await
  }

  pub async fn add_storage_location(&self, location: NewLocation) -> Result<StorageLocation> {
    self.create(self.payload_of::<StorageLocation>(&location)?).await
  }

  pub async fn add_storage_item(&self, item: NewStorageItem) -> Result<StorageItem> {
    self.create(self.payload_of::<StorageItem>(&item)?).await
  }

  /// Shelve a case in a sofa compartment. Fails locally if the case is
  /// unknown or already in that compartment.
  pub async fn add_sofa_item(&self, item: NewSofaItem) -> Result<SofaItem> {
    self.create(self.payload_of::<SofaItem>(&item)?).await
  }

  /// Record attendance for `(user_id, date)`, overwriting any earlier mark.
  ///
  /// If the remote upsert fails the mark is still recorded locally and
  /// returned with `local_only` set; the failure is reported as a notice.
  pub async fn mark_attendance(&self, mark: AttendanceMark) -> Result<Attendance> {
    let (epoch, _) = self.require_session()?;
    let kind = EntityKind::Attendance;

    let mut payload = self.payload_of::<Attendance>(&mark)?;
    payload.set("date", mark.date);
    let row = encode::<Attendance>(&payload);
    tracing::debug!(user = %mark.user_id, date = %mark.date, "marking attendance");

    let record = match self.inner.backend.upsert(kind.table(), row, ATTENDANCE_KEY).await {
      Ok(stored) => self.decode_stored::<Attendance>(&stored, Operation::Upsert)?,
      Err(e) => {
        tracing::error!(
          user = %mark.user_id,
          date = %mark.date,
          error = %e,
          "attendance upsert failed; keeping a local record"
        );
        self.notify(Notice::error(format!(
          "Could not save attendance ({e}); it is kept on this device until the next sync"
        )));
        local_attendance(&mark)
      }
    };

    let applied = self.apply(epoch, |m| replace_attendance(m, record.clone()));
    if applied && !record.local_only {
      self.notify(Notice::success("Attendance marked"));
    }
    Ok(record)
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  fn payload_of<E: Entity>(&self, draft: &impl serde::Serialize) -> Result<Payload> {
    Payload::from_serialize(draft).map_err(|source| {
      self.failed(E::KIND, Operation::Create, Error::Record { kind: E::KIND, source })
    })
  }

  fn decode_stored<E: Entity>(&self, stored: &Value, operation: Operation) -> Result<E> {
    decode::<E>(stored).map_err(|source| {
      self.failed(E::KIND, operation, Error::Record { kind: E::KIND, source })
    })
  }

  /// Log and surface a failed write, handing the error back for the caller.
  fn failed(&self, kind: EntityKind, operation: Operation, err: Error) -> Error {
    if err.is_validation() {
      tracing::warn!(table = kind.table(), %operation, error = %err, "write rejected");
    } else {
      tracing::error!(table = kind.table(), %operation, error = %err, "write failed");
    }
    self.notify(Notice::error(format!("Could not {} {}: {err}", verb(operation), label(kind))));
    err
  }
}

fn remote<E>(kind: EntityKind, operation: Operation, e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Remote { table: kind.table(), operation, source: Box::new(e) }
}

/// New cases record who created them unless the caller said otherwise.
fn stamp_owner(kind: EntityKind, payload: &mut Payload, session: Session) {
  if kind == EntityKind::Case && !payload.contains("createdBy") {
    payload.set("createdBy", session.user_id);
  }
}

fn local_attendance(mark: &AttendanceMark) -> Attendance {
  Attendance {
    id:         Uuid::new_v4(),
    user_id:    mark.user_id,
    date:       mark.date,
    status:     mark.status,
    check_in:   mark.check_in.clone(),
    check_out:  mark.check_out.clone(),
    notes:      mark.notes.clone(),
    created_at: Utc::now(),
    updated_at: None,
    local_only: true,
  }
}

/// Keep one mirrored record per `(user_id, date)`.
fn replace_attendance(mirror: &mut Mirror, record: Attendance) {
  let stale: Vec<Uuid> = mirror
    .attendance
    .iter()
    .filter(|a| a.user_id == record.user_id && a.date == record.date)
    .map(|a| a.id)
    .collect();
  for id in stale {
    mirror.attendance.remove_by_id(id);
  }
  mirror.attendance.insert_front(record);
}

fn label(kind: EntityKind) -> String { kind.to_string().replace('_', " ") }

fn verb(operation: Operation) -> &'static str {
  match operation {
    Operation::Create => "add",
    Operation::Update => "update",
    Operation::Delete => "delete",
    Operation::Upsert => "save",
  }
}
