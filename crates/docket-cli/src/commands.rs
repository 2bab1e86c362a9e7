//! Command handlers, each run against an open [`SyncStore`].

use anyhow::Context as _;
use chrono::Local;
use docket_core::{
  entity::EntityKind,
  record::{
    Appointment, Attendance, Book, CaseFile, CaseType, Counsel, Court, District, Expense,
    LibraryLocation, SofaItem, StorageItem, StorageLocation, Task, Transaction,
  },
  value::Payload,
};
use docket_store_sqlite::SqliteStore;
use docket_sync::{
  SyncStore,
  draft::{AttendanceMark, NewSofaItem},
  mirror::Stored,
  notify::{Level, Notice, Notifier},
};
use uuid::Uuid;

use crate::Command;

type Store = SyncStore<SqliteStore>;

/// Prints notices to stderr so they stay out of piped output.
pub struct Console;

impl Notifier for Console {
  fn notify(&self, notice: Notice) {
    let tag = match notice.level {
      Level::Success => "ok",
      Level::Info => "info",
      Level::Error => "error",
    };
    eprintln!("[{tag}] {}", notice.message);
  }
}

pub async fn run(store: &Store, user_id: Uuid, command: Command) -> anyhow::Result<()> {
  match command {
    Command::Sync => {
      print_counts(store);
      Ok(())
    }
    Command::List { kind } => list(store, kind),
    Command::AddCase { number, title, client, court, case_type, district, next_date } => {
      let payload = Payload::new()
        .with("caseNumber", number)
        .with("title", title)
        .with("clientName", client)
        .with("court", court)
        .with("caseType", case_type)
        .with("district", district)
        .with("nextDate", next_date);
      let case = store.create::<CaseFile>(payload).await?;
      println!("{}", case.id);
      Ok(())
    }
    Command::SofaAdd { case_id, compartment, notes } => {
      let item = store.add_sofa_item(NewSofaItem { case_id, compartment, notes }).await?;
      println!("{}", item.id);
      Ok(())
    }
    Command::Attend { status, date, check_in, check_out, notes } => {
      let date = date.unwrap_or_else(|| Local::now().date_naive());
      let mark = AttendanceMark {
        check_in,
        check_out,
        notes,
        ..AttendanceMark::new(user_id, date, status)
      };
      let record = store.mark_attendance(mark).await?;
      if record.local_only {
        println!("{} (not saved remotely)", record.id);
      } else {
        println!("{}", record.id);
      }
      Ok(())
    }
    Command::Watch => watch(store).await,
  }
}

fn print_counts(store: &Store) {
  for (kind, count) in store.read(|m| m.counts()) {
    println!("{:<18} {count}", kind.table());
  }
}

fn list(store: &Store, kind: EntityKind) -> anyhow::Result<()> {
  match kind {
    EntityKind::Case => print_all::<CaseFile>(store),
    EntityKind::Appointment => print_all::<Appointment>(store),
    EntityKind::Counsel => print_all::<Counsel>(store),
    EntityKind::Transaction => print_all::<Transaction>(store),
    EntityKind::Task => print_all::<Task>(store),
    EntityKind::Attendance => print_all::<Attendance>(store),
    EntityKind::Expense => print_all::<Expense>(store),
    EntityKind::Book => print_all::<Book>(store),
    EntityKind::StorageItem => print_all::<StorageItem>(store),
    EntityKind::SofaItem => print_all::<SofaItem>(store),
    EntityKind::LibraryLocation => print_all::<LibraryLocation>(store),
    EntityKind::StorageLocation => print_all::<StorageLocation>(store),
    EntityKind::Court => print_all::<Court>(store),
    EntityKind::CaseType => print_all::<CaseType>(store),
    EntityKind::District => print_all::<District>(store),
  }
}

fn print_all<E: Stored>(store: &Store) -> anyhow::Result<()> {
  for record in store.snapshot::<E>() {
    let line = serde_json::to_string(&record)
      .with_context(|| format!("failed to serialise {}", E::KIND))?;
    println!("{line}");
  }
  Ok(())
}

async fn watch(store: &Store) -> anyhow::Result<()> {
  let mut refreshes = store.refreshes();
  print_counts(store);
  loop {
    tokio::select! {
      changed = refreshes.changed() => {
        if changed.is_err() {
          return Ok(());
        }
        tracing::info!(reload = *refreshes.borrow_and_update(), "mirror reloaded");
        print_counts(store);
      }
      signal = tokio::signal::ctrl_c() => {
        signal.context("failed to listen for ctrl-c")?;
        return Ok(());
      }
    }
  }
}
