//! Tests for `SyncStore` against an in-process fake remote with failure
//! injection, call recording and a write gate.

use std::{
  collections::{HashMap, HashSet},
  sync::{Arc, Mutex, MutexGuard},
  time::Duration,
};

use chrono::{NaiveDate, Utc};
use docket_core::{
  entity::EntityKind,
  record::{
    AttendanceStatus, CaseFile, Compartment, Court, SofaItem, Task, TaskStatus,
  },
  remote::{Change, ChangeEvent, ChangeFeed, EventFilter, RemoteStore, Subscription, SubscriptionId},
  value::{Payload, Value},
};
use futures::StreamExt as _;
use serde_json::{Map, Value as Json, json};
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::{
  Error, FetchOutcome, Session, SyncConfig, SyncStore, ValidationFailure,
  draft::{AttendanceMark, NewBook, NewSofaItem, NewStorageItem},
  notify::{ChannelNotifier, Level, Notice},
};

// ─── Fake remote ─────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("fake remote: {0}")]
struct FakeError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Call {
  GetAll,
  Create,
  Update,
  Delete,
  Upsert,
}

#[derive(Default)]
struct FakeState {
  tables:       HashMap<String, Vec<Json>>,
  failing:      HashSet<(Call, String)>,
  offline:      bool,
  calls:        Vec<(Call, String)>,
  subscribers:  HashMap<SubscriptionId, (String, mpsc::UnboundedSender<Change>)>,
  next_sub:     SubscriptionId,
  unsubscribed: Vec<SubscriptionId>,
  hold:         Option<oneshot::Receiver<()>>,
}

#[derive(Clone, Default)]
struct FakeRemote {
  state: Arc<Mutex<FakeState>>,
}

impl FakeRemote {
  fn state(&self) -> MutexGuard<'_, FakeState> { self.state.lock().unwrap() }

  fn seed(&self, table: &str, rows: Vec<Json>) {
    self.state().tables.insert(table.to_owned(), rows);
  }

  fn rows(&self, table: &str) -> Vec<Json> {
    self.state().tables.get(table).cloned().unwrap_or_default()
  }

  fn fail(&self, call: Call, table: &str) {
    self.state().failing.insert((call, table.to_owned()));
  }

  fn heal(&self, call: Call, table: &str) {
    self.state().failing.remove(&(call, table.to_owned()));
  }

  fn set_offline(&self, offline: bool) { self.state().offline = offline; }

  fn calls(&self, call: Call) -> Vec<String> {
    self
      .state()
      .calls
      .iter()
      .filter(|(c, _)| *c == call)
      .map(|(_, t)| t.clone())
      .collect()
  }

  fn clear_calls(&self) { self.state().calls.clear(); }

  /// Notify every subscriber of `table`, as another client's write would.
  fn push(&self, table: &str) {
    for (watched, tx) in self.state().subscribers.values() {
      if watched == table {
        let _ = tx.send(Change { table: table.to_owned(), event: ChangeEvent::Update, row: None });
      }
    }
  }

  /// Make the next write wait, after taking effect remotely, until the
  /// returned sender fires.
  fn hold_next_write(&self) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.state().hold = Some(rx);
    tx
  }

  fn check(&self, call: Call, table: &str) -> Result<(), FakeError> {
    let mut state = self.state();
    state.calls.push((call, table.to_owned()));
    if state.offline {
      return Err(FakeError("network unreachable".into()));
    }
    if state.failing.contains(&(call, table.to_owned())) {
      return Err(FakeError(format!("{call:?} on {table} rejected")));
    }
    Ok(())
  }

  async fn gate(&self) {
    let hold = self.state().hold.take();
    if let Some(hold) = hold {
      let _ = hold.await;
    }
  }
}

fn object(row: &Value) -> Map<String, Json> {
  match row.to_json() {
    Json::Object(map) => map,
    other => panic!("expected object, got {other}"),
  }
}

impl RemoteStore for FakeRemote {
  type Error = FakeError;

  async fn get_all(&self, table: &str) -> Result<Vec<Value>, FakeError> {
    self.check(Call::GetAll, table)?;
    Ok(self.rows(table).into_iter().map(Value::from).collect())
  }

  async fn create(&self, table: &str, row: Value) -> Result<Value, FakeError> {
    self.check(Call::Create, table)?;
    let mut body = object(&row);
    body.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
    body.entry("created_at").or_insert_with(|| json!(Utc::now()));
    let stored = Json::Object(body);
    self.state().tables.entry(table.to_owned()).or_default().insert(0, stored.clone());
    self.gate().await;
    Ok(stored.into())
  }

  async fn update(&self, table: &str, id: Uuid, patch: Value) -> Result<Value, FakeError> {
    self.check(Call::Update, table)?;
    let stored = {
      let mut state = self.state();
      let rows = state.tables.entry(table.to_owned()).or_default();
      let row = rows
        .iter_mut()
        .find(|r| r["id"] == json!(id))
        .ok_or_else(|| FakeError(format!("no row {id}")))?;
      for (k, v) in object(&patch) {
        row[k] = v;
      }
      row["updated_at"] = json!(Utc::now());
      row.clone()
    };
    self.gate().await;
    Ok(stored.into())
  }

  async fn delete(&self, table: &str, id: Uuid) -> Result<(), FakeError> {
    self.check(Call::Delete, table)?;
    self
      .state()
      .tables
      .entry(table.to_owned())
      .or_default()
      .retain(|r| r["id"] != json!(id));
    self.gate().await;
    Ok(())
  }

  async fn upsert(
    &self,
    table: &str,
    row: Value,
    conflict: &'static [&'static str],
  ) -> Result<Value, FakeError> {
    self.check(Call::Upsert, table)?;
    let incoming = object(&row);
    let stored = {
      let mut state = self.state();
      let rows = state.tables.entry(table.to_owned()).or_default();
      match rows.iter_mut().find(|r| conflict.iter().all(|c| r[*c] == incoming[*c])) {
        Some(existing) => {
          for (k, v) in incoming {
            existing[k] = v;
          }
          existing.clone()
        }
        None => {
          let mut body = incoming;
          body.insert("id".into(), json!(Uuid::new_v4()));
          body.insert("created_at".into(), json!(Utc::now()));
          let body = Json::Object(body);
          rows.insert(0, body.clone());
          body
        }
      }
    };
    Ok(stored.into())
  }
}

impl ChangeFeed for FakeRemote {
  type Error = FakeError;

  async fn subscribe(&self, table: &str, _filter: EventFilter) -> Result<Subscription, FakeError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = {
      let mut state = self.state();
      state.next_sub += 1;
      let id = state.next_sub;
      state.subscribers.insert(id, (table.to_owned(), tx));
      id
    };
    let changes = futures::stream::unfold(rx, |mut rx| async move {
      rx.recv().await.map(|c| (c, rx))
    })
    .boxed();
    Ok(Subscription { id, table: table.to_owned(), changes })
  }

  async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), FakeError> {
    let mut state = self.state();
    state.subscribers.remove(&id);
    state.unsubscribed.push(id);
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

const USER: Uuid = Uuid::from_u128(0x7);

fn session() -> Session { Session { user_id: USER } }

fn config() -> SyncConfig {
  SyncConfig { debounce_ms: 0, notify_partial_failures: false }
}

fn case_row(number: &str) -> Json {
  json!({
    "id": Uuid::new_v4(),
    "case_number": number,
    "title": format!("Matter {number}"),
    "client_name": "S. Menon",
    "created_at": "2024-01-01T00:00:00Z"
  })
}

fn task_row(title: &str) -> Json {
  json!({
    "id": Uuid::new_v4(),
    "title": title,
    "status": "pending",
    "created_at": "2024-01-01T00:00:00Z"
  })
}

fn court_row(name: &str) -> Json {
  json!({ "id": Uuid::new_v4(), "court_name": name, "created_at": "2024-01-01T00:00:00Z" })
}

fn id_of(row: &Json) -> Uuid { Uuid::parse_str(row["id"].as_str().unwrap()).unwrap() }

struct Harness {
  store:   SyncStore<FakeRemote>,
  notices: mpsc::UnboundedReceiver<Notice>,
}

impl Harness {
  fn new(remote: FakeRemote, config: SyncConfig) -> Self {
    let (notifier, notices) = ChannelNotifier::new();
    let store = SyncStore::with_notifier(remote, config, Arc::new(notifier));
    Self { store, notices }
  }

  async fn open(remote: FakeRemote) -> Self {
    let mut h = Self::new(remote, config());
    h.store.open(session()).await;
    h.drain();
    h
  }

  fn drain(&mut self) -> Vec<Notice> {
    let mut out = Vec::new();
    while let Ok(n) = self.notices.try_recv() {
      out.push(n);
    }
    out
  }

  fn errors(&mut self) -> Vec<Notice> {
    self.drain().into_iter().filter(|n| n.level == Level::Error).collect()
  }
}

async fn wait_for_refresh(rx: &mut watch::Receiver<u64>, at_least: u64) {
  tokio::time::timeout(Duration::from_secs(2), async {
    while *rx.borrow() < at_least {
      rx.changed().await.unwrap();
    }
  })
  .await
  .expect("reload did not happen in time");
}

async fn wait_for_call(remote: &FakeRemote, call: Call) {
  tokio::time::timeout(Duration::from_secs(2), async {
    while remote.calls(call).is_empty() {
      tokio::task::yield_now().await;
    }
  })
  .await
  .expect("remote call did not happen in time");
}

// ─── Session & Fetch-All ─────────────────────────────────────────────────────

#[tokio::test]
async fn open_loads_every_collection() {
  let remote = FakeRemote::default();
  remote.seed("cases", vec![case_row("1"), case_row("2")]);
  remote.seed("tasks", vec![task_row("file reply")]);

  let h = Harness::new(remote.clone(), config());
  let report = h.store.open(session()).await;

  assert!(h.store.is_active());
  assert_eq!(h.store.session(), Some(session()));
  assert_eq!(report.outcomes().len(), 15);
  assert_eq!(report.outcome(EntityKind::Case), Some(&FetchOutcome::Replaced(2)));
  assert_eq!(h.store.snapshot::<CaseFile>().len(), 2);
  assert_eq!(h.store.snapshot::<Task>().len(), 1);
  assert_eq!(remote.calls(Call::GetAll).len(), 15);
  assert_eq!(remote.state().subscribers.len(), 8);
}

#[tokio::test]
async fn empty_reference_tables_keep_seeded_courts() {
  let h = Harness::open(FakeRemote::default()).await;

  let courts = h.store.snapshot::<Court>();
  assert_eq!(courts.len(), 4);
  assert!(courts.iter().any(|c| c.name == "High Court"));
}

#[tokio::test]
async fn remote_courts_replace_the_defaults() {
  let remote = FakeRemote::default();
  remote.seed("courts", vec![court_row("Family Court"), court_row("Labour Court")]);

  let h = Harness::open(remote).await;

  let names: Vec<String> = h.store.snapshot::<Court>().into_iter().map(|c| c.name).collect();
  assert_eq!(names, ["Family Court", "Labour Court"]);
}

#[tokio::test]
async fn failed_table_keeps_previous_contents() {
  let remote = FakeRemote::default();
  let old_task = task_row("old");
  remote.seed("tasks", vec![old_task.clone()]);
  remote.seed("cases", vec![case_row("1")]);
  let mut h = Harness::open(remote.clone()).await;

  remote.seed("tasks", vec![task_row("new a"), task_row("new b")]);
  remote.seed("cases", vec![case_row("1"), case_row("2"), case_row("3")]);
  remote.fail(Call::GetAll, "tasks");

  let report = h.store.fetch_all().await;

  assert!(report.is_partial_failure());
  assert_eq!(report.failed(), [EntityKind::Task]);
  let tasks = h.store.snapshot::<Task>();
  assert_eq!(tasks.len(), 1);
  assert_eq!(tasks[0].id, id_of(&old_task));
  assert_eq!(h.store.snapshot::<CaseFile>().len(), 3);
  // Partial failures are logged, not shown, by default.
  assert!(h.errors().is_empty());
}

#[tokio::test]
async fn partial_failures_can_be_surfaced() {
  let remote = FakeRemote::default();
  remote.fail(Call::GetAll, "expenses");
  let mut h = Harness::new(
    remote,
    SyncConfig { debounce_ms: 0, notify_partial_failures: true },
  );

  h.store.open(session()).await;

  let errors = h.errors();
  assert_eq!(errors.len(), 1);
  assert!(errors[0].message.contains("expense"));
}

#[tokio::test]
async fn unreachable_remote_reports_once_and_keeps_state() {
  let remote = FakeRemote::default();
  remote.seed("cases", vec![case_row("1")]);
  let mut h = Harness::open(remote.clone()).await;

  remote.set_offline(true);
  let report = h.store.fetch_all().await;

  assert!(report.is_total_failure());
  assert_eq!(h.errors().len(), 1);
  assert_eq!(h.store.snapshot::<CaseFile>().len(), 1);
  assert_eq!(h.store.snapshot::<Court>().len(), 4);
}

#[tokio::test]
async fn fetch_without_session_queries_nothing() {
  let remote = FakeRemote::default();
  let h = Harness::new(remote.clone(), config());

  let report = h.store.fetch_all().await;

  assert!(report.was_skipped());
  assert!(remote.calls(Call::GetAll).is_empty());
}

#[tokio::test]
async fn close_clears_the_mirror_and_unsubscribes() {
  let remote = FakeRemote::default();
  remote.seed("cases", vec![case_row("1")]);
  remote.seed("courts", vec![court_row("Family Court")]);
  let h = Harness::open(remote.clone()).await;

  h.store.close().await;

  assert!(!h.store.is_active());
  assert!(h.store.snapshot::<CaseFile>().is_empty());
  assert_eq!(h.store.snapshot::<Court>().len(), 4);
  assert_eq!(remote.state().unsubscribed.len(), 8);
  assert!(remote.state().subscribers.is_empty());

  let err = h.store.create::<CaseFile>(Payload::new()).await.unwrap_err();
  assert!(matches!(err, Error::NoSession));
}

#[tokio::test]
async fn reopening_replaces_the_previous_session() {
  let remote = FakeRemote::default();
  let h = Harness::open(remote.clone()).await;

  let other = Session { user_id: Uuid::new_v4() };
  h.store.open(other).await;

  assert_eq!(h.store.session(), Some(other));
  assert_eq!(remote.state().unsubscribed.len(), 8);
  assert_eq!(remote.state().subscribers.len(), 8);
}

// ─── Invalidation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn change_on_cases_reloads_every_collection() {
  let remote = FakeRemote::default();
  let mut h = Harness::open(remote.clone()).await;
  let mut refreshes = h.store.refreshes();
  let before = *refreshes.borrow();
  remote.clear_calls();

  remote.seed("cases", vec![case_row("9")]);
  remote.push("cases");
  wait_for_refresh(&mut refreshes, before + 1).await;

  let reloaded = remote.calls(Call::GetAll);
  assert_eq!(reloaded.len(), 15);
  assert!(reloaded.iter().any(|t| t == "tasks"));
  assert!(reloaded.iter().any(|t| t == "courts"));
  assert_eq!(h.store.snapshot::<CaseFile>().len(), 1);
  assert_eq!(h.drain(), [Notice::info("Data refreshed after a remote change")]);
}

#[tokio::test]
async fn bursts_of_changes_share_one_reload() {
  let remote = FakeRemote::default();
  let mut h = Harness::new(remote.clone(), SyncConfig { debounce_ms: 50, ..config() });
  h.store.open(session()).await;
  h.drain();
  let mut refreshes = h.store.refreshes();
  let before = *refreshes.borrow();
  remote.clear_calls();

  for table in ["cases", "tasks", "appointments", "cases", "expenses"] {
    remote.push(table);
  }
  wait_for_refresh(&mut refreshes, before + 1).await;
  tokio::time::sleep(Duration::from_millis(150)).await;

  assert_eq!(*refreshes.borrow(), before + 1);
  assert_eq!(remote.calls(Call::GetAll).len(), 15);
}

#[tokio::test]
async fn unwatched_tables_do_not_invalidate() {
  let remote = FakeRemote::default();
  let h = Harness::open(remote.clone()).await;
  remote.clear_calls();

  remote.push("attendance");
  remote.push("sofa_items");
  tokio::time::sleep(Duration::from_millis(50)).await;

  assert!(remote.calls(Call::GetAll).is_empty());
  drop(h);
}

// ─── Writes ──────────────────────────────────────────────────────────────────

fn new_case(number: &str) -> Payload {
  Payload::new()
    .with("caseNumber", number)
    .with("title", "Iyer v. State")
    .with("clientName", "R. Iyer")
    .with("nextDate", NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
}

#[tokio::test]
async fn create_applies_the_confirmed_record() {
  let remote = FakeRemote::default();
  remote.seed("cases", vec![case_row("1")]);
  let mut h = Harness::open(remote.clone()).await;

  let case = h.store.create::<CaseFile>(new_case("CC 77/2024")).await.unwrap();

  let cases = h.store.snapshot::<CaseFile>();
  assert_eq!(cases.len(), 2);
  assert_eq!(cases[0], case);
  assert_eq!(case.created_by, Some(USER));
  assert_eq!(case.next_date, NaiveDate::from_ymd_opt(2024, 3, 5));

  let stored = &remote.rows("cases")[0];
  assert_eq!(stored["case_number"], json!("CC 77/2024"));
  assert_eq!(stored["next_date"], json!("2024-03-05"));
  assert_eq!(stored["created_by"], json!(USER));

  let notices = h.drain();
  assert_eq!(notices, [Notice::success("case added")]);
}

#[tokio::test]
async fn failed_create_leaves_the_mirror_alone() {
  let remote = FakeRemote::default();
  remote.seed("cases", vec![case_row("1")]);
  let mut h = Harness::open(remote.clone()).await;
  let before = h.store.snapshot::<CaseFile>();
  remote.fail(Call::Create, "cases");

  let err = h.store.create::<CaseFile>(new_case("CC 78/2024")).await.unwrap_err();

  assert!(err.is_remote());
  assert_eq!(h.store.snapshot::<CaseFile>(), before);
  assert_eq!(h.errors().len(), 1);
}

#[tokio::test]
async fn reference_rows_use_their_own_columns() {
  let remote = FakeRemote::default();
  let h = Harness::open(remote.clone()).await;

  let court = h
    .store
    .create::<Court>(Payload::new().with("name", "Consumer Forum"))
    .await
    .unwrap();

  assert_eq!(court.name, "Consumer Forum");
  assert_eq!(remote.rows("courts")[0]["court_name"], json!("Consumer Forum"));
  assert_eq!(h.store.snapshot::<Court>()[0], court);
}

#[tokio::test]
async fn update_patches_in_place() {
  let remote = FakeRemote::default();
  let (first, second) = (task_row("first"), task_row("second"));
  remote.seed("tasks", vec![first.clone(), second.clone()]);
  let h = Harness::open(remote.clone()).await;

  let updated = h
    .store
    .update::<Task>(id_of(&second), Payload::new().with("status", "completed"))
    .await
    .unwrap();

  assert_eq!(updated.status, TaskStatus::Completed);
  assert!(updated.updated_at.is_some());
  let tasks = h.store.snapshot::<Task>();
  assert_eq!(tasks[0].id, id_of(&first));
  assert_eq!(tasks[1], updated);
}

#[tokio::test]
async fn moving_a_sofa_slot_onto_an_occupied_compartment_is_rejected() {
  let remote = FakeRemote::default();
  let case = case_row("1");
  remote.seed("cases", vec![case.clone()]);
  let mut h = Harness::open(remote.clone()).await;
  let case_id = id_of(&case);
  let slot = |compartment| NewSofaItem { case_id, compartment, notes: None };
  h.store.add_sofa_item(slot(Compartment::C1)).await.unwrap();
  let second = h.store.add_sofa_item(slot(Compartment::C2)).await.unwrap();
  h.drain();

  let err = h
    .store
    .update::<SofaItem>(second.id, Payload::new().with("compartment", "C1"))
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    Error::Validation(ValidationFailure::CompartmentOccupied { compartment: Compartment::C1, .. })
  ));
  assert!(remote.calls(Call::Update).is_empty());
  let mut held = h.store.sofa_occupancy(case_id);
  held.sort_by_key(ToString::to_string);
  assert_eq!(held, [Compartment::C1, Compartment::C2]);
  assert_eq!(h.errors().len(), 1);

  // Patching other fields of the slot is unaffected.
  let noted = h
    .store
    .update::<SofaItem>(second.id, Payload::new().with("notes", "bundle of 3"))
    .await
    .unwrap();
  assert_eq!(noted.compartment, Compartment::C2);
  assert_eq!(noted.notes.as_deref(), Some("bundle of 3"));
}

#[tokio::test]
async fn delete_removes_after_confirmation() {
  let remote = FakeRemote::default();
  let (keep, drop_me) = (case_row("1"), case_row("2"));
  remote.seed("cases", vec![keep.clone(), drop_me.clone()]);
  let mut h = Harness::open(remote.clone()).await;

  remote.fail(Call::Delete, "cases");
  assert!(h.store.delete::<CaseFile>(id_of(&drop_me)).await.is_err());
  assert_eq!(h.store.snapshot::<CaseFile>().len(), 2);
  assert_eq!(h.errors().len(), 1);

  remote.heal(Call::Delete, "cases");
  h.store.delete::<CaseFile>(id_of(&drop_me)).await.unwrap();
  let cases = h.store.snapshot::<CaseFile>();
  assert_eq!(cases.len(), 1);
  assert_eq!(cases[0].id, id_of(&keep));
  assert_eq!(remote.rows("cases").len(), 1);
}

// ─── Guards ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn compartment_can_hold_a_case_once() {
  let remote = FakeRemote::default();
  let case = case_row("1");
  remote.seed("cases", vec![case.clone()]);
  let mut h = Harness::open(remote.clone()).await;
  let case_id = id_of(&case);
  let slot = |compartment| NewSofaItem { case_id, compartment, notes: None };

  h.store.add_sofa_item(slot(Compartment::C1)).await.unwrap();
  let err = h.store.add_sofa_item(slot(Compartment::C1)).await.unwrap_err();

  assert!(matches!(
    err,
    Error::Validation(ValidationFailure::CompartmentOccupied { compartment: Compartment::C1, .. })
  ));
  assert!(err.to_string().contains("C1"));
  let held: Vec<SofaItem> = h
    .store
    .snapshot::<SofaItem>()
    .into_iter()
    .filter(|s| s.case_id == case_id && s.compartment == Compartment::C1)
    .collect();
  assert_eq!(held.len(), 1);
  assert_eq!(remote.calls(Call::Create), ["sofa_items"]);
  assert!(h.errors().iter().any(|n| n.message.contains("C1")));

  // The other compartment is still free.
  h.store.add_sofa_item(slot(Compartment::C2)).await.unwrap();
  assert_eq!(h.store.sofa_occupancy(case_id).len(), 2);
}

#[tokio::test]
async fn compartment_needs_a_known_case() {
  let remote = FakeRemote::default();
  let h = Harness::open(remote.clone()).await;
  let stranger = Uuid::new_v4();

  let err = h
    .store
    .add_sofa_item(NewSofaItem { case_id: stranger, compartment: Compartment::C2, notes: None })
    .await
    .unwrap_err();

  assert!(matches!(err, Error::Validation(ValidationFailure::CaseNotFound(id)) if id == stranger));
  assert!(remote.calls(Call::Create).is_empty());
}

#[tokio::test]
async fn guards_reject_before_any_network_call() {
  let remote = FakeRemote::default();
  let h = Harness::open(remote.clone()).await;

  let book = h
    .store
    .add_book(NewBook { name: "  ".into(), ..NewBook::default() })
    .await
    .unwrap_err();
  assert!(book.is_validation());

  let item = h
    .store
    .add_storage_item(NewStorageItem { name: "Old files".into(), ..NewStorageItem::default() })
    .await
    .unwrap_err();
  assert!(matches!(item, Error::Validation(ValidationFailure::MissingLocation)));

  let location = h
    .store
    .create::<docket_core::record::LibraryLocation>(Payload::new().with("name", ""))
    .await
    .unwrap_err();
  assert!(location.is_validation());

  assert!(remote.calls(Call::Create).is_empty());
}

#[tokio::test]
async fn storage_item_with_location_is_created() {
  let remote = FakeRemote::default();
  let h = Harness::open(remote.clone()).await;
  let shelf = h
    .store
    .add_storage_location(crate::draft::NewLocation { name: "Basement".into(), description: None })
    .await
    .unwrap();

  let item = h
    .store
    .add_storage_item(NewStorageItem {
      name: "2019 ledgers".into(),
      location_id: Some(shelf.id),
      quantity: Some(3),
      ..NewStorageItem::default()
    })
    .await
    .unwrap();

  assert_eq!(item.location_id, shelf.id);
  assert_eq!(remote.rows("storage_items")[0]["location_id"], json!(shelf.id));
}

// ─── Attendance ──────────────────────────────────────────────────────────────

fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, 3).unwrap() }

#[tokio::test]
async fn attendance_is_one_record_per_user_and_day() {
  let remote = FakeRemote::default();
  let h = Harness::open(remote.clone()).await;

  h.store
    .mark_attendance(AttendanceMark::new(USER, today(), AttendanceStatus::Present))
    .await
    .unwrap();
  let second = h
    .store
    .mark_attendance(AttendanceMark::new(USER, today(), AttendanceStatus::Late))
    .await
    .unwrap();

  assert!(!second.local_only);
  assert_eq!(remote.rows("attendance").len(), 1);
  assert_eq!(remote.rows("attendance")[0]["date"], json!("2024-06-03"));
  let mirrored = h.store.attendance_for(USER, today()).unwrap();
  assert_eq!(mirrored.status, AttendanceStatus::Late);
  assert_eq!(h.store.snapshot::<docket_core::record::Attendance>().len(), 1);
}

#[tokio::test]
async fn failed_attendance_is_kept_locally() {
  let remote = FakeRemote::default();
  let mut h = Harness::open(remote.clone()).await;
  remote.fail(Call::Upsert, "attendance");

  let local = h
    .store
    .mark_attendance(AttendanceMark::new(USER, today(), AttendanceStatus::Present))
    .await
    .unwrap();

  assert!(local.local_only);
  assert!(remote.rows("attendance").is_empty());
  assert_eq!(h.store.attendance_for(USER, today()), Some(local.clone()));
  let errors = h.errors();
  assert_eq!(errors.len(), 1);
  assert!(errors[0].message.contains("attendance"));

  // The next successful write replaces the local record.
  remote.heal(Call::Upsert, "attendance");
  let confirmed = h
    .store
    .mark_attendance(AttendanceMark::new(USER, today(), AttendanceStatus::Present))
    .await
    .unwrap();
  assert!(!confirmed.local_only);
  assert_ne!(confirmed.id, local.id);
  let all = h.store.snapshot::<docket_core::record::Attendance>();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].id, confirmed.id);
}

#[tokio::test]
async fn reload_discards_local_attendance() {
  let remote = FakeRemote::default();
  let h = Harness::open(remote.clone()).await;
  remote.fail(Call::Upsert, "attendance");
  h.store
    .mark_attendance(AttendanceMark::new(USER, today(), AttendanceStatus::Absent))
    .await
    .unwrap();

  h.store.fetch_all().await;

  assert!(h.store.attendance_for(USER, today()).is_none());
}

// ─── Interleavings ───────────────────────────────────────────────────────────

#[tokio::test]
async fn apply_after_a_concurrent_reload_wins() {
  let remote = FakeRemote::default();
  let task = task_row("brief");
  let task_id = id_of(&task);
  remote.seed("tasks", vec![task]);
  let h = Harness::open(remote.clone()).await;

  let release = remote.hold_next_write();
  let writer = {
    let store = h.store.clone();
    tokio::spawn(async move {
      store
        .update::<Task>(task_id, Payload::new().with("status", "completed"))
        .await
    })
  };
  wait_for_call(&remote, Call::Update).await;

  // Another client moves the task on, and a reload lands first.
  {
    let mut state = remote.state();
    let row = state.tables.get_mut("tasks").unwrap().first_mut().unwrap();
    row["status"] = json!("in_progress");
  }
  h.store.fetch_all().await;
  assert_eq!(h.store.get::<Task>(task_id).unwrap().status, TaskStatus::InProgress);

  release.send(()).unwrap();
  writer.await.unwrap().unwrap();

  // The stale apply overwrote the reloaded value.
  assert_eq!(h.store.get::<Task>(task_id).unwrap().status, TaskStatus::Completed);
  assert_eq!(remote.rows("tasks")[0]["status"], json!("in_progress"));
}

#[tokio::test]
async fn writes_finishing_after_close_are_dropped() {
  let remote = FakeRemote::default();
  let mut h = Harness::open(remote.clone()).await;

  let release = remote.hold_next_write();
  let writer = {
    let store = h.store.clone();
    tokio::spawn(async move { store.create::<CaseFile>(new_case("late")).await })
  };
  wait_for_call(&remote, Call::Create).await;

  h.store.close().await;
  release.send(()).unwrap();
  let created = writer.await.unwrap().unwrap();

  assert_eq!(created.case_number, "late");
  assert!(h.store.snapshot::<CaseFile>().is_empty());
  assert!(h.drain().iter().all(|n| n.level != Level::Success));
}

#[tokio::test]
async fn deletes_finishing_after_close_are_not_announced() {
  let remote = FakeRemote::default();
  let case = case_row("1");
  remote.seed("cases", vec![case.clone()]);
  let mut h = Harness::open(remote.clone()).await;

  let release = remote.hold_next_write();
  let writer = {
    let store = h.store.clone();
    let id = id_of(&case);
    tokio::spawn(async move { store.delete::<CaseFile>(id).await })
  };
  wait_for_call(&remote, Call::Delete).await;

  h.store.close().await;
  release.send(()).unwrap();
  writer.await.unwrap().unwrap();

  assert!(h.drain().is_empty());
}

// ─── Against the SQLite backend ──────────────────────────────────────────────

#[tokio::test]
async fn sqlite_backend_round_trip() {
  let backend = docket_store_sqlite::SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  let store = SyncStore::new(backend.clone(), config());
  store.open(session()).await;
  assert_eq!(backend.open_subscriptions(), 8);

  let mut refreshes = store.refreshes();
  let before = *refreshes.borrow();
  let case = store.create::<CaseFile>(new_case("WP 5/2024")).await.unwrap();

  // The write echoes back through the change feed as a reload.
  wait_for_refresh(&mut refreshes, before + 1).await;
  let cases = store.snapshot::<CaseFile>();
  assert_eq!(cases.len(), 1);
  assert_eq!(cases[0].id, case.id);
  assert_eq!(cases[0].next_date, NaiveDate::from_ymd_opt(2024, 3, 5));

  store.close().await;
  assert_eq!(backend.open_subscriptions(), 0);
}
