//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use docket_core::{
  remote::{ChangeEvent, ChangeFeed, EventFilter, RemoteStore},
  value::Value,
};
use futures::StreamExt as _;
use serde_json::json;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn row(j: serde_json::Value) -> Value { Value::from(j) }

// ─── CRUD ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_assigns_identity_and_timestamp() {
  let s = store().await;

  let created = s
    .create("cases", row(json!({ "case_number": "1/2024", "title": "A v. B" })))
    .await
    .unwrap();

  let id = created.get("id").and_then(Value::as_str).unwrap();
  assert!(Uuid::parse_str(id).is_ok());
  assert!(created.get("created_at").is_some());
  assert_eq!(created.get("title"), Some(&Value::from("A v. B")));
}

#[tokio::test]
async fn get_all_is_scoped_to_table_and_newest_first() {
  let s = store().await;
  s.create("cases", row(json!({ "title": "first", "created_at": "2024-01-01T00:00:00+00:00" })))
    .await
    .unwrap();
  s.create("cases", row(json!({ "title": "second", "created_at": "2024-02-01T00:00:00+00:00" })))
    .await
    .unwrap();
  s.create("tasks", row(json!({ "title": "other table" }))).await.unwrap();

  let cases = s.get_all("cases").await.unwrap();
  assert_eq!(cases.len(), 2);
  assert_eq!(cases[0].get("title"), Some(&Value::from("second")));
  assert_eq!(cases[1].get("title"), Some(&Value::from("first")));

  assert!(s.get_all("courts").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_patches_only_given_columns() {
  let s = store().await;
  let created = s
    .create("tasks", row(json!({ "title": "draft", "status": "pending" })))
    .await
    .unwrap();
  let id = Uuid::parse_str(created.get("id").and_then(Value::as_str).unwrap()).unwrap();

  let updated = s
    .update("tasks", id, row(json!({ "status": "completed" })))
    .await
    .unwrap();
  assert_eq!(updated.get("title"), Some(&Value::from("draft")));
  assert_eq!(updated.get("status"), Some(&Value::from("completed")));
  assert!(updated.get("updated_at").is_some());
}

#[tokio::test]
async fn update_missing_row_fails() {
  let s = store().await;
  let err = s
    .update("tasks", Uuid::new_v4(), row(json!({ "status": "completed" })))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::RowNotFound { .. }));
}

#[tokio::test]
async fn delete_is_idempotent() {
  let s = store().await;
  let created = s.create("expenses", row(json!({ "amount": 10 }))).await.unwrap();
  let id = Uuid::parse_str(created.get("id").and_then(Value::as_str).unwrap()).unwrap();

  s.delete("expenses", id).await.unwrap();
  s.delete("expenses", id).await.unwrap();
  assert!(s.get_all("expenses").await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_replaces_row_with_same_conflict_key() {
  let s = store().await;
  let user = Uuid::new_v4().to_string();
  let key = &["user_id", "date"];

  let first = s
    .upsert("attendance", row(json!({ "user_id": user, "date": "2024-03-05", "status": "present" })), key)
    .await
    .unwrap();
  let second = s
    .upsert("attendance", row(json!({ "user_id": user, "date": "2024-03-05", "status": "late" })), key)
    .await
    .unwrap();
  s.upsert("attendance", row(json!({ "user_id": user, "date": "2024-03-06", "status": "absent" })), key)
    .await
    .unwrap();

  assert_eq!(first.get("id"), second.get("id"));
  assert_eq!(second.get("status"), Some(&Value::from("late")));
  assert_eq!(s.get_all("attendance").await.unwrap().len(), 2);
}

#[tokio::test]
async fn upsert_requires_conflict_columns() {
  let s = store().await;
  let err = s
    .upsert("attendance", row(json!({ "status": "present" })), &["user_id", "date"])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingConflictColumn { .. }));
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn subscribers_see_changes_for_their_table_only() {
  let s = store().await;
  let mut cases = s.subscribe("cases", EventFilter::All).await.unwrap();
  let mut tasks = s.subscribe("tasks", EventFilter::All).await.unwrap();

  s.create("cases", row(json!({ "title": "x" }))).await.unwrap();

  let change = tokio::time::timeout(Duration::from_secs(1), cases.changes.next())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(change.table, "cases");
  assert_eq!(change.event, ChangeEvent::Insert);

  let nothing = tokio::time::timeout(Duration::from_millis(50), tasks.changes.next()).await;
  assert!(nothing.is_err());
}

#[tokio::test]
async fn event_filter_is_respected() {
  let s = store().await;
  let mut deletes = s
    .subscribe("cases", EventFilter::Only(ChangeEvent::Delete))
    .await
    .unwrap();

  let created = s.create("cases", row(json!({ "title": "x" }))).await.unwrap();
  let id = Uuid::parse_str(created.get("id").and_then(Value::as_str).unwrap()).unwrap();
  s.delete("cases", id).await.unwrap();

  let change = tokio::time::timeout(Duration::from_secs(1), deletes.changes.next())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(change.event, ChangeEvent::Delete);
}

#[tokio::test]
async fn unsubscribe_ends_the_stream() {
  let s = store().await;
  let mut sub = s.subscribe("cases", EventFilter::All).await.unwrap();
  assert_eq!(s.open_subscriptions(), 1);

  s.unsubscribe(sub.id).await.unwrap();
  assert_eq!(s.open_subscriptions(), 0);
  assert!(sub.changes.next().await.is_none());

  // Unknown ids are ignored.
  s.unsubscribe(9_999).await.unwrap();
}
