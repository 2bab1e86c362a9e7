//! Encoding helpers between [`Value`] rows and the text stored in SQLite.
//!
//! Timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings. Row bodies are compact JSON objects.

use chrono::{DateTime, Utc};
use docket_core::value::Value;
use serde_json::{Map, Value as Json};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ──────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

// ─── Bodies ───────────────────────────────────────────────────────────────────

/// Unwrap a row into its JSON object, rejecting anything else.
pub fn into_object(row: &Value) -> Result<Map<String, Json>> {
  match row.to_json() {
    Json::Object(map) => Ok(map),
    _ => Err(Error::NotAnObject(row.type_name())),
  }
}

pub fn parse_body(body: &str) -> Result<Value> {
  Ok(serde_json::from_str::<Json>(body)?.into())
}

/// A new row ready for insertion.
pub struct NewRow {
  pub id:         String,
  pub created_at: String,
  pub body:       Map<String, Json>,
}

/// Assign `id` and `created_at` unless the caller supplied them.
pub fn stamp_new_row(row: &Value, now: DateTime<Utc>) -> Result<NewRow> {
  let mut body = into_object(row)?;

  let id = match body.get("id").and_then(Json::as_str) {
    Some(raw) => Uuid::parse_str(raw)?,
    None => Uuid::new_v4(),
  };
  let id = encode_uuid(id);
  body.insert("id".into(), Json::String(id.clone()));

  let created_at = match body.get("created_at").and_then(Json::as_str) {
    Some(raw) => raw.to_owned(),
    None => encode_dt(now),
  };
  body.insert("created_at".into(), Json::String(created_at.clone()));

  Ok(NewRow { id, created_at, body })
}

/// Overlay `patch` on `body` and bump `updated_at`. Identity columns are
/// never overwritten.
pub fn merge_patch(body: &mut Map<String, Json>, patch: Map<String, Json>, now: DateTime<Utc>) {
  for (column, value) in patch {
    if column == "id" || column == "created_at" {
      continue;
    }
    body.insert(column, value);
  }
  body.insert("updated_at".into(), Json::String(encode_dt(now)));
}
