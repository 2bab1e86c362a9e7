//! [`SqliteStore`], the SQLite implementation of [`RemoteStore`] and
//! [`ChangeFeed`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use docket_core::{
  remote::{ChangeEvent, ChangeFeed, EventFilter, RemoteStore, Subscription, SubscriptionId},
  value::Value,
};
use rusqlite::OptionalExtension as _;
use serde_json::{Map, Value as Json};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{encode_uuid, into_object, merge_patch, parse_body, stamp_new_row},
  feed::Feed,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Docket record store backed by a single SQLite file.
///
/// Cloning is cheap: the connection and subscriber registry are shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  feed: Arc<Feed>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, feed: Arc::new(Feed::default()) })
  }

  /// Number of subscriptions currently open against this store.
  pub fn open_subscriptions(&self) -> usize { self.feed.open_count() }

  fn publish(&self, table: &str, event: ChangeEvent, row: Option<Value>) {
    tracing::debug!(table, ?event, "publishing change");
    self.feed.publish(table, event, row);
  }
}

fn json_error(e: serde_json::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── RemoteStore impl ────────────────────────────────────────────────────────

impl RemoteStore for SqliteStore {
  type Error = Error;

  async fn get_all(&self, table: &str) -> Result<Vec<Value>> {
    let tbl = table.to_owned();

    let bodies: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT body FROM rows WHERE tbl = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![tbl], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;

    bodies.iter().map(|b| parse_body(b)).collect()
  }

  async fn create(&self, table: &str, row: Value) -> Result<Value> {
    let new_row = stamp_new_row(&row, Utc::now())?;
    let tbl = table.to_owned();
    let body = Json::Object(new_row.body);
    let body_str = body.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO rows (tbl, id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![tbl, new_row.id, body_str, new_row.created_at],
        )?;
        Ok(())
      })
      .await?;

    let stored = Value::from(body);
    self.publish(table, ChangeEvent::Insert, Some(stored.clone()));
    Ok(stored)
  }

  async fn update(&self, table: &str, id: Uuid, patch: Value) -> Result<Value> {
    let patch = into_object(&patch)?;
    let tbl = table.to_owned();
    let id_str = encode_uuid(id);

    let updated: Option<String> = self
      .conn
      .call(move |conn| {
        let current: Option<String> = conn
          .query_row(
            "SELECT body FROM rows WHERE tbl = ?1 AND id = ?2",
            rusqlite::params![tbl, id_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(current) = current else {
          return Ok(None);
        };

        let mut body: Map<String, Json> = serde_json::from_str(&current).map_err(json_error)?;
        merge_patch(&mut body, patch, Utc::now());
        let body_str = Json::Object(body).to_string();

        conn.execute(
          "UPDATE rows SET body = ?3 WHERE tbl = ?1 AND id = ?2",
          rusqlite::params![tbl, id_str, body_str],
        )?;
        Ok(Some(body_str))
      })
      .await?;

    let Some(body) = updated else {
      return Err(Error::RowNotFound { table: table.to_owned(), id });
    };
    let stored = parse_body(&body)?;
    self.publish(table, ChangeEvent::Update, Some(stored.clone()));
    Ok(stored)
  }

  async fn delete(&self, table: &str, id: Uuid) -> Result<()> {
    let tbl = table.to_owned();
    let id_str = encode_uuid(id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM rows WHERE tbl = ?1 AND id = ?2",
          rusqlite::params![tbl, id_str],
        )?)
      })
      .await?;

    if removed > 0 {
      self.publish(table, ChangeEvent::Delete, None);
    }
    Ok(())
  }

  async fn upsert(
    &self,
    table: &str,
    row: Value,
    conflict: &'static [&'static str],
  ) -> Result<Value> {
    let incoming = into_object(&row)?;
    let mut key = Vec::with_capacity(conflict.len());
    for column in conflict {
      let value = incoming.get(*column).cloned().ok_or_else(|| {
        Error::MissingConflictColumn { table: table.to_owned(), column: (*column).to_owned() }
      })?;
      key.push((*column, value));
    }

    let tbl = table.to_owned();
    let now = Utc::now();
    let fresh = stamp_new_row(&row, now)?;

    let (event, body_str) = self
      .conn
      .call(move |conn| {
        let existing = {
          let mut stmt = conn.prepare("SELECT id, body FROM rows WHERE tbl = ?1")?;
          let candidates = stmt
            .query_map(rusqlite::params![tbl], |r| {
              Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

          let mut found = None;
          for (id, body) in candidates {
            let body: Map<String, Json> = serde_json::from_str(&body).map_err(json_error)?;
            if key.iter().all(|(column, value)| body.get(*column) == Some(value)) {
              found = Some((id, body));
              break;
            }
          }
          found
        };

        match existing {
          Some((id, mut body)) => {
            merge_patch(&mut body, incoming, now);
            let body_str = Json::Object(body).to_string();
            conn.execute(
              "UPDATE rows SET body = ?3 WHERE tbl = ?1 AND id = ?2",
              rusqlite::params![tbl, id, body_str],
            )?;
            Ok((ChangeEvent::Update, body_str))
          }
          None => {
            let body_str = Json::Object(fresh.body).to_string();
            conn.execute(
              "INSERT INTO rows (tbl, id, body, created_at) VALUES (?1, ?2, ?3, ?4)",
              rusqlite::params![tbl, fresh.id, body_str, fresh.created_at],
            )?;
            Ok((ChangeEvent::Insert, body_str))
          }
        }
      })
      .await?;

    let stored = parse_body(&body_str)?;
    self.publish(table, event, Some(stored.clone()));
    Ok(stored)
  }
}

// ─── ChangeFeed impl ─────────────────────────────────────────────────────────

impl ChangeFeed for SqliteStore {
  type Error = Error;

  async fn subscribe(&self, table: &str, filter: EventFilter) -> Result<Subscription> {
    let subscription = self.feed.subscribe(table, filter);
    tracing::debug!(table, subscription = subscription.id, "subscribed");
    Ok(subscription)
  }

  async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
    if !self.feed.unsubscribe(id) {
      tracing::debug!(subscription = id, "unsubscribe for unknown subscription");
    }
    Ok(())
  }
}
