//! Error type for `docket-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("row body must be a JSON object, found {0}")]
  NotAnObject(&'static str),

  #[error("row {id} not found in {table}")]
  RowNotFound { table: String, id: uuid::Uuid },

  #[error("upsert into {table} is missing conflict column {column:?}")]
  MissingConflictColumn { table: String, column: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
