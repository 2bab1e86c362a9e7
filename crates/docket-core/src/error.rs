//! Error types for `docket-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("expected an object payload, found {0}")]
  NotAnObject(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
