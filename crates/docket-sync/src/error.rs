//! Error types for `docket-sync`.

use docket_core::{entity::EntityKind, record::Compartment};
use strum::Display;
use thiserror::Error;
use uuid::Uuid;

/// A guard rejected a payload before any remote call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
  #[error("{kind} name must not be empty")]
  EmptyName { kind: EntityKind },

  #[error("case {case_id} is already in compartment {compartment}")]
  CompartmentOccupied { case_id: Uuid, compartment: Compartment },

  #[error("case {0} does not exist")]
  CaseNotFound(Uuid),

  #[error("a storage item needs a location")]
  MissingLocation,

  #[error("field {field:?} is missing or malformed")]
  InvalidField { field: &'static str },
}

/// Which remote call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
  Create,
  Update,
  Delete,
  Upsert,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationFailure),

  #[error("remote {operation} on {table} failed: {source}")]
  Remote {
    table:     &'static str,
    operation: Operation,
    #[source]
    source:    Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("bad {kind} record: {source}")]
  Record {
    kind:   EntityKind,
    #[source]
    source: docket_core::Error,
  },

  #[error("no active session")]
  NoSession,
}

impl Error {
  pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }

  pub fn is_remote(&self) -> bool { matches!(self, Self::Remote { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
