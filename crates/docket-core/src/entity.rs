//! Entity kinds, the [`Entity`] trait, and the per-kind encode/decode steps
//! that wrap the casing translator.

use std::fmt::Debug;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Result,
  casing::{to_external, to_internal},
  value::{Map, Payload, Value},
};

// ─── Kinds ───────────────────────────────────────────────────────────────────

/// Every record category the mirror keeps a collection for.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Case,
  Appointment,
  Counsel,
  Transaction,
  Task,
  Attendance,
  Expense,
  Book,
  StorageItem,
  SofaItem,
  LibraryLocation,
  StorageLocation,
  Court,
  CaseType,
  District,
}

impl EntityKind {
  /// The remote table backing this kind.
  pub fn table(self) -> &'static str {
    match self {
      Self::Case => "cases",
      Self::Appointment => "appointments",
      Self::Counsel => "counsel",
      Self::Transaction => "transactions",
      Self::Task => "tasks",
      Self::Attendance => "attendance",
      Self::Expense => "expenses",
      Self::Book => "books",
      Self::StorageItem => "storage_items",
      Self::SofaItem => "sofa_items",
      Self::LibraryLocation => "library_locations",
      Self::StorageLocation => "storage_locations",
      Self::Court => "courts",
      Self::CaseType => "case_types",
      Self::District => "districts",
    }
  }

  /// Reference collections that ship with built-in rows. An empty remote
  /// result never replaces them.
  pub fn is_seeded(self) -> bool {
    matches!(self, Self::Court | Self::CaseType | Self::District)
  }

  /// Tables whose remote changes invalidate the mirror.
  pub fn is_watched(self) -> bool {
    matches!(
      self,
      Self::Case
        | Self::Appointment
        | Self::Counsel
        | Self::Transaction
        | Self::Task
        | Self::Expense
        | Self::LibraryLocation
        | Self::StorageLocation
    )
  }

  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  pub fn watched() -> impl Iterator<Item = Self> { Self::iter().filter(|k| k.is_watched()) }
}

// ─── Entity trait ────────────────────────────────────────────────────────────

/// A record type with a fixed kind and a UUID identity.
///
/// The serde representation of an implementor is its internal (camelCase)
/// shape.
pub trait Entity:
  Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
  const KIND: EntityKind;

  /// `(field, column)` pairs for fields stored under a different remote
  /// column than their casing-translated name.
  const RENAMED_COLUMNS: &'static [(&'static str, &'static str)] = &[];

  fn id(&self) -> Uuid;
}

// ─── Encode / decode ─────────────────────────────────────────────────────────

/// Internal payload → remote row shape for `E`.
pub fn encode<E: Entity>(payload: &Payload) -> Value {
  let mut external = to_external(&payload.clone().into_value());
  if let Some(map) = external.as_object_mut() {
    rename_columns(map, E::RENAMED_COLUMNS.iter().copied());
  }
  external
}

/// Remote row → typed record.
pub fn decode<E: Entity>(row: &Value) -> Result<E> {
  let mut row = row.clone();
  if let Some(map) = row.as_object_mut() {
    rename_columns(map, E::RENAMED_COLUMNS.iter().map(|(field, column)| (*column, *field)));
  }
  to_internal(&row).deserialize_into()
}

/// Decode a full result set, failing on the first bad row.
pub fn decode_all<E: Entity>(rows: &[Value]) -> Result<Vec<E>> {
  rows.iter().map(decode::<E>).collect()
}

fn rename_columns<'a>(map: &mut Map, pairs: impl Iterator<Item = (&'a str, &'a str)>) {
  for (from, to) in pairs {
    if let Some(v) = map.remove(from) {
      map.insert(to.to_owned(), v);
    }
  }
}
