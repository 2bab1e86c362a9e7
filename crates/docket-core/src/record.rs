//! Record types for every entity kind, in their internal (camelCase) shape.
//!
//! Relationships are plain identity references; nothing is embedded.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::entity::{Entity, EntityKind};

macro_rules! entity {
  ($ty:ty, $kind:expr) => {
    entity!($ty, $kind, []);
  };
  ($ty:ty, $kind:expr, [$(($field:literal, $column:literal)),*]) => {
    impl Entity for $ty {
      const KIND: EntityKind = $kind;
      const RENAMED_COLUMNS: &'static [(&'static str, &'static str)] =
        &[$(($field, $column)),*];

      fn id(&self) -> Uuid { self.id }
    }
  };
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
  #[default]
  Open,
  Pending,
  Closed,
  #[serde(other)]
  Unknown,
}

/// A legal case file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseFile {
  pub id:             Uuid,
  pub case_number:    String,
  pub title:          String,
  #[serde(default)]
  pub client_name:    String,
  #[serde(default)]
  pub opposing_party: Option<String>,
  #[serde(default)]
  pub court:          Option<String>,
  #[serde(default)]
  pub case_type:      Option<String>,
  #[serde(default)]
  pub district:       Option<String>,
  #[serde(default)]
  pub status:         CaseStatus,
  /// Next hearing date.
  #[serde(default)]
  pub next_date:      Option<NaiveDate>,
  #[serde(default)]
  pub notes:          Option<String>,
  #[serde(default)]
  pub created_by:     Option<Uuid>,
  pub created_at:     DateTime<Utc>,
  #[serde(default)]
  pub updated_at:     Option<DateTime<Utc>>,
}

entity!(CaseFile, EntityKind::Case);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
  pub id:          Uuid,
  pub title:       String,
  #[serde(default)]
  pub client_name: Option<String>,
  #[serde(default)]
  pub case_id:     Option<Uuid>,
  pub date:        NaiveDate,
  /// Free-form time of day, e.g. `"14:30"`.
  #[serde(default)]
  pub time:        Option<String>,
  #[serde(default)]
  pub location:    Option<String>,
  #[serde(default)]
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(Appointment, EntityKind::Appointment);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counsel {
  pub id:         Uuid,
  pub name:       String,
  #[serde(default)]
  pub email:      Option<String>,
  #[serde(default)]
  pub phone:      Option<String>,
  #[serde(default)]
  pub firm:       Option<String>,
  #[serde(default)]
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

entity!(Counsel, EntityKind::Counsel);

// ─── Money ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
  Credit,
  Debit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
  pub id:          Uuid,
  #[serde(rename = "type")]
  pub kind:        TransactionKind,
  pub amount:      f64,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub case_id:     Option<Uuid>,
  pub date:        NaiveDate,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(Transaction, EntityKind::Transaction);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
  pub id:          Uuid,
  pub description: String,
  pub amount:      f64,
  #[serde(default)]
  pub category:    Option<String>,
  #[serde(default)]
  pub case_id:     Option<Uuid>,
  pub date:        NaiveDate,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(Expense, EntityKind::Expense);

// ─── Work ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  #[default]
  Pending,
  InProgress,
  Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id:          Uuid,
  pub title:       String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub assigned_to: Option<Uuid>,
  #[serde(default)]
  pub case_id:     Option<Uuid>,
  #[serde(default)]
  pub due_date:    Option<NaiveDate>,
  #[serde(default)]
  pub status:      TaskStatus,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(Task, EntityKind::Task);

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
  #[default]
  Present,
  Absent,
  Late,
  HalfDay,
  Leave,
}

/// One user's attendance for one calendar day. The remote store holds at most
/// one row per `(user_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
  pub id:         Uuid,
  pub user_id:    Uuid,
  pub date:       NaiveDate,
  #[serde(default)]
  pub status:     AttendanceStatus,
  #[serde(default)]
  pub check_in:   Option<String>,
  #[serde(default)]
  pub check_out:  Option<String>,
  #[serde(default)]
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
  /// Set on records the remote store never confirmed; their `id` is local.
  #[serde(skip)]
  pub local_only: bool,
}

entity!(Attendance, EntityKind::Attendance);

// ─── Inventory ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  pub id:          Uuid,
  pub name:        String,
  #[serde(default)]
  pub author:      Option<String>,
  #[serde(default)]
  pub location_id: Option<Uuid>,
  #[serde(default)]
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(Book, EntityKind::Book);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageItem {
  pub id:          Uuid,
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  pub location_id: Uuid,
  #[serde(default)]
  pub quantity:    Option<i64>,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(StorageItem, EntityKind::StorageItem);

/// One of the two sofa compartments case files are shelved in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Compartment {
  C1,
  C2,
}

/// A case file shelved in a sofa compartment. At most one record per
/// `(case_id, compartment)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SofaItem {
  pub id:          Uuid,
  pub case_id:     Uuid,
  pub compartment: Compartment,
  #[serde(default)]
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(SofaItem, EntityKind::SofaItem);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryLocation {
  pub id:          Uuid,
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(LibraryLocation, EntityKind::LibraryLocation);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
  pub id:          Uuid,
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

entity!(StorageLocation, EntityKind::StorageLocation);

// ─── Reference data ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Court {
  pub id:         Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

entity!(Court, EntityKind::Court, [("name", "court_name")]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseType {
  pub id:         Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

entity!(CaseType, EntityKind::CaseType, [("name", "type_name")]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
  pub id:         Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

entity!(District, EntityKind::District, [("name", "district_name")]);
