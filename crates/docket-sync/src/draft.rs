//! Typed inputs for the named, guarded operations.
//!
//! Each serialises to the internal (camelCase) payload the pipeline takes.
//! Absent optionals are left out rather than sent as null.

use chrono::NaiveDate;
use docket_core::record::{AttendanceStatus, Compartment};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
  pub name:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub author:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location_id: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
}

/// A library or storage location.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
  pub name:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStorageItem {
  pub name:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location_id: Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub quantity:    Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSofaItem {
  pub case_id:     Uuid,
  pub compartment: Compartment,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:       Option<String>,
}

/// One user's attendance for one day. Marking the same `(user_id, date)`
/// again overwrites the earlier mark.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
  pub user_id:   Uuid,
  /// Set on the payload as a date value, not through serde.
  #[serde(skip)]
  pub date:      NaiveDate,
  pub status:    AttendanceStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub check_in:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub check_out: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes:     Option<String>,
}

impl AttendanceMark {
  pub fn new(user_id: Uuid, date: NaiveDate, status: AttendanceStatus) -> Self {
    Self {
      user_id,
      date,
      status,
      check_in: None,
      check_out: None,
      notes: None,
    }
  }
}
