//! Built-in reference rows, used until the remote store supplies its own.

use chrono::{DateTime, Utc};
use docket_core::record::{CaseType, Court, District};
use uuid::Uuid;

const COURTS: [&str; 4] = ["Supreme Court", "High Court", "District Court", "Magistrate Court"];
const CASE_TYPES: [&str; 4] = ["Civil", "Criminal", "Family", "Commercial"];
const DISTRICTS: [&str; 4] = ["Central", "North", "South", "East"];

/// Stable ids so seeded rows keep their identity across resets.
fn seed_id(group: u128, n: usize) -> Uuid { Uuid::from_u128((group << 64) | n as u128 + 1) }

pub fn courts() -> Vec<Court> {
  COURTS
    .iter()
    .enumerate()
    .map(|(n, name)| Court {
      id:         seed_id(1, n),
      name:       (*name).to_owned(),
      created_at: DateTime::<Utc>::UNIX_EPOCH,
      updated_at: None,
    })
    .collect()
}

pub fn case_types() -> Vec<CaseType> {
  CASE_TYPES
    .iter()
    .enumerate()
    .map(|(n, name)| CaseType {
      id:         seed_id(2, n),
      name:       (*name).to_owned(),
      created_at: DateTime::<Utc>::UNIX_EPOCH,
      updated_at: None,
    })
    .collect()
}

pub fn districts() -> Vec<District> {
  DISTRICTS
    .iter()
    .enumerate()
    .map(|(n, name)| District {
      id:         seed_id(3, n),
      name:       (*name).to_owned(),
      created_at: DateTime::<Utc>::UNIX_EPOCH,
      updated_at: None,
    })
    .collect()
}
