//! Pre-write checks, evaluated against the mirror before any remote call.
//!
//! Guards only see local state. Compartment uniqueness in particular is not
//! re-checked by the remote store, so two clients can race past it.

use docket_core::{entity::EntityKind, record::Compartment, value::Payload};
use uuid::Uuid;

use crate::{error::ValidationFailure, mirror::Mirror};

type Check = Result<(), ValidationFailure>;

/// Run the creation guard for `kind`. Kinds without one always pass.
pub fn check_create(kind: EntityKind, mirror: &Mirror, payload: &Payload) -> Check {
  match kind {
    EntityKind::Book | EntityKind::LibraryLocation | EntityKind::StorageLocation => {
      require_name(kind, payload)
    }
    EntityKind::StorageItem => require_location(payload),
    EntityKind::SofaItem => check_compartment(mirror, payload),
    _ => Ok(()),
  }
}

/// `name` must be a string with something other than whitespace in it.
pub fn require_name(kind: EntityKind, payload: &Payload) -> Check {
  match payload.str_field("name") {
    Some(name) if !name.trim().is_empty() => Ok(()),
    _ => Err(ValidationFailure::EmptyName { kind }),
  }
}

pub fn require_location(payload: &Payload) -> Check {
  match payload.str_field("locationId") {
    Some(id) if !id.trim().is_empty() => Ok(()),
    _ => Err(ValidationFailure::MissingLocation),
  }
}

/// Run the update guard for `kind`. Only sofa slots have one: a patch that
/// moves slot `id` is checked as if the moved slot were being created.
pub fn check_update(kind: EntityKind, mirror: &Mirror, id: Uuid, patch: &Payload) -> Check {
  if kind != EntityKind::SofaItem || !(patch.contains("caseId") || patch.contains("compartment")) {
    return Ok(());
  }
  let current = mirror.sofa_items.get(id);

  let case_id = match (patch.contains("caseId"), current) {
    (true, _) => case_id_of(patch)?,
    (false, Some(slot)) => slot.case_id,
    (false, None) => return Ok(()),
  };
  let compartment = match (patch.contains("compartment"), current) {
    (true, _) => compartment_of(patch)?,
    (false, Some(slot)) => slot.compartment,
    (false, None) => return Ok(()),
  };
  check_slot(mirror, case_id, compartment, Some(id))
}

/// The case must be known locally and must not already sit in the requested
/// compartment.
pub fn check_compartment(mirror: &Mirror, payload: &Payload) -> Check {
  let case_id = case_id_of(payload)?;
  let compartment = compartment_of(payload)?;
  check_slot(mirror, case_id, compartment, None)
}

fn case_id_of(payload: &Payload) -> Result<Uuid, ValidationFailure> {
  payload
    .str_field("caseId")
    .and_then(|raw| Uuid::parse_str(raw).ok())
    .ok_or(ValidationFailure::InvalidField { field: "caseId" })
}

fn compartment_of(payload: &Payload) -> Result<Compartment, ValidationFailure> {
  payload
    .str_field("compartment")
    .and_then(|raw| raw.parse::<Compartment>().ok())
    .ok_or(ValidationFailure::InvalidField { field: "compartment" })
}

/// `except` is the slot being moved, which may keep its own place.
fn check_slot(
  mirror: &Mirror,
  case_id: Uuid,
  compartment: Compartment,
  except: Option<Uuid>,
) -> Check {
  let occupied = mirror.sofa_items.iter().any(|slot| {
    Some(slot.id) != except && slot.case_id == case_id && slot.compartment == compartment
  });
  if occupied {
    return Err(ValidationFailure::CompartmentOccupied { case_id, compartment });
  }

  if !mirror.cases.contains(case_id) {
    return Err(ValidationFailure::CaseNotFound(case_id));
  }
  Ok(())
}
