//! [`Collection`]: the ordered, identity-keyed mirror of one entity kind.

use docket_core::entity::Entity;
use uuid::Uuid;

/// Records of one kind, most recent first. Identities are unique within a
/// collection.
///
/// Operations are plain synchronous mutations; nothing is emitted.
#[derive(Debug, Clone)]
pub struct Collection<E> {
  records: Vec<E>,
}

impl<E> Default for Collection<E> {
  fn default() -> Self { Self { records: Vec::new() } }
}

impl<E: Entity> Collection<E> {
  pub fn new(records: Vec<E>) -> Self {
    let mut collection = Self::default();
    collection.replace_all(records);
    collection
  }

  /// Overwrite every record. Later duplicates of an identity are dropped.
  pub fn replace_all(&mut self, records: Vec<E>) {
    self.records.clear();
    for record in records {
      if self.position(record.id()).is_none() {
        self.records.push(record);
      }
    }
  }

  /// Put `record` first. A record with the same identity is replaced.
  pub fn insert_front(&mut self, record: E) {
    self.remove_by_id(record.id());
    self.records.insert(0, record);
  }

  /// Replace the record with identity `id` in place. Returns whether a record
  /// was found; ordering never changes.
  pub fn update_by_id(&mut self, id: Uuid, record: E) -> bool {
    match self.position(id) {
      Some(i) => {
        self.records[i] = record;
        true
      }
      None => false,
    }
  }

  /// Remove the record with identity `id`, if any.
  pub fn remove_by_id(&mut self, id: Uuid) -> bool {
    let before = self.records.len();
    self.records.retain(|r| r.id() != id);
    self.records.len() != before
  }

  pub fn get(&self, id: Uuid) -> Option<&E> { self.records.iter().find(|r| r.id() == id) }

  pub fn contains(&self, id: Uuid) -> bool { self.position(id).is_some() }

  pub fn iter(&self) -> std::slice::Iter<'_, E> { self.records.iter() }

  pub fn as_slice(&self) -> &[E] { &self.records }

  pub fn to_vec(&self) -> Vec<E> { self.records.clone() }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn clear(&mut self) { self.records.clear(); }

  fn position(&self, id: Uuid) -> Option<usize> { self.records.iter().position(|r| r.id() == id) }
}

impl<'a, E: Entity> IntoIterator for &'a Collection<E> {
  type Item = &'a E;
  type IntoIter = std::slice::Iter<'a, E>;

  fn into_iter(self) -> Self::IntoIter { self.iter() }
}
