//! [`Mirror`]: every collection the client keeps, one per entity kind.

use docket_core::{
  entity::{Entity, EntityKind},
  record::{
    Appointment, Attendance, Book, CaseFile, CaseType, Counsel, Court, District, Expense,
    LibraryLocation, SofaItem, StorageItem, StorageLocation, Task, Transaction,
  },
};

use crate::{collection::Collection, seed};

/// An [`Entity`] with a home in the [`Mirror`].
pub trait Stored: Entity {
  fn collection(mirror: &Mirror) -> &Collection<Self>;
  fn collection_mut(mirror: &mut Mirror) -> &mut Collection<Self>;
}

macro_rules! mirror {
  ($($field:ident: $ty:ty),* $(,)?) => {
    /// In-memory copies of the remote tables.
    #[derive(Debug, Clone, Default)]
    pub struct Mirror {
      $(pub $field: Collection<$ty>,)*
    }

    $(
      impl Stored for $ty {
        fn collection(mirror: &Mirror) -> &Collection<Self> { &mirror.$field }
        fn collection_mut(mirror: &mut Mirror) -> &mut Collection<Self> { &mut mirror.$field }
      }
    )*

    impl Mirror {
      /// Record count per kind.
      pub fn counts(&self) -> Vec<(EntityKind, usize)> {
        vec![$((<$ty as Entity>::KIND, self.$field.len())),*]
      }
    }
  };
}

mirror! {
  cases:             CaseFile,
  appointments:      Appointment,
  counsel:           Counsel,
  transactions:      Transaction,
  tasks:             Task,
  attendance:        Attendance,
  expenses:          Expense,
  books:             Book,
  storage_items:     StorageItem,
  sofa_items:        SofaItem,
  library_locations: LibraryLocation,
  storage_locations: StorageLocation,
  courts:            Court,
  case_types:        CaseType,
  districts:         District,
}

impl Mirror {
  /// An empty mirror holding only the built-in reference rows.
  pub fn seeded() -> Self {
    Self {
      courts: Collection::new(seed::courts()),
      case_types: Collection::new(seed::case_types()),
      districts: Collection::new(seed::districts()),
      ..Self::default()
    }
  }

  /// Drop everything and return to the seeded state.
  pub fn reset(&mut self) { *self = Self::seeded(); }

  pub fn get<E: Stored>(&self) -> &Collection<E> { E::collection(self) }

  pub fn get_mut<E: Stored>(&mut self) -> &mut Collection<E> { E::collection_mut(self) }
}
