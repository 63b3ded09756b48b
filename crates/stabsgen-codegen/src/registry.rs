//! Type numbering
//!
//! The first time a type is mentioned it gets the next free number; that
//! number names it for the rest of the compilation unit. Alongside each
//! number the registry records how much of the type has been written out so
//! far, so later references can decide between a bare number, a forward
//! reference and a full definition.

use std::fmt;

use stabsgen_core::TypeId;
use tracing::trace;

/// Number under which the built-in `int` is described; other integer types
/// are subranges of it
pub const INT_TYPE_NUMBER: TypeNumber = TypeNumber(1);

/// Number under which the built-in `char` is described
pub const CHAR_TYPE_NUMBER: TypeNumber = TypeNumber(2);

const INITIAL_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeNumber(u32);

impl TypeNumber {
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How much of a type has been written out. Ordered: a status only ever
/// moves to a later variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeStatus {
    /// Numbered, nothing written beyond the number
    #[default]
    Unseen,
    /// Written as a cross-reference (`xs`, `xu`, `xe`) only
    CrossReferenced,
    /// Full definition written, or being written
    Defined,
}

#[derive(Debug)]
pub struct TypeRegistry {
    /// Number assigned to each type, indexed by `TypeId`
    numbers: Vec<Option<TypeNumber>>,
    /// Status of each number, indexed by number; slot 0 is unused
    statuses: Vec<TypeStatus>,
    next_number: u32,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            numbers: Vec::new(),
            statuses: vec![TypeStatus::Unseen; INITIAL_CAPACITY],
            next_number: 1,
        }
    }

    /// The number of `ty`, assigning the next free one on first sight
    pub fn allocate_or_get(&mut self, ty: TypeId) -> TypeNumber {
        if let Some(number) = self.number_of(ty) {
            return number;
        }

        let number = TypeNumber(self.next_number);
        self.next_number += 1;

        let idx = ty.index();
        if idx >= self.numbers.len() {
            self.numbers.resize(idx + 1, None);
        }
        self.numbers[idx] = Some(number);

        if self.next_number as usize == self.statuses.len() {
            let len = self.statuses.len();
            self.statuses.resize(len * 2, TypeStatus::Unseen);
            trace!(capacity = len * 2, "grew type status table");
        }

        trace!(%ty, %number, "assigned type number");
        number
    }

    /// The number of `ty` if it already has one
    pub fn number_of(&self, ty: TypeId) -> Option<TypeNumber> {
        self.numbers.get(ty.index()).copied().flatten()
    }

    pub fn status(&self, number: TypeNumber) -> TypeStatus {
        self.statuses
            .get(number.0 as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Record progress on `number`; requests to move a status backwards are
    /// ignored
    pub fn set_status(&mut self, number: TypeNumber, status: TypeStatus) {
        let Some(slot) = self.statuses.get_mut(number.0 as usize) else {
            return;
        };
        if status < *slot {
            trace!(%number, current = ?*slot, requested = ?status, "ignoring status regression");
            return;
        }
        *slot = status;
    }

    /// Status of `ty`, `Unseen` when it has no number yet
    pub fn status_of(&self, ty: TypeId) -> TypeStatus {
        self.number_of(ty)
            .map_or(TypeStatus::Unseen, |number| self.status(number))
    }

    /// How many numbers have been handed out
    pub fn len(&self) -> usize {
        self.next_number as usize - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots currently allocated in the status table
    pub fn capacity(&self) -> usize {
        self.statuses.len()
    }

    /// Forget everything; the next type gets number 1 again
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
