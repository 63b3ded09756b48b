//! State that lives for one compilation unit

use std::collections::HashSet;

use stabsgen_core::TypeId;

use crate::error::CodegenError;
use crate::record::RecordEmitter;
use crate::registry::TypeRegistry;

/// Type numbers, block numbers and output of the unit being described
///
/// Created once per writer and reset at the start of every unit.
#[derive(Debug)]
pub struct DebugContext {
    pub registry: TypeRegistry,
    pub records: RecordEmitter,
    next_block: u32,
    /// Types whose typedef record has been written
    typedefs_written: HashSet<TypeId>,
}

impl DebugContext {
    pub fn new(first_block_number: u32) -> Self {
        Self {
            registry: TypeRegistry::new(),
            records: RecordEmitter::new(),
            next_block: first_block_number,
            typedefs_written: HashSet::new(),
        }
    }

    pub fn reset(&mut self, first_block_number: u32) {
        self.registry.reset();
        self.records.reset();
        self.next_block = first_block_number;
        self.typedefs_written.clear();
    }

    /// Number for the next nested block, in the order blocks are entered
    pub fn allocate_block(&mut self) -> Result<u32, CodegenError> {
        let number = self.next_block;
        self.next_block = number
            .checked_add(1)
            .ok_or(CodegenError::BlockNumbersExhausted { last: number })?;
        Ok(number)
    }

    /// Remember that the typedef record for `ty` is out; false if it already was
    pub(crate) fn mark_typedef_written(&mut self, ty: TypeId) -> bool {
        self.typedefs_written.insert(ty)
    }

    pub(crate) fn typedef_written(&self, ty: TypeId) -> bool {
        self.typedefs_written.contains(&ty)
    }
}
