//! dbx/stabs symbol table writer
//!
//! Turns a [`CompilationUnit`] into the `.stabs` / `.stabn` assembler
//! directives a dbx-style debugger reads: numbered type descriptions,
//! symbol records for variables, functions and typedefs, and bracket
//! markers for nested blocks.

pub mod context;
pub mod encoder;
pub mod error;
pub mod record;
pub mod registry;
pub mod scope;
pub mod symbol;

use stabsgen_core::{CompilationUnit, Item, StabsConfig};
use tracing::{debug, info, instrument};

pub use context::DebugContext;
pub use error::CodegenError;
pub use record::{render, Placement, StabCode, StabRecord, CONTINUATION_THRESHOLD};
pub use registry::{TypeNumber, TypeRegistry, TypeStatus};
pub use scope::ScopeWalker;
pub use symbol::SymbolTranslator;

/// Common trait for debug info writers
pub trait Codegen {
    fn generate(&mut self, unit: &CompilationUnit) -> Result<String, CodegenError>;
}

/// Writes the stabs for one compilation unit at a time
#[derive(Debug)]
pub struct StabsCodegen {
    config: StabsConfig,
    ctx: DebugContext,
}

impl StabsCodegen {
    pub fn new(config: StabsConfig) -> Self {
        let ctx = DebugContext::new(config.first_block_number);
        Self { config, ctx }
    }

    pub fn config(&self) -> &StabsConfig {
        &self.config
    }

    /// Numbering and progress left behind by the last unit
    pub fn registry(&self) -> &TypeRegistry {
        &self.ctx.registry
    }

    /// The records for `unit`, in output order
    #[instrument(skip(self, unit), fields(source = %unit.source_file), level = "info")]
    pub fn generate_records(
        &mut self,
        unit: &CompilationUnit,
    ) -> Result<Vec<StabRecord>, CodegenError> {
        self.ctx.reset(self.config.first_block_number);
        self.ctx
            .records
            .source_file(&unit.source_file, &self.config.text_label);

        let mut symbols = SymbolTranslator::new(unit, &self.config, &mut self.ctx);

        // int and char must come out as types 1 and 2
        symbols.emit_type_def(unit.types.int())?;
        symbols.emit_type_def(unit.types.char())?;
        symbols.flush_typedefs()?;

        for item in &unit.items {
            match item {
                Item::Symbol(decl) => symbols.emit_symbol(decl, false)?,
                Item::Function(def) => ScopeWalker::new(&mut symbols).emit_function(def)?,
            }
        }

        let records = self.ctx.records.take_records();
        debug!(
            types = self.ctx.registry.len(),
            records = records.len(),
            "unit described"
        );
        Ok(records)
    }
}

impl Default for StabsCodegen {
    fn default() -> Self {
        Self::new(StabsConfig::default())
    }
}

impl Codegen for StabsCodegen {
    fn generate(&mut self, unit: &CompilationUnit) -> Result<String, CodegenError> {
        let records = self.generate_records(unit)?;
        info!(records = records.len(), "generated stabs");
        Ok(render(&records))
    }
}
