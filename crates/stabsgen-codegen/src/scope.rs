//! Function bodies and their nested blocks
//!
//! The symbols of a block come before its left bracket. The outermost block
//! of a function gets no brackets; the function record itself delimits it.
//! Every nested block gets an `LBB<n>` / `LBE<n>` pair, numbered in the order
//! blocks are entered.

use stabsgen_core::{Block, Declaration, FunctionDef, Stmt};
use tracing::{debug, instrument};

use crate::error::CodegenError;
use crate::record::StabCode;
use crate::symbol::SymbolTranslator;

pub struct ScopeWalker<'t, 'a> {
    symbols: &'t mut SymbolTranslator<'a>,
}

impl<'t, 'a> ScopeWalker<'t, 'a> {
    pub fn new(symbols: &'t mut SymbolTranslator<'a>) -> Self {
        Self { symbols }
    }

    /// The function symbol, its parameters, then its body
    #[instrument(skip(self, def), fields(name = %def.decl.name), level = "debug")]
    pub fn emit_function(&mut self, def: &FunctionDef) -> Result<(), CodegenError> {
        self.symbols.emit_symbol(&def.decl, false)?;
        self.symbols.emit_parameters(&def.params)?;
        self.walk(&def.body, 0, &def.params)
    }

    /// Walk a statement list. `params` is non-empty only for the top-level
    /// statements of a function body; binding blocks there also describe the
    /// parameters that live in registers.
    pub fn walk(
        &mut self,
        stmts: &[Stmt],
        depth: usize,
        params: &[Declaration],
    ) -> Result<(), CodegenError> {
        for stmt in stmts {
            match stmt {
                Stmt::Compound { body } | Stmt::Loop { body } => self.walk(body, depth, &[])?,
                Stmt::If { then, otherwise } => {
                    self.walk(then, depth, &[])?;
                    self.walk(otherwise, depth, &[])?;
                }
                Stmt::Scope(block) => self.walk_block(block, depth, params)?,
            }
        }
        Ok(())
    }

    fn walk_block(
        &mut self,
        block: &Block,
        depth: usize,
        params: &[Declaration],
    ) -> Result<(), CodegenError> {
        self.symbols.emit_tags(&block.tags)?;
        for var in &block.vars {
            self.symbols.emit_symbol(var, true)?;
        }
        if !params.is_empty() {
            self.symbols.emit_register_parameters(params)?;
        }

        let block_number = if depth > 0 {
            let ctx = self.symbols.context();
            let number = ctx.allocate_block()?;
            ctx.records.marker(StabCode::Lbrac, format!("LBB{}", number));
            debug!(number, depth, "entered block");
            Some(number)
        } else {
            None
        };

        self.walk(&block.body, depth + 1, &[])?;

        if let Some(number) = block_number {
            self.symbols
                .context()
                .records
                .marker(StabCode::Rbrac, format!("LBE{}", number));
        }
        Ok(())
    }
}
