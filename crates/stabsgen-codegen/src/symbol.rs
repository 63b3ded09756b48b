//! Symbol records for declarations
//!
//! A symbol's description is its name, a colon, a letter saying what kind of
//! symbol it is, and its type:
//!
//! | letter | code | meaning | value |
//! |---|---|---|---|
//! | `F` / `f` | `Fun` | public / file-local function | entry label |
//! | `G` | `Gsym` | public variable in static storage | 0 |
//! | `S` / `v` | `Lcsym`, `Stsym`, `Fun` | file / block static | label |
//! | `r` | `Rsym` | register variable | register |
//! | (none) | `Lsym` | automatic variable | frame offset |
//! | `p` | `Psym` | parameter | argument offset |
//! | `t` / `T` | `Lsym` | typedef / struct, union or enum tag | 0 |
//!
//! For static variables the code says which segment the label is in:
//! `Lcsym` for bss, `Stsym` for data, and `Fun` for read-only data (the
//! closest code there is for the text segment).

use stabsgen_core::{
    CompilationUnit, DeclKind, Declaration, Location, StabsConfig, Tag, TypeId, TypeKind,
};
use tracing::{debug, trace};

use crate::context::DebugContext;
use crate::encoder::TypeEncoder;
use crate::error::CodegenError;
use crate::record::{Placement, StabCode};
use crate::registry::TypeStatus;

pub struct SymbolTranslator<'a> {
    unit: &'a CompilationUnit,
    config: &'a StabsConfig,
    ctx: &'a mut DebugContext,
}

impl<'a> SymbolTranslator<'a> {
    pub fn new(unit: &'a CompilationUnit, config: &'a StabsConfig, ctx: &'a mut DebugContext) -> Self {
        Self { unit, config, ctx }
    }

    pub(crate) fn context(&mut self) -> &mut DebugContext {
        self.ctx
    }

    /// Write the symbol record(s) for `decl`.
    ///
    /// `local` is false at file scope; file-scope symbols first flush every
    /// tag and typedef that is not out yet so the types they use are
    /// described before them.
    pub fn emit_symbol(&mut self, decl: &Declaration, local: bool) -> Result<(), CodegenError> {
        if !local {
            let unit = self.unit;
            self.emit_tags(&unit.tags)?;
            self.flush_typedefs()?;
        }

        match &decl.kind {
            DeclKind::EnumConstant => {
                // Described by the enum type itself
                trace!(name = %decl.name, "skipping enum constant");
                Ok(())
            }
            DeclKind::Function(function) => {
                if function.external {
                    trace!(name = %decl.name, "skipping external function");
                    return Ok(());
                }
                let Some(address) = &function.address else {
                    debug!(name = %decl.name, "skipping function without an address");
                    return Ok(());
                };
                let letter = if function.public { 'F' } else { 'f' };
                let returns = self.return_type(decl)?;
                self.describe(
                    &decl.name,
                    Some(letter),
                    StabCode::Fun,
                    Placement::Address(address.clone()),
                    returns,
                    false,
                )
            }
            DeclKind::Typedef => self.describe(
                &decl.name,
                Some('t'),
                StabCode::Lsym,
                Placement::Number(0),
                decl.ty,
                true,
            ),
            DeclKind::Parameter(_) => {
                Err(CodegenError::ParameterOutsideParameterList(decl.name.clone()))
            }
            DeclKind::Variable(var) => {
                if var.external {
                    trace!(name = %decl.name, "skipping external variable");
                    return Ok(());
                }
                let (letter, code, value) = match &var.location {
                    Location::Eliminated => {
                        debug!(name = %decl.name, "skipping variable with no storage");
                        return Ok(());
                    }
                    Location::Static { .. } if var.public => {
                        (Some('G'), StabCode::Gsym, Placement::Number(0))
                    }
                    Location::Static { symbol } => {
                        let letter = if var.permanent { 'S' } else { 'v' };
                        let code = if !var.initialized {
                            StabCode::Lcsym
                        } else if var.read_only && !var.volatile {
                            StabCode::Fun
                        } else {
                            StabCode::Stsym
                        };
                        (Some(letter), code, Placement::Address(symbol.clone()))
                    }
                    Location::Register { regno } => (
                        Some('r'),
                        StabCode::Rsym,
                        Placement::Number(self.config.debugger_register(*regno) as i64),
                    ),
                    Location::Frame { offset } => (None, StabCode::Lsym, Placement::Number(*offset)),
                };
                self.describe(&decl.name, letter, code, value, decl.ty, false)
            }
        }
    }

    /// Describe each parameter by its slot in the argument list
    pub fn emit_parameters(&mut self, params: &[Declaration]) -> Result<(), CodegenError> {
        for param in params {
            let DeclKind::Parameter(info) = &param.kind else {
                return Err(CodegenError::NotAParameter {
                    name: param.name.clone(),
                    kind: param.kind_name(),
                });
            };
            let mut offset = info.arg_offset;
            if self.config.big_endian {
                // A narrow argument sits in the high-addressed end of its slot
                offset += info.passed_size as i64 - info.stored_size as i64;
            }
            self.describe(
                &param.name,
                Some('p'),
                StabCode::Psym,
                Placement::Number(offset),
                param.ty,
                false,
            )?;
        }
        Ok(())
    }

    /// Describe a second time, by register, each parameter the body keeps in
    /// a register. Debuggers print argument lists from the `p` records and
    /// evaluate expressions with these.
    pub fn emit_register_parameters(&mut self, params: &[Declaration]) -> Result<(), CodegenError> {
        for param in params {
            let DeclKind::Parameter(info) = &param.kind else {
                return Err(CodegenError::NotAParameter {
                    name: param.name.clone(),
                    kind: param.kind_name(),
                });
            };
            if let Location::Register { regno } = info.location {
                self.describe(
                    &param.name,
                    Some('r'),
                    StabCode::Rsym,
                    Placement::Number(self.config.debugger_register(regno) as i64),
                    param.ty,
                    false,
                )?;
            }
        }
        Ok(())
    }

    /// Write `name:t<type>` for a type named by a typedef
    pub fn emit_type_def(&mut self, ty: TypeId) -> Result<(), CodegenError> {
        let unit = self.unit;
        let node = unit.types.get(ty).ok_or(CodegenError::UnknownType(ty))?;
        let name = match &node.name {
            Some(name) if name.is_typedef() => name.as_str(),
            _ => return Err(CodegenError::MissingTypedefName(ty)),
        };
        self.ctx.mark_typedef_written(ty);
        self.describe(name, Some('t'), StabCode::Lsym, Placement::Number(0), ty, true)
    }

    /// Write the typedef record of every typedef-named type not written yet,
    /// in the order the types were created
    pub fn flush_typedefs(&mut self) -> Result<(), CodegenError> {
        let unit = self.unit;
        for (ty, node) in unit.types.iter() {
            let is_typedef = node.name.as_ref().is_some_and(|name| name.is_typedef());
            if is_typedef && !self.ctx.typedef_written(ty) {
                self.emit_type_def(ty)?;
            }
        }
        Ok(())
    }

    /// Write `name:T<type>` for each named, complete tag that has not been
    /// fully defined yet, including ones seen so far only as cross-references
    pub fn emit_tags(&mut self, tags: &[Tag]) -> Result<(), CodegenError> {
        for tag in tags {
            let Some(name) = &tag.name else {
                continue;
            };
            let node = self.unit.types.get(tag.ty).ok_or(CodegenError::UnknownType(tag.ty))?;
            if !node.is_complete() || self.ctx.registry.status_of(tag.ty) == TypeStatus::Defined {
                continue;
            }
            self.describe(name, Some('T'), StabCode::Lsym, Placement::Number(0), tag.ty, true)?;
            let number = self.ctx.registry.allocate_or_get(tag.ty);
            self.ctx.registry.set_status(number, TypeStatus::Defined);
        }
        Ok(())
    }

    fn return_type(&self, decl: &Declaration) -> Result<TypeId, CodegenError> {
        let types = &self.unit.types;
        let node = types.get(decl.ty).ok_or(CodegenError::UnknownType(decl.ty))?;
        match node.kind {
            TypeKind::Function { returns } => Ok(returns.unwrap_or_else(|| types.void())),
            _ => Err(CodegenError::NotAFunctionType {
                name: decl.name.clone(),
                ty: decl.ty,
            }),
        }
    }

    /// One complete symbol: `name:<letter><type>` plus any continuations
    fn describe(
        &mut self,
        name: &str,
        letter: Option<char>,
        code: StabCode,
        value: Placement,
        ty: TypeId,
        full: bool,
    ) -> Result<(), CodegenError> {
        let unit = self.unit;
        let ctx = &mut *self.ctx;
        ctx.records.begin(name, letter, code, value);
        TypeEncoder::new(&unit.types, &mut ctx.registry, &mut ctx.records).encode(ty, full)?;
        ctx.records.finish();
        trace!(name, ?code, "symbol written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{render, StabRecord};
    use pretty_assertions::assert_eq;
    use stabsgen_core::decl::{FunctionDecl, ParamDecl, VarDecl};
    use stabsgen_core::{Field, TypeArena, UnitBuilder};

    /// Run `f` against a translator whose int and char are already numbered
    fn with_translator<F>(unit: &CompilationUnit, config: &StabsConfig, f: F) -> Vec<StabRecord>
    where
        F: FnOnce(&mut SymbolTranslator<'_>) -> Result<(), CodegenError>,
    {
        let mut ctx = DebugContext::new(config.first_block_number);
        let mut translator = SymbolTranslator::new(unit, config, &mut ctx);
        translator.emit_type_def(unit.types.int()).unwrap();
        translator.emit_type_def(unit.types.char()).unwrap();
        translator.context().records.reset();
        f(&mut translator).unwrap();
        ctx.records.take_records()
    }

    fn local_unit() -> CompilationUnit {
        UnitBuilder::new("t.c", TypeArena::new()).build()
    }

    #[test]
    fn test_auto_variable() {
        let unit = local_unit();
        let config = StabsConfig::default();
        let decl = Declaration::auto("i", unit.types.int(), -12);
        let records = with_translator(&unit, &config, |t| t.emit_symbol(&decl, true));
        assert_eq!(render(&records), ".stabs \"i:1\",128,0,0,-12\n");
    }

    #[test]
    fn test_register_variable_uses_debugger_numbering() {
        let unit = local_unit();
        let config = StabsConfig::default().with_register(14, 6);
        let decl = Declaration::register("p", unit.types.char(), 14);
        let records = with_translator(&unit, &config, |t| t.emit_symbol(&decl, true));
        assert_eq!(render(&records), ".stabs \"p:r2\",64,0,0,6\n");
    }

    #[test]
    fn test_public_global() {
        let unit = local_unit();
        let config = StabsConfig::default();
        let decl = Declaration::global("total", unit.types.int(), true, "_total");
        let records = with_translator(&unit, &config, |t| t.emit_symbol(&decl, true));
        assert_eq!(render(&records), ".stabs \"total:G1\",32,0,0,0\n");
    }

    #[test]
    fn test_static_segments() {
        let unit = local_unit();
        let config = StabsConfig::default();
        let int = unit.types.int();
        let at = |symbol: &str| Location::Static {
            symbol: symbol.to_string(),
        };

        let bss = Declaration::variable("a", int, VarDecl { permanent: true, ..VarDecl::local(at("_a")) });
        let data = Declaration::variable("b", int, VarDecl::local(at("_b")).with_initializer(false));
        let rodata = Declaration::variable("c", int, VarDecl::local(at("_c")).with_initializer(true));
        let volatile = Declaration::variable(
            "d",
            int,
            VarDecl {
                volatile: true,
                ..VarDecl::local(at("_d")).with_initializer(true)
            },
        );

        let records = with_translator(&unit, &config, |t| {
            for decl in [&bss, &data, &rodata, &volatile] {
                t.emit_symbol(decl, true)?;
            }
            Ok(())
        });
        assert_eq!(
            render(&records),
            ".stabs \"a:S1\",40,0,0,_a\n\
             .stabs \"b:v1\",38,0,0,_b\n\
             .stabs \"c:v1\",36,0,0,_c\n\
             .stabs \"d:v1\",38,0,0,_d\n"
        );
    }

    #[test]
    fn test_skipped_declarations_produce_nothing() {
        let mut types = TypeArena::new();
        let int = types.int();
        let fn_ty = types.function_returning(Some(int));
        let unit = UnitBuilder::new("t.c", types).build();
        let config = StabsConfig::default();

        let external_var = Declaration::variable(
            "errno",
            int,
            VarDecl {
                external: true,
                ..VarDecl::local(Location::Static {
                    symbol: "_errno".to_string(),
                })
            },
        );
        let eliminated = Declaration::variable("dead", int, VarDecl::local(Location::Eliminated));
        let external_fn = Declaration {
            name: "printf".to_string(),
            ty: fn_ty,
            kind: DeclKind::Function(FunctionDecl {
                public: true,
                external: true,
                address: None,
            }),
        };
        let no_address = Declaration {
            name: "inlined".to_string(),
            ty: fn_ty,
            kind: DeclKind::Function(FunctionDecl {
                public: false,
                external: false,
                address: None,
            }),
        };
        let constant = Declaration::enum_constant("RED", int);

        let records = with_translator(&unit, &config, |t| {
            for decl in [&external_var, &eliminated, &external_fn, &no_address, &constant] {
                t.emit_symbol(decl, true)?;
            }
            Ok(())
        });
        assert!(records.is_empty());
    }

    #[test]
    fn test_function_symbol() {
        let mut types = TypeArena::new();
        let int = types.int();
        let fn_ty = types.function_returning(Some(int));
        let proc_ty = types.function_returning(None);
        let unit = UnitBuilder::new("t.c", types).build();
        let config = StabsConfig::default();

        let main = Declaration::function("main", fn_ty, true, "_main");
        let helper = Declaration::function("helper", proc_ty, false, "_helper");
        let records = with_translator(&unit, &config, |t| {
            t.emit_symbol(&main, true)?;
            t.emit_symbol(&helper, true)
        });
        assert_eq!(
            render(&records),
            ".stabs \"main:F1\",36,0,0,_main\n\
             .stabs \"helper:f3=3\",36,0,0,_helper\n"
        );
    }

    #[test]
    fn test_function_with_non_function_type() {
        let unit = local_unit();
        let config = StabsConfig::default();
        let mut ctx = DebugContext::new(2);
        let decl = Declaration::function("main", unit.types.int(), true, "_main");
        let err = SymbolTranslator::new(&unit, &config, &mut ctx)
            .emit_symbol(&decl, true)
            .unwrap_err();
        assert!(matches!(err, CodegenError::NotAFunctionType { .. }));
    }

    #[test]
    fn test_typedef_forces_full_definition() {
        let mut types = TypeArena::new();
        let int = types.int();
        let point = types.record(
            Some("point"),
            vec![Field::new("x", int, 0, 32), Field::new("y", int, 32, 32)],
            8,
        );
        let unit = UnitBuilder::new("t.c", types).build();
        let config = StabsConfig::default();
        let decl = Declaration::typedef("point_t", point);
        let records = with_translator(&unit, &config, |t| t.emit_symbol(&decl, true));
        assert_eq!(
            render(&records),
            ".stabs \"point_t:t3=s8x:1,0,32;y:1,32,32;;\",128,0,0,0\n"
        );
    }

    #[test]
    fn test_parameter_through_symbol_path_is_fatal() {
        let unit = local_unit();
        let config = StabsConfig::default();
        let mut ctx = DebugContext::new(2);
        let param = Declaration::parameter("argc", unit.types.int(), 8, Location::Frame { offset: 8 });
        let err = SymbolTranslator::new(&unit, &config, &mut ctx)
            .emit_symbol(&param, true)
            .unwrap_err();
        assert!(matches!(err, CodegenError::ParameterOutsideParameterList(name) if name == "argc"));
    }

    #[test]
    fn test_parameters() {
        let unit = local_unit();
        let int = unit.types.int();
        let chr = unit.types.char();
        let params = vec![
            Declaration::parameter("n", int, 8, Location::Register { regno: 3 }),
            Declaration {
                name: "c".to_string(),
                ty: chr,
                kind: DeclKind::Parameter(ParamDecl {
                    arg_offset: 12,
                    location: Location::Frame { offset: 12 },
                    passed_size: 4,
                    stored_size: 1,
                }),
            },
        ];

        let little = StabsConfig::default();
        let records = with_translator(&unit, &little, |t| {
            t.emit_parameters(&params)?;
            t.emit_register_parameters(&params)
        });
        assert_eq!(
            render(&records),
            ".stabs \"n:p1\",160,0,0,8\n\
             .stabs \"c:p2\",160,0,0,12\n\
             .stabs \"n:r1\",64,0,0,3\n"
        );

        let big = StabsConfig::default().with_big_endian(true);
        let records = with_translator(&unit, &big, |t| t.emit_parameters(&params));
        assert_eq!(
            render(&records),
            ".stabs \"n:p1\",160,0,0,8\n\
             .stabs \"c:p2\",160,0,0,15\n"
        );
    }

    #[test]
    fn test_non_parameter_in_parameter_list() {
        let unit = local_unit();
        let config = StabsConfig::default();
        let mut ctx = DebugContext::new(2);
        let params = vec![Declaration::auto("i", unit.types.int(), -4)];
        let err = SymbolTranslator::new(&unit, &config, &mut ctx)
            .emit_parameters(&params)
            .unwrap_err();
        assert!(matches!(err, CodegenError::NotAParameter { kind: "variable", .. }));
    }

    #[test]
    fn test_tags_upgrade_cross_references() {
        let mut types = TypeArena::new();
        let int = types.int();
        let point = types.record(Some("point"), vec![Field::new("x", int, 0, 32)], 4);
        let pending = types.declare_record("pending");
        let ptr = types.pointer_to(point);
        let unit = UnitBuilder::new("t.c", types).build();
        let config = StabsConfig::default();
        let tags = vec![Tag::new("point", point), Tag::new("pending", pending)];

        let records = with_translator(&unit, &config, |t| {
            t.emit_symbol(&Declaration::auto("p", ptr, -4), true)?;
            t.emit_tags(&tags)?;
            // Already defined: nothing more
            t.emit_tags(&tags)
        });
        assert_eq!(
            render(&records),
            ".stabs \"p:3=*4=xspoint:\",128,0,0,-4\n\
             .stabs \"point:T4=s4x:1,0,32;;\",128,0,0,0\n"
        );
    }

    #[test]
    fn test_file_scope_symbol_flushes_tags_and_typedefs() {
        let mut types = TypeArena::new();
        let int = types.int();
        let size_t = types.integer("size_t", 0, u32::MAX as i64, 4);
        let point = types.record(Some("point"), vec![Field::new("x", int, 0, 32)], 4);
        let unit = UnitBuilder::new("t.c", types)
            .tag("point", point)
            .build();
        let config = StabsConfig::default();

        let decl = Declaration::global("len", size_t, true, "_len");
        let records = with_translator(&unit, &config, |t| {
            t.emit_symbol(&decl, false)?;
            t.emit_symbol(&decl, false)
        });
        assert_eq!(
            render(&records),
            ".stabs \"point:T3=s4x:1,0,32;;\",128,0,0,0\n\
             .stabs \"void:t4=4\",128,0,0,0\n\
             .stabs \"size_t:t5=r1;0;4294967295;\",128,0,0,0\n\
             .stabs \"len:G5\",32,0,0,0\n\
             .stabs \"len:G5\",32,0,0,0\n"
        );
    }

    #[test]
    fn test_anonymous_record_named_by_typedef() {
        let mut types = TypeArena::new();
        let int = types.int();
        let pair = types.record(None, vec![Field::new("a", int, 0, 32)], 4);
        types.set_typedef_name(pair, "pair_t").unwrap();
        let unit = UnitBuilder::new("t.c", types).build();
        let config = StabsConfig::default();

        let records = with_translator(&unit, &config, |t| t.flush_typedefs());
        assert_eq!(
            render(&records),
            ".stabs \"void:t3=3\",128,0,0,0\n\
             .stabs \"pair_t:t4=s4a:1,0,32;;\",128,0,0,0\n"
        );
    }

    #[test]
    fn test_type_def_requires_typedef_name() {
        let mut types = TypeArena::new();
        let point = types.record(Some("point"), Vec::new(), 0);
        let unit = UnitBuilder::new("t.c", types).build();
        let config = StabsConfig::default();
        let mut ctx = DebugContext::new(2);
        let err = SymbolTranslator::new(&unit, &config, &mut ctx)
            .emit_type_def(point)
            .unwrap_err();
        assert!(matches!(err, CodegenError::MissingTypedefName(_)));
    }
}
