//! Type descriptions
//!
//! A type reference is always its number. The first time a type is written
//! (or the first time a full definition is requested for a type that was only
//! cross-referenced) the number is followed by `=` and a body:
//!
//! | category | body |
//! |---|---|
//! | void | own number (`3=3`) |
//! | integer | `r1;<min>;<max>;` (`char`: `r2;0;127;`) |
//! | real | `r1;<bytes>;0;` |
//! | array | `ar1;0;<length - 1>;<element>` |
//! | struct / union | `s<bytes>` / `u<bytes>`, `name:<type>,<bit offset>,<bit size>;` per named field, `;` |
//! | enum | `e`, `name:<value>,` per enumerator, `;` |
//! | pointer | `*<target>` |
//! | function | `f<return type>` |
//!
//! A named struct, union or enum referenced without `full`, or any of them
//! while still incomplete, is written as a cross-reference `xs<name>:`
//! (`xu`, `xe`) instead.

use std::fmt::Write;

use stabsgen_core::{TypeArena, TypeId, TypeKind, TypeNode};
use tracing::trace;

use crate::error::CodegenError;
use crate::record::RecordEmitter;
use crate::registry::{TypeRegistry, TypeStatus, CHAR_TYPE_NUMBER, INT_TYPE_NUMBER};

/// Lower and upper bound written for `char`, as older debuggers expect
const CHAR_RANGE: (i64, i64) = (0, 127);

pub struct TypeEncoder<'a> {
    types: &'a TypeArena,
    registry: &'a mut TypeRegistry,
    out: &'a mut RecordEmitter,
}

impl<'a> TypeEncoder<'a> {
    pub fn new(
        types: &'a TypeArena,
        registry: &'a mut TypeRegistry,
        out: &'a mut RecordEmitter,
    ) -> Self {
        Self {
            types,
            registry,
            out,
        }
    }

    /// Write a reference to `ty` into the current symbol description,
    /// defining it on the spot if that has not happened yet.
    ///
    /// With `full`, a type previously written only as a cross-reference gets
    /// its real definition now.
    pub fn encode(&mut self, ty: TypeId, full: bool) -> Result<(), CodegenError> {
        let types = self.types;
        let node = types.get(ty).ok_or(CodegenError::UnknownType(ty))?;

        let number = self.registry.allocate_or_get(ty);
        write!(self.out, "{}", number)?;

        match self.registry.status(number) {
            TypeStatus::Defined => return Ok(()),
            TypeStatus::CrossReferenced if !full => return Ok(()),
            TypeStatus::CrossReferenced | TypeStatus::Unseen => {}
        }

        write!(self.out, "=")?;

        if let Some(letter) = cross_reference_letter(node, full) {
            let name = node.name.as_ref().ok_or(CodegenError::UnnamedType {
                ty,
                category: node.kind.category(),
            })?;
            write!(self.out, "x{}{}:", letter, name.as_str())?;
            self.registry.set_status(number, TypeStatus::CrossReferenced);
            trace!(%ty, %number, "cross-referenced");
            return Ok(());
        }

        // Defined before descending so a type that reaches itself through
        // its members sees a finished definition and stops at the number.
        self.registry.set_status(number, TypeStatus::Defined);
        trace!(%ty, %number, category = node.kind.category(), "defining type");

        match &node.kind {
            TypeKind::Void => write!(self.out, "{}", number)?,
            TypeKind::Integer { min, max } => {
                if ty == types.char() {
                    let (lo, hi) = CHAR_RANGE;
                    write!(self.out, "r{};{};{};", CHAR_TYPE_NUMBER, lo, hi)?;
                } else {
                    write!(self.out, "r{};{};{};", INT_TYPE_NUMBER, min, max)?;
                }
            }
            TypeKind::Real => {
                let size = node.size.ok_or(CodegenError::UnsizedReal(ty))?;
                write!(self.out, "r{};{};0;", INT_TYPE_NUMBER, size)?;
            }
            TypeKind::Array { element, length } => {
                let length = i64::try_from(*length).map_err(|_| CodegenError::ArrayTooLong {
                    ty,
                    length: *length,
                })?;
                let upper = length - 1;
                write!(self.out, "ar{};0;{};", INT_TYPE_NUMBER, upper)?;
                self.encode(*element, false)?;
            }
            TypeKind::Record { fields } | TypeKind::Union { fields } => {
                let letter = if matches!(node.kind, TypeKind::Record { .. }) {
                    's'
                } else {
                    'u'
                };
                write!(self.out, "{}{}", letter, node.size.unwrap_or(0))?;

                let mut first = true;
                for field in fields {
                    // Nameless fields only skip bits
                    let Some(name) = &field.name else {
                        continue;
                    };
                    if !first {
                        self.out.maybe_continue();
                    }
                    first = false;

                    write!(self.out, "{}:", name)?;
                    self.encode(field.ty, false)?;
                    write!(self.out, ",{},{};", field.bit_offset, field.bit_size)?;
                }
                write!(self.out, ";")?;
            }
            TypeKind::Enum { values } => {
                write!(self.out, "e")?;
                for (idx, value) in values.iter().enumerate() {
                    write!(self.out, "{}:{},", value.name, value.value)?;
                    if idx + 1 < values.len() {
                        self.out.maybe_continue();
                    }
                }
                write!(self.out, ";")?;
            }
            TypeKind::Pointer { target } => {
                write!(self.out, "*")?;
                self.encode(*target, false)?;
            }
            TypeKind::Function { returns } => {
                write!(self.out, "f")?;
                self.encode(returns.unwrap_or_else(|| types.void()), false)?;
            }
        }
        Ok(())
    }
}

/// `s`, `u` or `e` when `node` must be written as a cross-reference
fn cross_reference_letter(node: &TypeNode, full: bool) -> Option<char> {
    let letter = match node.kind {
        TypeKind::Record { .. } => 's',
        TypeKind::Union { .. } => 'u',
        TypeKind::Enum { .. } => 'e',
        _ => return None,
    };
    let named_reference = node.name.is_some() && !full;
    (named_reference || !node.is_complete()).then_some(letter)
}
