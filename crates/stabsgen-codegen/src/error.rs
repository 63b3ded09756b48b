//! Error types for symbol table generation
//!
//! Everything except [`CodegenError::Fmt`] is an invariant violation: the
//! unit handed over by the front end has a shape the writer cannot describe.
//! Generation stops at the first one; there is no partial output.

use stabsgen_core::TypeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Invalid IR: {category} type {ty} must be named to be cross-referenced")]
    UnnamedType { ty: TypeId, category: &'static str },

    #[error("Invalid IR: type {0} has no typedef name")]
    MissingTypedefName(TypeId),

    #[error("Invalid IR: parameter '{0}' must be emitted through its function's parameter list")]
    ParameterOutsideParameterList(String),

    #[error("Invalid IR: '{name}' in a parameter list is a {kind}, not a parameter")]
    NotAParameter { name: String, kind: &'static str },

    #[error("Invalid IR: function '{name}' has non-function type {ty}")]
    NotAFunctionType { name: String, ty: TypeId },

    #[error("Invalid IR: real type {0} has no size")]
    UnsizedReal(TypeId),

    #[error("Invalid IR: array type {ty} has {length} elements, more than a stabs range can hold")]
    ArrayTooLong { ty: TypeId, length: u64 },

    #[error("Block numbers exhausted after block {last}")]
    BlockNumbersExhausted { last: u32 },

    #[error("Invalid IR: unknown type {0}")]
    UnknownType(TypeId),

    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl CodegenError {
    /// True for errors caused by the shape of the input rather than by the
    /// output sink
    pub fn is_invariant_violation(&self) -> bool {
        !matches!(self, CodegenError::Fmt(_))
    }
}
