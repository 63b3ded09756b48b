//! Named bindings produced by the front end and placed by the back end

use serde::{Deserialize, Serialize};

use crate::types::TypeId;

/// Where a declaration's value lives at run time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "in", rename_all = "snake_case")]
pub enum Location {
    /// Static storage at the given assembler symbol
    Static { symbol: String },
    /// Offset from the frame pointer, in bytes
    Frame { offset: i64 },
    /// Hard register number as the register allocator sees it
    Register { regno: u32 },
    /// Optimized away entirely
    Eliminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    /// Visible outside the translation unit
    pub public: bool,
    /// Defined in some other translation unit
    #[serde(default)]
    pub external: bool,
    /// Assembler symbol of the entry point, when code was emitted
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDecl {
    pub public: bool,
    #[serde(default)]
    pub external: bool,
    /// Lives for the whole program (file scope) rather than being a
    /// block-local `static`
    #[serde(default = "default_true")]
    pub permanent: bool,
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub volatile: bool,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Byte offset of the argument in the incoming argument block
    pub arg_offset: i64,
    /// Where the function body keeps the parameter
    pub location: Location,
    /// Bytes the caller passes (after default promotions)
    pub passed_size: u32,
    /// Bytes of the declared parameter type
    pub stored_size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum DeclKind {
    EnumConstant,
    Function(FunctionDecl),
    Typedef,
    Parameter(ParamDecl),
    Variable(VarDecl),
}

/// A named binding: variable, function, parameter, typedef or enum constant
///
/// For functions `ty` is the function type; for typedefs it is the aliased
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub ty: TypeId,
    #[serde(flatten)]
    pub kind: DeclKind,
}

fn default_true() -> bool {
    true
}

impl Declaration {
    pub fn function(name: impl Into<String>, ty: TypeId, public: bool, address: &str) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: DeclKind::Function(FunctionDecl {
                public,
                external: false,
                address: Some(address.to_string()),
            }),
        }
    }

    pub fn typedef(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: DeclKind::Typedef,
        }
    }

    pub fn enum_constant(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: DeclKind::EnumConstant,
        }
    }

    /// A file-scope variable in static storage
    pub fn global(name: impl Into<String>, ty: TypeId, public: bool, symbol: &str) -> Self {
        Self::variable(
            name,
            ty,
            VarDecl {
                public,
                external: false,
                permanent: true,
                initialized: false,
                read_only: false,
                volatile: false,
                location: Location::Static {
                    symbol: symbol.to_string(),
                },
            },
        )
    }

    /// An automatic variable living in the stack frame
    pub fn auto(name: impl Into<String>, ty: TypeId, offset: i64) -> Self {
        Self::variable(name, ty, VarDecl::local(Location::Frame { offset }))
    }

    /// A local variable kept in a hard register
    pub fn register(name: impl Into<String>, ty: TypeId, regno: u32) -> Self {
        Self::variable(name, ty, VarDecl::local(Location::Register { regno }))
    }

    pub fn variable(name: impl Into<String>, ty: TypeId, var: VarDecl) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: DeclKind::Variable(var),
        }
    }

    pub fn parameter(name: impl Into<String>, ty: TypeId, arg_offset: i64, location: Location) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: DeclKind::Parameter(ParamDecl {
                arg_offset,
                location,
                passed_size: 4,
                stored_size: 4,
            }),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            DeclKind::EnumConstant => "enum constant",
            DeclKind::Function(_) => "function",
            DeclKind::Typedef => "typedef",
            DeclKind::Parameter(_) => "parameter",
            DeclKind::Variable(_) => "variable",
        }
    }
}

impl VarDecl {
    /// A non-public, block-scoped variable at `location`
    pub fn local(location: Location) -> Self {
        Self {
            public: false,
            external: false,
            permanent: false,
            initialized: false,
            read_only: false,
            volatile: false,
            location,
        }
    }

    pub fn with_initializer(mut self, read_only: bool) -> Self {
        self.initialized = true;
        self.read_only = read_only;
        self
    }
}
