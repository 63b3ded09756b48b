//! Input representation for the stabsgen debug symbol writer: the type
//! graph, declarations, lexical scopes and target configuration

pub mod config;
pub mod decl;
pub mod error;
pub mod ir;
pub mod types;

pub use config::StabsConfig;
pub use decl::{DeclKind, Declaration, Location};
pub use error::CoreError;
pub use ir::{Block, CompilationUnit, FunctionDef, Item, Stmt, Tag, UnitBuilder};
pub use types::{Enumerator, Field, TypeArena, TypeId, TypeKind, TypeName, TypeNode};
