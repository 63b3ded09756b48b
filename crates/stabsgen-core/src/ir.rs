//! Compilation unit handed to the debug symbol writer
//!
//! A unit is the type arena, the file-scope struct/union/enum tags, and the
//! top-level items (symbols and function definitions) in source order.
//! Function bodies are reduced to the statement shapes that matter for
//! scoping: compound statements, loops, conditionals and binding blocks.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::decl::Declaration;
use crate::error::CoreError;
use crate::types::{TypeArena, TypeId};

/// A struct, union or enum tag declared in some scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: Option<String>,
    pub ty: TypeId,
}

impl Tag {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }
}

/// A binding contour: the tags and variables it declares and the statements
/// it encloses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub vars: Vec<Declaration>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn var(mut self, decl: Declaration) -> Self {
        self.vars.push(decl);
        self
    }

    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.body.push(stmt);
        self
    }

    /// Append a nested binding block
    pub fn nest(self, inner: Block) -> Self {
        self.stmt(Stmt::Scope(inner))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Compound { body: Vec<Stmt> },
    Loop { body: Vec<Stmt> },
    If {
        then: Vec<Stmt>,
        #[serde(default)]
        otherwise: Vec<Stmt>,
    },
    Scope(Block),
}

/// A function with a body in this unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub decl: Declaration,
    #[serde(default)]
    pub params: Vec<Declaration>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl FunctionDef {
    pub fn new(decl: Declaration) -> Self {
        Self {
            decl,
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn param(mut self, param: Declaration) -> Self {
        self.params.push(param);
        self
    }

    /// Set the outermost binding block of the body
    pub fn body(mut self, block: Block) -> Self {
        self.body = vec![Stmt::Scope(block)];
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    Symbol(Declaration),
    Function(FunctionDef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub source_file: String,
    pub types: TypeArena,
    /// Tags declared at file scope
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl CompilationUnit {
    pub fn new(source_file: impl Into<String>, types: TypeArena) -> Self {
        Self {
            source_file: source_file.into(),
            types,
            tags: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        let unit = Self::from_json(&text)?;
        tracing::debug!(
            path = %path.display(),
            types = unit.types.len(),
            items = unit.items.len(),
            "loaded compilation unit"
        );
        Ok(unit)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(def) => Some(def),
            Item::Symbol(_) => None,
        })
    }
}

/// Builder pattern for constructing compilation units
pub struct UnitBuilder {
    unit: CompilationUnit,
}

impl UnitBuilder {
    pub fn new(source_file: impl Into<String>, types: TypeArena) -> Self {
        Self {
            unit: CompilationUnit::new(source_file, types),
        }
    }

    pub fn tag(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        self.unit.tags.push(Tag::new(name, ty));
        self
    }

    pub fn symbol(mut self, decl: Declaration) -> Self {
        self.unit.items.push(Item::Symbol(decl));
        self
    }

    pub fn function(mut self, def: FunctionDef) -> Self {
        self.unit.items.push(Item::Function(def));
        self
    }

    pub fn build(self) -> CompilationUnit {
        self.unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Location;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unit_builder() {
        let mut types = TypeArena::new();
        let int = types.int();
        let fn_ty = types.function_returning(Some(int));

        let main = FunctionDef::new(Declaration::function("main", fn_ty, true, "_main"))
            .param(Declaration::parameter(
                "argc",
                int,
                8,
                Location::Frame { offset: 8 },
            ))
            .body(Block::new().var(Declaration::auto("i", int, -4)));

        let unit = UnitBuilder::new("main.c", types)
            .symbol(Declaration::global("total", int, true, "_total"))
            .function(main)
            .build();

        assert_eq!(unit.items.len(), 2);
        assert_eq!(unit.functions().count(), 1);
        let def = unit.functions().next().unwrap();
        assert_eq!(def.params.len(), 1);
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn test_unit_json_roundtrip() {
        let mut types = TypeArena::new();
        let int = types.int();
        let point = types.record(
            Some("point"),
            vec![
                crate::types::Field::new("x", int, 0, 32),
                crate::types::Field::new("y", int, 32, 32),
            ],
            8,
        );
        let unit = UnitBuilder::new("point.c", types)
            .tag("point", point)
            .symbol(Declaration::global("origin", point, false, "_origin"))
            .build();

        let json = unit.to_json().unwrap();
        let back = CompilationUnit::from_json(&json).unwrap();
        assert_eq!(back, unit);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CompilationUnit::load(Path::new("/nonexistent/unit.json")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
