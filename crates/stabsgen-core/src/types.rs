//! Type graph handed over by the compiler front end
//!
//! Types live in a [`TypeArena`] and are referred to by [`TypeId`]. Two
//! references denote the same type only when their ids are equal; the
//! debug writer never compares types structurally.

use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::error::CoreError;

/// Stable index of a type node inside a [`TypeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a type got its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "name", rename_all = "snake_case")]
pub enum TypeName {
    /// `struct foo`, `union foo`, `enum foo`
    Tag(String),
    /// Named through a typedef declaration (including the built-in C types)
    Typedef(String),
}

impl TypeName {
    pub fn as_str(&self) -> &str {
        match self {
            TypeName::Tag(name) | TypeName::Typedef(name) => name,
        }
    }

    pub fn is_typedef(&self) -> bool {
        matches!(self, TypeName::Typedef(_))
    }
}

/// A named or anonymous member of a record or union
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// `None` for padding fields that only skip bits
    pub name: Option<String>,
    pub ty: TypeId,
    pub bit_offset: u64,
    pub bit_size: u64,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeId, bit_offset: u64, bit_size: u64) -> Self {
        Self {
            name: Some(name.into()),
            ty,
            bit_offset,
            bit_size,
        }
    }

    pub fn padding(ty: TypeId, bit_offset: u64, bit_size: u64) -> Self {
        Self {
            name: None,
            ty,
            bit_offset,
            bit_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    pub value: i64,
}

impl Enumerator {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Category of a type node, with whatever structure that category carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Void,
    Integer { min: i64, max: i64 },
    Real,
    Array { element: TypeId, length: u64 },
    Record { fields: Vec<Field> },
    Union { fields: Vec<Field> },
    Enum { values: Vec<Enumerator> },
    Pointer { target: TypeId },
    Function { returns: Option<TypeId> },
}

impl TypeKind {
    pub fn category(&self) -> &'static str {
        match self {
            TypeKind::Void => "void",
            TypeKind::Integer { .. } => "integer",
            TypeKind::Real => "real",
            TypeKind::Array { .. } => "array",
            TypeKind::Record { .. } => "record",
            TypeKind::Union { .. } => "union",
            TypeKind::Enum { .. } => "enum",
            TypeKind::Pointer { .. } => "pointer",
            TypeKind::Function { .. } => "function",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNode {
    #[serde(flatten)]
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<TypeName>,
    /// Size in bytes; `None` while the type is incomplete
    #[serde(default)]
    pub size: Option<u64>,
}

impl TypeNode {
    pub fn new(kind: TypeKind, size: Option<u64>) -> Self {
        Self {
            kind,
            name: None,
            size,
        }
    }

    pub fn named(mut self, name: TypeName) -> Self {
        self.name = Some(name);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.size.is_some()
    }
}

/// Owner of every type node of a compilation unit
///
/// The first three slots always hold the built-in `int`, `char` and `void`
/// types, in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TypeNode>", into = "Vec<TypeNode>")]
pub struct TypeArena {
    nodes: Vec<TypeNode>,
}

const INT: TypeId = TypeId(0);
const CHAR: TypeId = TypeId(1);
const VOID: TypeId = TypeId(2);
const BUILTIN_COUNT: usize = 3;

impl TypeArena {
    pub fn new() -> Self {
        let nodes = vec![
            TypeNode::new(
                TypeKind::Integer {
                    min: i32::MIN as i64,
                    max: i32::MAX as i64,
                },
                Some(4),
            )
            .named(TypeName::Typedef("int".to_string())),
            TypeNode::new(
                TypeKind::Integer {
                    min: i8::MIN as i64,
                    max: i8::MAX as i64,
                },
                Some(1),
            )
            .named(TypeName::Typedef("char".to_string())),
            TypeNode::new(TypeKind::Void, None).named(TypeName::Typedef("void".to_string())),
        ];
        Self { nodes }
    }

    pub fn int(&self) -> TypeId {
        INT
    }

    pub fn char(&self) -> TypeId {
        CHAR
    }

    pub fn void(&self) -> TypeId {
        VOID
    }

    pub fn add(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (TypeId(idx as u32), node))
    }

    pub fn integer(&mut self, name: &str, min: i64, max: i64, size: u64) -> TypeId {
        self.add(
            TypeNode::new(TypeKind::Integer { min, max }, Some(size))
                .named(TypeName::Typedef(name.to_string())),
        )
    }

    pub fn real(&mut self, name: &str, size: u64) -> TypeId {
        self.add(
            TypeNode::new(TypeKind::Real, Some(size)).named(TypeName::Typedef(name.to_string())),
        )
    }

    pub fn pointer_to(&mut self, target: TypeId) -> TypeId {
        self.add(TypeNode::new(TypeKind::Pointer { target }, Some(4)))
    }

    pub fn array_of(&mut self, element: TypeId, length: u64) -> TypeId {
        let size = self
            .get(element)
            .and_then(|node| node.size)
            .map(|elem| elem.saturating_mul(length));
        self.add(TypeNode::new(TypeKind::Array { element, length }, size))
    }

    pub fn function_returning(&mut self, returns: Option<TypeId>) -> TypeId {
        self.add(TypeNode::new(TypeKind::Function { returns }, None))
    }

    /// A complete record; pass `tag: None` for an anonymous struct
    pub fn record(&mut self, tag: Option<&str>, fields: Vec<Field>, size: u64) -> TypeId {
        self.aggregate(TypeKind::Record { fields }, tag, Some(size))
    }

    pub fn union(&mut self, tag: Option<&str>, fields: Vec<Field>, size: u64) -> TypeId {
        self.aggregate(TypeKind::Union { fields }, tag, Some(size))
    }

    pub fn enumeration(&mut self, tag: Option<&str>, values: Vec<Enumerator>) -> TypeId {
        self.aggregate(TypeKind::Enum { values }, tag, Some(4))
    }

    /// An incomplete `struct tag;` whose layout can be supplied later with
    /// [`TypeArena::complete`]
    pub fn declare_record(&mut self, tag: &str) -> TypeId {
        self.aggregate(TypeKind::Record { fields: Vec::new() }, Some(tag), None)
    }

    pub fn declare_union(&mut self, tag: &str) -> TypeId {
        self.aggregate(TypeKind::Union { fields: Vec::new() }, Some(tag), None)
    }

    pub fn declare_enum(&mut self, tag: &str) -> TypeId {
        self.aggregate(TypeKind::Enum { values: Vec::new() }, Some(tag), None)
    }

    /// Fill in the members and size of a previously declared record or union
    pub fn complete(&mut self, id: TypeId, fields: Vec<Field>, size: u64) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(CoreError::UnknownType(id))?;
        match &mut node.kind {
            TypeKind::Record { fields: slot } | TypeKind::Union { fields: slot } => {
                *slot = fields;
                node.size = Some(size);
                Ok(())
            }
            other => Err(CoreError::InvalidType(format!(
                "cannot complete {} type {} with fields",
                other.category(),
                id
            ))),
        }
    }

    /// Fill in the enumerators of a previously declared enum
    pub fn complete_enum(&mut self, id: TypeId, values: Vec<Enumerator>) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(CoreError::UnknownType(id))?;
        match &mut node.kind {
            TypeKind::Enum { values: slot } => {
                *slot = values;
                node.size = Some(4);
                Ok(())
            }
            other => Err(CoreError::InvalidType(format!(
                "cannot complete {} type {} with enumerators",
                other.category(),
                id
            ))),
        }
    }

    /// Name an anonymous node through a typedef, as in
    /// `typedef struct { ... } pair_t;`
    ///
    /// A tagged struct, union or enum keeps its tag; a typedef of it is a
    /// separate [`Declaration`](crate::Declaration) and never renames it.
    pub fn set_typedef_name(&mut self, id: TypeId, name: &str) -> Result<(), CoreError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(CoreError::UnknownType(id))?;
        if let Some(TypeName::Tag(tag)) = &node.name {
            return Err(CoreError::InvalidType(format!(
                "type {} is tagged '{}'; declare typedef '{}' separately",
                id, tag, name
            )));
        }
        node.name = Some(TypeName::Typedef(name.to_string()));
        Ok(())
    }

    fn aggregate(&mut self, kind: TypeKind, tag: Option<&str>, size: Option<u64>) -> TypeId {
        let mut node = TypeNode::new(kind, size);
        node.name = tag.map(|t| TypeName::Tag(t.to_string()));
        self.add(node)
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

/// # Panics
///
/// Panics when `id` does not belong to this arena; use [`TypeArena::get`]
/// for ids that come from outside.
impl Index<TypeId> for TypeArena {
    type Output = TypeNode;

    fn index(&self, id: TypeId) -> &Self::Output {
        &self.nodes[id.index()]
    }
}

impl TryFrom<Vec<TypeNode>> for TypeArena {
    type Error = CoreError;

    fn try_from(nodes: Vec<TypeNode>) -> Result<Self, Self::Error> {
        if nodes.len() < BUILTIN_COUNT {
            return Err(CoreError::InvalidType(format!(
                "type table has {} entries, expected the int, char and void built-ins first",
                nodes.len()
            )));
        }
        let builtins_ok = matches!(nodes[INT.index()].kind, TypeKind::Integer { .. })
            && matches!(nodes[CHAR.index()].kind, TypeKind::Integer { .. })
            && matches!(nodes[VOID.index()].kind, TypeKind::Void);
        if !builtins_ok {
            return Err(CoreError::InvalidType(
                "type table must start with int, char and void".to_string(),
            ));
        }
        for builtin in [INT, CHAR, VOID] {
            let named = nodes[builtin.index()]
                .name
                .as_ref()
                .is_some_and(TypeName::is_typedef);
            if !named {
                return Err(CoreError::InvalidType(format!(
                    "built-in type {} must carry its typedef name",
                    builtin
                )));
            }
        }
        Ok(Self { nodes })
    }
}

impl From<TypeArena> for Vec<TypeNode> {
    fn from(arena: TypeArena) -> Self {
        arena.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_come_first() {
        let arena = TypeArena::new();
        assert_eq!(arena.int().index(), 0);
        assert_eq!(arena.char().index(), 1);
        assert_eq!(arena.void().index(), 2);
        assert_eq!(arena[arena.void()].kind, TypeKind::Void);
        assert_eq!(
            arena[arena.int()].name.as_ref().map(TypeName::as_str),
            Some("int")
        );
    }

    #[test]
    fn test_self_referential_record() {
        let mut arena = TypeArena::new();
        let node = arena.declare_record("node");
        assert!(!arena[node].is_complete());

        let next = arena.pointer_to(node);
        let int = arena.int();
        arena
            .complete(
                node,
                vec![Field::new("value", int, 0, 32), Field::new("next", next, 32, 32)],
                8,
            )
            .unwrap();

        assert!(arena[node].is_complete());
        match &arena[node].kind {
            TypeKind::Record { fields } => assert_eq!(fields[1].ty, next),
            other => panic!("Expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_rejects_scalar() {
        let mut arena = TypeArena::new();
        let int = arena.int();
        let err = arena.complete(int, Vec::new(), 4).unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_array_size_from_element() {
        let mut arena = TypeArena::new();
        let int = arena.int();
        let arr = arena.array_of(int, 10);
        assert_eq!(arena[arr].size, Some(40));
    }

    #[test]
    fn test_array_size_saturates() {
        let mut arena = TypeArena::new();
        let int = arena.int();
        let huge = arena.array_of(int, u64::MAX);
        assert_eq!(arena[huge].size, Some(u64::MAX));
    }

    #[test]
    fn test_typedef_name_for_anonymous_record() {
        let mut arena = TypeArena::new();
        let int = arena.int();
        let pair = arena.record(None, vec![Field::new("a", int, 0, 32)], 4);
        arena.set_typedef_name(pair, "pair_t").unwrap();
        assert_eq!(arena[pair].name, Some(TypeName::Typedef("pair_t".to_string())));
    }

    #[test]
    fn test_typedef_name_keeps_tag() {
        let mut arena = TypeArena::new();
        let node = arena.declare_record("node");
        let err = arena.set_typedef_name(node, "node_t").unwrap_err();
        assert!(matches!(err, CoreError::InvalidType(_)));
        assert_eq!(arena[node].name, Some(TypeName::Tag("node".to_string())));
    }

    #[test]
    fn test_enum_declared_then_completed() {
        let mut arena = TypeArena::new();
        let color = arena.declare_enum("color");
        assert!(!arena[color].is_complete());

        arena
            .complete_enum(color, vec![Enumerator::new("red", 0)])
            .unwrap();
        assert_eq!(arena[color].size, Some(4));

        let int = arena.int();
        assert!(arena.complete_enum(int, Vec::new()).is_err());
    }

    #[test]
    #[should_panic]
    fn test_index_outside_arena_panics() {
        let arena = TypeArena::new();
        let _ = &arena[TypeId::from_raw(3)];
    }

    #[test]
    fn test_arena_json_requires_builtin_names() {
        let json = r#"[
            {"kind": "integer", "min": -2147483648, "max": 2147483647, "size": 4},
            {"kind": "integer", "min": -128, "max": 127, "size": 1,
             "name": {"by": "typedef", "name": "char"}},
            {"kind": "void", "name": {"by": "typedef", "name": "void"}}
        ]"#;
        let err = serde_json::from_str::<TypeArena>(json).unwrap_err();
        assert!(err.to_string().contains("typedef name"));
    }

    #[test]
    fn test_arena_json_requires_builtins() {
        let json = r#"[{"kind": "void"}]"#;
        let result: Result<TypeArena, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let arena = TypeArena::new();
        let text = serde_json::to_string(&arena).unwrap();
        let back: TypeArena = serde_json::from_str(&text).unwrap();
        assert_eq!(back, arena);
    }
}
