//! Test fixtures for stabsgen testing
//!
//! Small compilation units that each exercise one corner of the writer, plus
//! helpers that put them on disk for the CLI tests

use serde_json::json;
use stabsgen_core::{
    Block, CompilationUnit, Declaration, Enumerator, Field, FunctionDef, Location, Stmt, TypeArena,
    UnitBuilder,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Test fixture categories
pub enum FixtureType {
    LinkedList,
    NestedScopes,
    WideStruct,
    HandWritten,
}

/// Main test fixtures provider
pub struct TestFixtures {
    temp_dir: Option<tempfile::TempDir>,
}

impl Default for TestFixtures {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixtures {
    pub fn new() -> Self {
        Self { temp_dir: None }
    }

    /// Create a temporary directory holding `unit.json` for the fixture
    pub fn setup(&mut self, fixture_type: FixtureType) -> PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        let unit_json = match fixture_type {
            FixtureType::LinkedList => linked_list_unit().to_json().unwrap(),
            FixtureType::NestedScopes => nested_scopes_unit().to_json().unwrap(),
            FixtureType::WideStruct => wide_struct_unit().to_json().unwrap(),
            FixtureType::HandWritten => {
                serde_json::to_string_pretty(&hand_written_unit_json()).unwrap()
            }
        };
        fs::write(path.join("unit.json"), unit_json).unwrap();

        self.temp_dir = Some(dir);
        path
    }

    /// Write a `stabsgen.toml` next to the fixture
    pub fn write_config(&self, base: &Path, toml: &str) -> PathBuf {
        let path = base.join("stabsgen.toml");
        fs::write(&path, toml).unwrap();
        path
    }
}

/// ```c
/// struct node { int value; struct node *next; };
/// typedef struct node node_t;
/// struct node *head;
/// static int length(struct node *list) { int n; { struct node *p; } }
/// ```
pub fn linked_list_unit() -> CompilationUnit {
    let mut types = TypeArena::new();
    let int = types.int();
    let node = types.declare_record("node");
    let node_ptr = types.pointer_to(node);
    types
        .complete(
            node,
            vec![
                Field::new("value", int, 0, 32),
                Field::new("next", node_ptr, 32, 32),
            ],
            8,
        )
        .unwrap();
    let length_ty = types.function_returning(Some(int));

    let length = FunctionDef::new(Declaration::function("length", length_ty, false, "_length"))
        .param(Declaration::parameter(
            "list",
            node_ptr,
            8,
            Location::Register { regno: 9 },
        ))
        .body(
            Block::new()
                .var(Declaration::auto("n", int, -4))
                .nest(Block::new().var(Declaration::register("p", node_ptr, 10))),
        );

    UnitBuilder::new("list.c", types)
        .tag("node", node)
        .symbol(Declaration::typedef("node_t", node))
        .symbol(Declaration::global("head", node_ptr, true, "_head"))
        .function(length)
        .build()
}

/// ```c
/// int main() {
///     int i;
///     while (1) { int j; if (j) { int k; } else { char c; } }
/// }
/// ```
pub fn nested_scopes_unit() -> CompilationUnit {
    let mut types = TypeArena::new();
    let int = types.int();
    let chr = types.char();
    let main_ty = types.function_returning(Some(int));

    let then = Block::new().var(Declaration::auto("k", int, -12));
    let otherwise = Block::new().var(Declaration::auto("c", chr, -13));
    let loop_body = Block::new()
        .var(Declaration::auto("j", int, -8))
        .stmt(Stmt::If {
            then: vec![Stmt::Scope(then)],
            otherwise: vec![Stmt::Scope(otherwise)],
        });
    let body = Block::new()
        .var(Declaration::auto("i", int, -4))
        .stmt(Stmt::Loop {
            body: vec![Stmt::Scope(loop_body)],
        });

    UnitBuilder::new("main.c", types)
        .function(FunctionDef::new(Declaration::function("main", main_ty, true, "_main")).body(body))
        .build()
}

/// A struct and an enum whose descriptions are long enough to be continued
pub fn wide_struct_unit() -> CompilationUnit {
    let mut types = TypeArena::new();
    let int = types.int();
    let fields = (0..6)
        .map(|i| Field::new(format!("configuration_field_{}", i), int, i * 32, 32))
        .collect();
    let settings = types.record(Some("settings"), fields, 24);
    let values = (0..8)
        .map(|i| Enumerator::new(format!("OPTION_NUMBER_{}", i), i))
        .collect();
    let option = types.enumeration(Some("option"), values);

    UnitBuilder::new("wide.c", types)
        .tag("settings", settings)
        .tag("option", option)
        .symbol(Declaration::global("current", settings, true, "_current"))
        .build()
}

/// A unit in its on-disk form, written out by hand the way a front end
/// would produce it
///
/// ```c
/// enum color { RED, GREEN };
/// extern int errno;
/// static enum color favorite = GREEN;
/// ```
pub fn hand_written_unit_json() -> serde_json::Value {
    json!({
        "source_file": "color.c",
        "types": [
            {"kind": "integer", "min": -2147483648i64, "max": 2147483647, "size": 4,
             "name": {"by": "typedef", "name": "int"}},
            {"kind": "integer", "min": -128, "max": 127, "size": 1,
             "name": {"by": "typedef", "name": "char"}},
            {"kind": "void", "name": {"by": "typedef", "name": "void"}},
            {"kind": "enum", "size": 4, "name": {"by": "tag", "name": "color"},
             "values": [{"name": "RED", "value": 0}, {"name": "GREEN", "value": 1}]}
        ],
        "tags": [{"name": "color", "ty": 3}],
        "items": [
            {"item": "symbol", "name": "RED", "ty": 3, "decl": "enum_constant"},
            {"item": "symbol", "name": "GREEN", "ty": 3, "decl": "enum_constant"},
            {"item": "symbol", "name": "errno", "ty": 0, "decl": "variable",
             "public": true, "external": true,
             "location": {"in": "static", "symbol": "_errno"}},
            {"item": "symbol", "name": "favorite", "ty": 3, "decl": "variable",
             "public": false, "initialized": true,
             "location": {"in": "static", "symbol": "_favorite"}}
        ]
    })
}
