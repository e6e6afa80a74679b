//! Language-level guarantees checked end to end through the public API.

use jmes_lang::{DataNode, Expr, NodeKind, Value, compile, search};
use serde_json::{Value as Json, json};

fn run(expr: &str, data: &Json) -> Json {
    search(expr, data).unwrap()
}

// ============================================================================
// Printing and reparsing
// ============================================================================

const EXPRESSIONS: &[&str] = &[
    "foo",
    "foo.bar.baz",
    "\"with space\".x",
    "foo[0].bar",
    "foo[-1]",
    "foo[1:2]",
    "[::-1].a",
    "foo[*].bar",
    "foo[*].bar[0]",
    "*.bar",
    "foo.*.bar",
    "foo[].bar",
    "foo[][]",
    "foo[?a == `1`].b",
    "people[?age > `20`].{name: name, age: age}",
    "foo.[a, b.c]",
    "{a: b, \"c d\": e}",
    "a || b && c",
    "(a || b) && c",
    "a | b | c",
    "foo[*].bar | [0]",
    "a[*].b == `1`",
    "!a.b",
    "!(a.b)",
    "length(@) > `2` && !c",
    "sort_by(people, &age)[0]",
    "not_null(a, b, `null`)",
    "'raw'",
    "`{\"a\": [1, 2.5, true]}`",
    "@",
];

#[test]
fn test_printed_form_reparses_to_same_tree() {
    for text in EXPRESSIONS {
        let original = compile(text).unwrap();
        let printed = original.to_string();
        let reparsed = compile(&printed)
            .unwrap_or_else(|e| panic!("{:?} printed as {:?}: {}", text, printed, e));
        assert_eq!(reparsed.as_ast(), original.as_ast(), "{:?} printed as {:?}", text, printed);
    }
}

#[test]
fn test_printed_form_is_stable() {
    for text in EXPRESSIONS {
        let once = compile(text).unwrap().to_string();
        let twice = compile(&once).unwrap().to_string();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_built_trees_print() {
    let expr = Expr::pipe(
        Expr::projection(Expr::field("foo"), Expr::field("bar")),
        Expr::Index(0),
    );
    assert_eq!(expr.to_string(), "foo[*].bar | [0]");
}

// ============================================================================
// Evaluation guarantees
// ============================================================================

#[test]
fn test_evaluation_is_pure() {
    let data = json!({"a": [{"b": 1}, {"b": 2}], "c": {"d": "x"}});
    let before = data.clone();
    let expr = compile("a[*].b | sort(@) | reverse(@)").unwrap();
    let first = expr.search(&data).unwrap();
    let second = expr.search(&data).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, json!([2, 1]));
    assert_eq!(data, before);
}

#[test]
fn test_missing_data_is_null_not_error() {
    let data = json!({"a": {"b": 1}});
    for expr in ["x", "x.y.z", "a.b.c", "a[0]", "x[*].y", "x[?y].z", "x[]", "x.*"] {
        assert_eq!(run(expr, &data), Json::Null, "{}", expr);
    }
}

#[test]
fn test_projection_drops_nulls_but_multi_select_keeps_them() {
    let data = json!({"items": [{"id": 1}, {"id": null}, {}, {"id": 4}]});
    assert_eq!(run("items[*].id", &data), json!([1, 4]));
    assert_eq!(run("items[*].[id]", &data), json!([[1], [null], [null], [4]]));
}

#[test]
fn test_pipe_resets_projection() {
    let data = json!({"a": [[1, 2], [3, 4]]});
    assert_eq!(run("a[*][0]", &data), json!([1, 3]));
    assert_eq!(run("a[*] | [0]", &data), json!([1, 2]));
}

#[test]
fn test_slices_follow_python() {
    let data = json!([0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(run("[0:5]", &data), json!([0, 1, 2, 3, 4]));
    assert_eq!(run("[5:]", &data), json!([5, 6, 7, 8, 9]));
    assert_eq!(run("[::3]", &data), json!([0, 3, 6, 9]));
    assert_eq!(run("[-3:]", &data), json!([7, 8, 9]));
    assert_eq!(run("[8:2:-2]", &data), json!([8, 6, 4]));
    assert_eq!(run("[-100:2]", &data), json!([0, 1]));
}

#[test]
fn test_truthiness_in_filters() {
    let data = json!({"v": [
        {"k": "null", "x": null},
        {"k": "false", "x": false},
        {"k": "zero", "x": 0},
        {"k": "empty-string", "x": ""},
        {"k": "string", "x": "s"},
        {"k": "empty-array", "x": []},
        {"k": "array", "x": [0]},
        {"k": "empty-object", "x": {}},
        {"k": "object", "x": {"a": null}}
    ]});
    assert_eq!(
        run("v[?x].k", &data),
        json!(["zero", "string", "array", "object"])
    );
}

#[test]
fn test_logical_operators_return_operands() {
    let data = json!({"zero": 0, "empty": [], "s": "x"});
    assert_eq!(run("zero && s", &data), json!("x"));
    assert_eq!(run("empty && s", &data), json!([]));
    assert_eq!(run("empty || zero", &data), json!(0));
    assert_eq!(run("missing || empty", &data), json!([]));
}

#[test]
fn test_syntax_error_positions() {
    for (text, position) in [("foo[", 3), ("foo.", 4), ("a ||", 4), ("[?a", 0)] {
        let err = compile(text).unwrap_err();
        assert_eq!(err.position, position, "{}", text);
    }
}

// ============================================================================
// Custom data trees
// ============================================================================

/// A typed record tree, standing in for an application's own model.
enum Record {
    Id(i64),
    Name(String),
    List(Vec<Record>),
    Fields(Vec<(&'static str, Record)>),
}

impl DataNode for Record {
    fn kind(&self) -> NodeKind {
        match self {
            Record::Id(_) => NodeKind::Number,
            Record::Name(_) => NodeKind::String,
            Record::List(_) => NodeKind::Array,
            Record::Fields(_) => NodeKind::Object,
        }
    }

    fn get_field(&self, name: &str) -> Option<&Self> {
        match self {
            Record::Fields(fields) => fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        match self {
            Record::List(items) => items.get(index),
            _ => None,
        }
    }

    fn length(&self) -> usize {
        match self {
            Record::Name(s) => s.chars().count(),
            Record::List(items) => items.len(),
            Record::Fields(fields) => fields.len(),
            Record::Id(_) => 0,
        }
    }

    fn iterate(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        match self {
            Record::List(items) => Box::new(items.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_> {
        match self {
            Record::Fields(fields) => Box::new(fields.iter().map(|(k, v)| (*k, v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn as_bool(&self) -> Option<bool> {
        None
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Record::Id(n) => Some(*n),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        self.as_i64().map(|n| n as f64)
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Record::Name(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

fn user(id: i64, name: &str) -> Record {
    Record::Fields(vec![("name", Record::Name(name.to_string())), ("id", Record::Id(id))])
}

#[test]
fn test_evaluates_custom_nodes() {
    let data = Record::Fields(vec![(
        "users",
        Record::List(vec![user(3, "c"), user(1, "a"), user(2, "b")]),
    )]);

    let result = compile("sort_by(users, &id)[*].name").unwrap().evaluate_node(&data).unwrap();
    assert_eq!(result, Value::from(json!(["a", "b", "c"])));

    let first = compile("users[0]").unwrap().evaluate_node(&data).unwrap();
    let keys: Vec<&String> = first.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["name", "id"]);
}

/// A tree that can only be looked into, never walked as a whole.
enum Sealed {
    Leaf(i64),
    Branch(Vec<(&'static str, Sealed)>),
}

impl DataNode for Sealed {
    fn kind(&self) -> NodeKind {
        match self {
            Sealed::Leaf(_) => NodeKind::Number,
            Sealed::Branch(_) => NodeKind::Object,
        }
    }

    fn get_field(&self, name: &str) -> Option<&Self> {
        match self {
            Sealed::Branch(fields) => fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v),
            Sealed::Leaf(_) => None,
        }
    }

    fn get_index(&self, _index: usize) -> Option<&Self> {
        None
    }

    fn length(&self) -> usize {
        match self {
            Sealed::Branch(fields) => fields.len(),
            Sealed::Leaf(_) => 0,
        }
    }

    fn iterate(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(std::iter::empty())
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_> {
        panic!("whole object walked")
    }

    fn as_bool(&self) -> Option<bool> {
        None
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Sealed::Leaf(n) => Some(*n),
            Sealed::Branch(_) => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        self.as_i64().map(|n| n as f64)
    }

    fn as_str(&self) -> Option<&str> {
        None
    }
}

#[test]
fn test_paths_only_read_the_nodes_they_visit() {
    let data = Sealed::Branch(vec![
        ("noise", Sealed::Branch(vec![("x", Sealed::Leaf(0))])),
        (
            "a",
            Sealed::Branch(vec![("b", Sealed::Branch(vec![("c", Sealed::Leaf(3))]))]),
        ),
    ]);

    for (text, expected) in [
        ("a.b.c", Value::Integer(3)),
        ("a.b.missing", Value::Null),
        ("a.b.c == `3`", Value::Boolean(true)),
        ("x || a.b.c", Value::Integer(3)),
        ("a.b && a.b.c", Value::Integer(3)),
        ("a.b | @.c", Value::Integer(3)),
        ("[a.b.c, noise.x]", Value::from(vec![Value::Integer(3), Value::Integer(0)])),
        ("!a", Value::Boolean(false)),
    ] {
        let result = compile(text).unwrap().evaluate_node(&data).unwrap();
        assert_eq!(result, expected, "{}", text);
    }
}

#[test]
fn test_wide_objects_keep_order_and_lookups() {
    let mut wide = serde_json::Map::new();
    for i in 0..20_000 {
        wide.insert(format!("k{}", i), json!(i));
    }
    let data = json!({"wide": Json::Object(wide)});
    assert_eq!(run("wide.k19999", &data), json!(19999));
    assert_eq!(run("length(keys(wide))", &data), json!(20000));
    assert_eq!(run("keys(wide)[0]", &data), json!("k0"));
}
