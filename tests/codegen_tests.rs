use jmes_lang::{
    CodegenConfig, CodegenError, NullCheckStyle,
    codegen::generate_function,
    compile, search,
};
use serde_json::{Value as Json, json};

fn generate(expr: &str, config: &CodegenConfig) -> String {
    compile(expr).unwrap().generate_code(config).unwrap()
}

fn generate_error(expr: &str, config: &CodegenConfig) -> CodegenError {
    compile(expr).unwrap().generate_code(config).unwrap_err()
}

fn coalescing() -> CodegenConfig {
    CodegenConfig::default().with_style(NullCheckStyle::NullCoalescing)
}

// The accessors below are the generator's output for the expression named
// above each one, pasted verbatim. The string tests pin the text; the
// behavior tests check the compiled accessors select what `search` does.

const FIELD_CHAIN: &str = r#"if let Some(ref jp_0) = input.get("foo").cloned().filter(|v| !v.is_null()) { jp_0.get("bar").cloned() } else { None }"#;

// foo.bar
fn field_chain(input: &Json) -> Option<Json> {
    if let Some(ref jp_0) = input.get("foo").cloned().filter(|v| !v.is_null()) { jp_0.get("bar").cloned() } else { None }
}

const FIELD_CHAIN_COALESCING: &str = r#"input.get("foo").cloned().filter(|v| !v.is_null()).as_ref().and_then(|jp_0| jp_0.get("bar").cloned())"#;

// foo.bar, null-coalescing
fn field_chain_coalescing(input: &Json) -> Option<Json> {
    input.get("foo").cloned().filter(|v| !v.is_null()).as_ref().and_then(|jp_0| jp_0.get("bar").cloned())
}

const PROJECTION: &str = r#"if let Some(serde_json::Value::Array(ref jp_0)) = input.get("foo").cloned() { let mut jp_2 = Vec::new(); for jp_1 in jp_0.iter() { if let Some(jp_3) = jp_1.get("bar").cloned() { if !jp_3.is_null() { jp_2.push(jp_3); } } } Some(serde_json::Value::Array(jp_2)) } else { None }"#;

// foo[*].bar
fn projection(input: &Json) -> Option<Json> {
    if let Some(serde_json::Value::Array(ref jp_0)) = input.get("foo").cloned() { let mut jp_2 = Vec::new(); for jp_1 in jp_0.iter() { if let Some(jp_3) = jp_1.get("bar").cloned() { if !jp_3.is_null() { jp_2.push(jp_3); } } } Some(serde_json::Value::Array(jp_2)) } else { None }
}

const PROJECTION_COALESCING: &str = r#"input.get("foo").cloned().as_ref().and_then(|v| v.as_array()).map(|jp_0| serde_json::Value::Array(jp_0.iter().filter_map(|jp_1| jp_1.get("bar").cloned()).filter(|v| !v.is_null()).collect()))"#;

// foo[*].bar, null-coalescing
fn projection_coalescing(input: &Json) -> Option<Json> {
    input.get("foo").cloned().as_ref().and_then(|v| v.as_array()).map(|jp_0| serde_json::Value::Array(jp_0.iter().filter_map(|jp_1| jp_1.get("bar").cloned()).filter(|v| !v.is_null()).collect()))
}

const FILTER: &str = r#"if let Some(serde_json::Value::Array(ref jp_0)) = input.get("people").cloned() { let mut jp_2 = Vec::new(); for jp_1 in jp_0.iter() { if jmes_lang::runtime::is_truthy(&jmes_lang::runtime::compare(">", jp_1.get("age").cloned(), Some(serde_json::json!(20i64)))) { if let Some(jp_3) = jp_1.get("name").cloned() { if !jp_3.is_null() { jp_2.push(jp_3); } } } } Some(serde_json::Value::Array(jp_2)) } else { None }"#;

// people[?age > `20`].name
fn filter(input: &Json) -> Option<Json> {
    if let Some(serde_json::Value::Array(ref jp_0)) = input.get("people").cloned() { let mut jp_2 = Vec::new(); for jp_1 in jp_0.iter() { if jmes_lang::runtime::is_truthy(&jmes_lang::runtime::compare(">", jp_1.get("age").cloned(), Some(serde_json::json!(20i64)))) { if let Some(jp_3) = jp_1.get("name").cloned() { if !jp_3.is_null() { jp_2.push(jp_3); } } } } Some(serde_json::Value::Array(jp_2)) } else { None }
}

const OR: &str = r#"{ let jp_0 = input.get("a").cloned(); if jmes_lang::runtime::is_truthy(&jp_0) { jp_0 } else { input.get("b").cloned() } }"#;

// a || b
fn or(input: &Json) -> Option<Json> {
    { let jp_0 = input.get("a").cloned(); if jmes_lang::runtime::is_truthy(&jp_0) { jp_0 } else { input.get("b").cloned() } }
}

const OR_COALESCING: &str = r#"input.get("a").cloned().filter(jmes_lang::runtime::is_truthy_value).or_else(|| input.get("b").cloned())"#;

// a || b, null-coalescing
fn or_coalescing(input: &Json) -> Option<Json> {
    input.get("a").cloned().filter(jmes_lang::runtime::is_truthy_value).or_else(|| input.get("b").cloned())
}

const PIPE: &str = r#"{ let jp_0 = &input.get("foo").cloned().unwrap_or(serde_json::Value::Null); jmes_lang::runtime::index(jp_0, 0) }"#;

// foo | [0]
fn pipe(input: &Json) -> Option<Json> {
    { let jp_0 = &input.get("foo").cloned().unwrap_or(serde_json::Value::Null); jmes_lang::runtime::index(jp_0, 0) }
}

const HASH: &str = r#"if input.is_null() { None } else { let jp_0 = input; let mut jp_1 = serde_json::Map::new(); jp_1.insert("n".to_string(), jp_0.get("name").cloned().unwrap_or(serde_json::Value::Null)); Some(serde_json::Value::Object(jp_1)) }"#;

// {n: name}
fn hash(input: &Json) -> Option<Json> {
    if input.is_null() { None } else { let jp_0 = input; let mut jp_1 = serde_json::Map::new(); jp_1.insert("n".to_string(), jp_0.get("name").cloned().unwrap_or(serde_json::Value::Null)); Some(serde_json::Value::Object(jp_1)) }
}

const WIDE_LITERAL: &str = r#"if let Some(serde_json::Value::Array(ref jp_0)) = input.get("foo").cloned() { let mut jp_2 = Vec::new(); for jp_1 in jp_0.iter() { if jmes_lang::runtime::is_truthy(&jmes_lang::runtime::compare("==", jp_1.get("a").cloned(), Some(serde_json::json!(3000000000i64)))) { if let Some(jp_3) = jp_1.get("b").cloned() { if !jp_3.is_null() { jp_2.push(jp_3); } } } } Some(serde_json::Value::Array(jp_2)) } else { None }"#;

// foo[?a == `3000000000`].b
fn wide_literal(input: &Json) -> Option<Json> {
    if let Some(serde_json::Value::Array(ref jp_0)) = input.get("foo").cloned() { let mut jp_2 = Vec::new(); for jp_1 in jp_0.iter() { if jmes_lang::runtime::is_truthy(&jmes_lang::runtime::compare("==", jp_1.get("a").cloned(), Some(serde_json::json!(3000000000i64)))) { if let Some(jp_3) = jp_1.get("b").cloned() { if !jp_3.is_null() { jp_2.push(jp_3); } } } } Some(serde_json::Value::Array(jp_2)) } else { None }
}

fn absent_as_null(result: Option<Json>) -> Json {
    result.unwrap_or(Json::Null)
}

// ============================================================================
// Generated text
// ============================================================================

#[test]
fn test_explicit_if_output() {
    let config = CodegenConfig::default();
    assert_eq!(generate("foo.bar", &config), FIELD_CHAIN);
    assert_eq!(generate("foo[*].bar", &config), PROJECTION);
    assert_eq!(generate("people[?age > `20`].name", &config), FILTER);
    assert_eq!(generate("a || b", &config), OR);
    assert_eq!(generate("foo | [0]", &config), PIPE);
    assert_eq!(generate("{n: name}", &config), HASH);
    assert_eq!(generate("foo[?a == `3000000000`].b", &config), WIDE_LITERAL);
}

#[test]
fn test_null_coalescing_output() {
    let config = coalescing();
    assert_eq!(generate("foo.bar", &config), FIELD_CHAIN_COALESCING);
    assert_eq!(generate("foo[*].bar", &config), PROJECTION_COALESCING);
    assert_eq!(generate("a || b", &config), OR_COALESCING);
}

#[test]
fn test_simple_nodes() {
    let config = CodegenConfig::default();
    assert_eq!(generate("foo", &config), r#"input.get("foo").cloned()"#);
    assert_eq!(generate("@", &config), "Some(input.clone())");
    assert_eq!(generate("`[1, \"x\"]`", &config), r#"Some(serde_json::json!([1i64, "x"]))"#);
    assert_eq!(generate("`3000000000`", &config), "Some(serde_json::json!(3000000000i64))");
    assert_eq!(
        generate("length(@)", &config),
        r#"jmes_lang::runtime::call("length", vec![Some(input.clone())])"#
    );
    assert_eq!(
        generate("!a", &config),
        r#"Some(serde_json::Value::Bool(!jmes_lang::runtime::is_truthy(&input.get("a").cloned())))"#
    );
    assert!(generate("[1:-1:2]", &config)
        .contains("= jmes_lang::runtime::slice(input, Some(1), Some(-1), Some(2)) {"));
}

#[test]
fn test_prefix_namespace_and_input() {
    let config = CodegenConfig::default()
        .with_prefix("tmp")
        .with_namespace("crate::support")
        .with_input_variable("doc");
    assert_eq!(
        generate("a[0]", &config),
        r#"if let Some(ref tmp0) = doc.get("a").cloned().filter(|v| !v.is_null()) { crate::support::index(tmp0, 0) } else { None }"#
    );
}

#[test]
fn test_temps_are_unique() {
    let code = generate("a.b.c.d", &CodegenConfig::default());
    for name in ["jp_0", "jp_1", "jp_2"] {
        assert_eq!(code.matches(&format!("Some(ref {})", name)).count(), 1, "{}", code);
    }
    assert!(!code.contains("jp_3"));
}

#[test]
fn test_generated_function() {
    let expr = compile("foo.bar").unwrap();
    let code = generate_function("foo_bar", expr.as_ast(), &CodegenConfig::default()).unwrap();
    assert_eq!(
        code,
        format!(
            "pub fn foo_bar(input: &serde_json::Value) -> Option<serde_json::Value> {{\n    {}\n}}\n",
            FIELD_CHAIN
        )
    );
    assert!(matches!(
        generate_function("foo-bar", expr.as_ast(), &CodegenConfig::default()),
        Err(CodegenError::InvalidConfig(_))
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_expression_ref_is_unsupported() {
    let err = generate_error("sort_by(@, &age)", &CodegenConfig::default());
    assert_eq!(
        err,
        CodegenError::UnsupportedExpression {
            node_kind: "ExpressionRef"
        }
    );
    assert_eq!(err.to_string(), "cannot generate code for ExpressionRef expressions");
}

#[test]
fn test_arity_checked_before_emitting() {
    let err = generate_error("length(a, b)", &CodegenConfig::default());
    assert!(matches!(err, CodegenError::FunctionArgument { ref function, .. } if function == "length"));
}

#[test]
fn test_invalid_config() {
    let config = CodegenConfig::default().with_input_variable("jp_input");
    assert!(matches!(
        compile("a").unwrap().generate_code(&config),
        Err(CodegenError::InvalidConfig(_))
    ));

    let config: CodegenConfig = serde_json::from_value(json!({"functionSupportNamespace": "a b"})).unwrap();
    assert!(config.validate().is_err());

    assert!(serde_json::from_value::<CodegenConfig>(json!({"nullCheckStyle": "ternary"})).is_err());
}

// ============================================================================
// Generated accessors agree with the evaluator
// ============================================================================

#[test]
fn test_accessors_match_search() {
    let documents = [
        json!({"foo": {"bar": 1}}),
        json!({"foo": {"bar": null}}),
        json!({"foo": null}),
        json!({"foo": [{"bar": 1}, {"baz": 2}, {"bar": [3]}, 4]}),
        json!({"foo": "text"}),
        json!({"a": 0, "b": "fallback"}),
        json!({"a": [], "b": "fallback"}),
        json!({"a": false}),
        json!({"name": "x"}),
        json!({"people": [{"name": "a", "age": 30}, {"name": "b", "age": 10}, {"age": 40}]}),
        json!({"foo": [{"a": 3000000000i64, "b": 1}, {"a": 3, "b": 2}, {"a": -3000000000i64}]}),
        json!([]),
        json!(null),
    ];

    type Accessor = fn(&Json) -> Option<Json>;
    let accessors: [(&str, Accessor); 10] = [
        ("foo.bar", field_chain),
        ("foo.bar", field_chain_coalescing),
        ("foo[*].bar", projection),
        ("foo[*].bar", projection_coalescing),
        ("people[?age > `20`].name", filter),
        ("a || b", or),
        ("a || b", or_coalescing),
        ("foo | [0]", pipe),
        ("{n: name}", hash),
        ("foo[?a == `3000000000`].b", wide_literal),
    ];

    for (expr, accessor) in accessors {
        for doc in &documents {
            assert_eq!(
                absent_as_null(accessor(doc)),
                search(expr, doc).unwrap(),
                "{} on {}",
                expr,
                doc
            );
        }
    }
}

#[test]
fn test_runtime_calls_match_functions() {
    use jmes_lang::runtime;

    let data = json!({"xs": [3, 1, 2], "s": "abc"});
    assert_eq!(
        runtime::call("sort", vec![data.get("xs").cloned()]),
        Some(search("sort(xs)", &data).unwrap())
    );
    assert_eq!(
        runtime::call("length", vec![data.get("s").cloned()]),
        Some(search("length(s)", &data).unwrap())
    );
    assert_eq!(runtime::call("abs", vec![data.get("s").cloned()]), None);
    assert_eq!(
        runtime::compare(">=", Some(json!(2)), Some(json!(2.0))),
        Some(json!(true))
    );
}
