//! Ahead-of-time accessor generation.
//!
//! [`CodeGenerator`] turns an expression into Rust source for a null-safe
//! accessor over `serde_json::Value`. The generated expression has type
//! `Option<serde_json::Value>`, with `None` (or `Some(Null)`) standing for a
//! missing result, and reads its input from a `&serde_json::Value` variable.
//! Built-ins and the less trivial helpers (index, slice, flatten,
//! comparisons) are calls into [`crate::runtime`], so generated code and
//! [`crate::evaluate`] agree on semantics.
//!
//! ```
//! use jmes_lang::{codegen::CodegenConfig, compile};
//!
//! let expr = compile("foo.bar").unwrap();
//! let code = expr.generate_code(&CodegenConfig::default()).unwrap();
//! assert!(code.contains(r#"input.get("foo")"#));
//! ```

use std::{str::FromStr, sync::LazyLock};

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ast::{Comparator, Expr},
    functions,
    value::Value,
    visitor::Visitor,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The node kind has no code generation rule
    #[error("cannot generate code for {node_kind} expressions")]
    UnsupportedExpression { node_kind: &'static str },

    #[error("invalid arguments to {function}(): {message}")]
    FunctionArgument { function: String, message: String },

    #[error("invalid codegen config: {0}")]
    InvalidConfig(String),
}

/// How absent values are guarded in generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullCheckStyle {
    /// `if let Some(..) = .. { .. } else { None }`
    #[default]
    ExplicitIf,
    /// `Option` combinators: `.and_then(..)`, `.or_else(..)`
    NullCoalescing,
}

impl FromStr for NullCheckStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explicit-if" => Ok(NullCheckStyle::ExplicitIf),
            "null-coalescing" => Ok(NullCheckStyle::NullCoalescing),
            other => Err(format!(
                "unknown null check style '{}' (expected explicit-if or null-coalescing)",
                other
            )),
        }
    }
}

/// Settings for [`CodeGenerator`]. Deserializes from camelCase JSON, with
/// every key optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodegenConfig {
    /// Prefix of generated temporaries (`jp_0`, `jp_1`, ...)
    pub variable_name_prefix: String,
    pub null_check_style: NullCheckStyle,
    /// Path of the module providing the runtime helpers
    pub function_support_namespace: String,
    /// Name of the `&serde_json::Value` the accessor reads
    pub input_variable: String,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            variable_name_prefix: "jp_".to_string(),
            null_check_style: NullCheckStyle::ExplicitIf,
            function_support_namespace: "jmes_lang::runtime".to_string(),
            input_variable: "input".to_string(),
        }
    }
}

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));
static PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(::[A-Za-z_][A-Za-z0-9_]*)*$").expect("valid regex")
});

fn check(pattern: &Regex, value: &str, what: &str, kind: &str) -> Result<(), CodegenError> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(CodegenError::InvalidConfig(format!(
            "{} '{}' is not a valid Rust {}",
            what, value, kind
        )))
    }
}

impl CodegenConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.variable_name_prefix = prefix.into();
        self
    }

    pub fn with_style(mut self, style: NullCheckStyle) -> Self {
        self.null_check_style = style;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.function_support_namespace = namespace.into();
        self
    }

    pub fn with_input_variable(mut self, name: impl Into<String>) -> Self {
        self.input_variable = name.into();
        self
    }

    pub fn validate(&self) -> Result<(), CodegenError> {
        check(&IDENTIFIER, &self.variable_name_prefix, "variableNamePrefix", "identifier")?;
        check(&IDENTIFIER, &self.input_variable, "inputVariable", "identifier")?;
        check(&PATH, &self.function_support_namespace, "functionSupportNamespace", "path")?;
        if self.input_variable.starts_with(&self.variable_name_prefix) {
            return Err(CodegenError::InvalidConfig(format!(
                "inputVariable '{}' collides with temporaries prefixed '{}'",
                self.input_variable, self.variable_name_prefix
            )));
        }
        Ok(())
    }
}

const NULL: &str = "serde_json::Value::Null";

/// Parenthesizes block-like code so a method call can follow it.
fn operand(code: String) -> String {
    if code.starts_with('{') || code.starts_with("if ") || code.starts_with("match ") {
        format!("({})", code)
    } else {
        code
    }
}

/// A `serde_json::json!` invocation body for `value`, with strings written
/// as Rust literals. Integers carry an `i64` suffix so literals outside the
/// `i32` range still type-check.
fn json_tokens(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(n) => format!("{}i64", n),
        Value::Float(f) if f.is_finite() => format!("{:?}", f),
        Value::Float(_) => "null".to_string(),
        Value::String(s) => format!("{:?}", s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(json_tokens).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(obj) => {
            let pairs: Vec<String> = obj
                .iter()
                .map(|(k, v)| format!("{:?}: {}", k, json_tokens(v)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
    }
}

fn option_literal(n: Option<i64>) -> String {
    match n {
        Some(n) => format!("Some({})", n),
        None => "None".to_string(),
    }
}

pub struct CodeGenerator<'c> {
    config: &'c CodegenConfig,
    counter: usize,
}

impl<'c> CodeGenerator<'c> {
    pub fn new(config: &'c CodegenConfig) -> Result<Self, CodegenError> {
        config.validate()?;
        Ok(CodeGenerator { config, counter: 0 })
    }

    /// Rust expression of type `Option<serde_json::Value>` for `expr`.
    pub fn generate(&mut self, expr: &Expr) -> Result<String, CodegenError> {
        let input = self.config.input_variable.clone();
        let code = expr.accept(self, input.as_str())?;
        debug!("generated {} bytes for {} expression", code.len(), expr.kind_name());
        Ok(code)
    }

    fn temp(&mut self) -> String {
        let name = format!("{}{}", self.config.variable_name_prefix, self.counter);
        self.counter += 1;
        name
    }

    fn ns(&self) -> &str {
        &self.config.function_support_namespace
    }

    fn coalescing(&self) -> bool {
        self.config.null_check_style == NullCheckStyle::NullCoalescing
    }

    /// Runs `rhs` against the non-null result of `lhs`.
    fn guarded(&mut self, lhs: &Expr, rhs: &Expr, input: &str) -> Result<String, CodegenError> {
        let source = operand(lhs.accept(self, input)?);
        let tmp = self.temp();
        let body = rhs.accept(self, tmp.as_str())?;
        Ok(if self.coalescing() {
            format!(
                "{}.filter(|v| !v.is_null()).as_ref().and_then(|{}| {})",
                source, tmp, body
            )
        } else {
            format!(
                "if let Some(ref {}) = {}.filter(|v| !v.is_null()) {{ {} }} else {{ None }}",
                tmp, source, body
            )
        })
    }

    /// Shared by plain and filter projections: one binding for the source
    /// array, then `rhs` per (kept) element with null results dropped.
    fn projection(
        &mut self,
        lhs: &Expr,
        predicate: Option<&Expr>,
        rhs: &Expr,
        input: &str,
    ) -> Result<String, CodegenError> {
        let source = operand(lhs.accept(self, input)?);
        let items = self.temp();
        let item = self.temp();
        let test = match predicate {
            Some(p) => {
                let condition = p.accept(self, item.as_str())?;
                Some(format!("{}::is_truthy(&{})", self.ns(), condition))
            }
            None => None,
        };
        let body = operand(rhs.accept(self, item.as_str())?);

        if self.coalescing() {
            let filter = test
                .map(|t| format!(".filter(|&{}| {})", item, t))
                .unwrap_or_default();
            return Ok(format!(
                "{source}.as_ref().and_then(|v| v.as_array()).map(|{items}| \
                 serde_json::Value::Array({items}.iter(){filter}.filter_map(|{item}| {body})\
                 .filter(|v| !v.is_null()).collect()))"
            ));
        }

        let out = self.temp();
        let value = self.temp();
        let push = format!(
            "if let Some({value}) = {body} {{ if !{value}.is_null() {{ {out}.push({value}); }} }}"
        );
        let step = match test {
            Some(t) => format!("if {} {{ {} }}", t, push),
            None => push,
        };
        Ok(format!(
            "if let Some(serde_json::Value::Array(ref {items})) = {source} {{ \
             let mut {out} = Vec::new(); \
             for {item} in {items}.iter() {{ {step} }} \
             Some(serde_json::Value::Array({out})) }} else {{ None }}"
        ))
    }
}

impl<'a> Visitor<&'a str> for CodeGenerator<'_> {
    type Output = Result<String, CodegenError>;

    fn visit_field(&mut self, name: &str, input: &'a str) -> Self::Output {
        Ok(format!("{}.get({:?}).cloned()", input, name))
    }

    fn visit_index(&mut self, index: i64, input: &'a str) -> Self::Output {
        Ok(format!("{}::index({}, {})", self.ns(), input, index))
    }

    fn visit_slice(
        &mut self,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
        input: &'a str,
    ) -> Self::Output {
        Ok(format!(
            "{}::slice({}, {}, {}, {})",
            self.ns(),
            input,
            option_literal(start),
            option_literal(stop),
            option_literal(step)
        ))
    }

    fn visit_flatten(&mut self, inner: &Expr, input: &'a str) -> Self::Output {
        let inner = inner.accept(self, input)?;
        Ok(format!("{}::flatten({})", self.ns(), inner))
    }

    fn visit_object_values(&mut self, inner: &Expr, input: &'a str) -> Self::Output {
        let inner = inner.accept(self, input)?;
        Ok(format!("{}::object_values({})", self.ns(), inner))
    }

    fn visit_subexpression(&mut self, lhs: &Expr, rhs: &Expr, input: &'a str) -> Self::Output {
        self.guarded(lhs, rhs, input)
    }

    fn visit_pipe(&mut self, lhs: &Expr, rhs: &Expr, input: &'a str) -> Self::Output {
        let source = operand(lhs.accept(self, input)?);
        let tmp = self.temp();
        let body = rhs.accept(self, tmp.as_str())?;
        Ok(format!(
            "{{ let {} = &{}.unwrap_or({}); {} }}",
            tmp, source, NULL, body
        ))
    }

    fn visit_projection(&mut self, lhs: &Expr, rhs: &Expr, input: &'a str) -> Self::Output {
        self.projection(lhs, None, rhs, input)
    }

    fn visit_filter_projection(
        &mut self,
        lhs: &Expr,
        predicate: &Expr,
        rhs: &Expr,
        input: &'a str,
    ) -> Self::Output {
        self.projection(lhs, Some(predicate), rhs, input)
    }

    fn visit_multi_select_list(&mut self, items: &[Expr], input: &'a str) -> Self::Output {
        let tmp = self.temp();
        let mut elements = Vec::with_capacity(items.len());
        for item in items {
            elements.push(format!("{}.unwrap_or({})", operand(item.accept(self, tmp.as_str())?), NULL));
        }
        let list = format!("serde_json::Value::Array(vec![{}])", elements.join(", "));
        Ok(if self.coalescing() {
            format!(
                "Some({}).filter(|v| !v.is_null()).map(|{}| {})",
                input, tmp, list
            )
        } else {
            format!(
                "if {input}.is_null() {{ None }} else {{ let {tmp} = {input}; Some({list}) }}"
            )
        })
    }

    fn visit_multi_select_hash(&mut self, pairs: &[(String, Expr)], input: &'a str) -> Self::Output {
        let tmp = self.temp();
        let map = self.temp();
        let mut inserts = String::new();
        for (key, expr) in pairs {
            let value = operand(expr.accept(self, tmp.as_str())?);
            inserts.push_str(&format!(
                "{}.insert({:?}.to_string(), {}.unwrap_or({})); ",
                map, key, value, NULL
            ));
        }
        let body = format!(
            "let mut {map} = serde_json::Map::new(); {inserts}Some(serde_json::Value::Object({map}))"
        );
        Ok(if self.coalescing() {
            format!(
                "Some({input}).filter(|v| !v.is_null()).and_then(|{tmp}| {{ {body} }})"
            )
        } else {
            format!("if {input}.is_null() {{ None }} else {{ let {tmp} = {input}; {body} }}")
        })
    }

    fn visit_or(&mut self, lhs: &Expr, rhs: &Expr, input: &'a str) -> Self::Output {
        let left = operand(lhs.accept(self, input)?);
        let right = rhs.accept(self, input)?;
        if self.coalescing() {
            return Ok(format!(
                "{}.filter({}::is_truthy_value).or_else(|| {})",
                left,
                self.ns(),
                right
            ));
        }
        let tmp = self.temp();
        Ok(format!(
            "{{ let {tmp} = {left}; if {ns}::is_truthy(&{tmp}) {{ {tmp} }} else {{ {right} }} }}",
            ns = self.ns()
        ))
    }

    fn visit_and(&mut self, lhs: &Expr, rhs: &Expr, input: &'a str) -> Self::Output {
        let left = lhs.accept(self, input)?;
        let right = rhs.accept(self, input)?;
        let tmp = self.temp();
        Ok(format!(
            "{{ let {tmp} = {left}; if {ns}::is_truthy(&{tmp}) {{ {right} }} else {{ {tmp} }} }}",
            ns = self.ns()
        ))
    }

    fn visit_not(&mut self, inner: &Expr, input: &'a str) -> Self::Output {
        let inner = inner.accept(self, input)?;
        Ok(format!(
            "Some(serde_json::Value::Bool(!{}::is_truthy(&{})))",
            self.ns(),
            inner
        ))
    }

    fn visit_comparison(
        &mut self,
        op: Comparator,
        lhs: &Expr,
        rhs: &Expr,
        input: &'a str,
    ) -> Self::Output {
        let left = lhs.accept(self, input)?;
        let right = rhs.accept(self, input)?;
        Ok(format!(
            "{}::compare({:?}, {}, {})",
            self.ns(),
            op.as_str(),
            left,
            right
        ))
    }

    fn visit_function_call(&mut self, name: &str, args: &[Expr], input: &'a str) -> Self::Output {
        let signature = functions::lookup(name).ok_or_else(|| CodegenError::FunctionArgument {
            function: name.to_string(),
            message: "unknown function".to_string(),
        })?;
        signature
            .check_arity(args.len())
            .map_err(|message| CodegenError::FunctionArgument {
                function: name.to_string(),
                message,
            })?;

        let mut rendered = Vec::with_capacity(args.len());
        for arg in args {
            rendered.push(arg.accept(self, input)?);
        }
        Ok(format!(
            "{}::call({:?}, vec![{}])",
            self.ns(),
            name,
            rendered.join(", ")
        ))
    }

    fn visit_expression_ref(&mut self, _inner: &Expr, _input: &'a str) -> Self::Output {
        Err(CodegenError::UnsupportedExpression {
            node_kind: "ExpressionRef",
        })
    }

    fn visit_current_node(&mut self, input: &'a str) -> Self::Output {
        Ok(format!("Some({}.clone())", input))
    }

    fn visit_literal(&mut self, value: &Value, _input: &'a str) -> Self::Output {
        Ok(format!("Some(serde_json::json!({}))", json_tokens(value)))
    }
}

/// Wraps the accessor for `expr` in a named function:
///
/// ```text
/// pub fn name(input: &serde_json::Value) -> Option<serde_json::Value> { ... }
/// ```
pub fn generate_function(
    name: &str,
    expr: &Expr,
    config: &CodegenConfig,
) -> Result<String, CodegenError> {
    check(&IDENTIFIER, name, "function name", "identifier")?;
    let body = CodeGenerator::new(config)?.generate(expr)?;
    Ok(format!(
        "pub fn {}({}: &serde_json::Value) -> Option<serde_json::Value> {{\n    {}\n}}\n",
        name, config.input_variable, body
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_from_empty_json() {
        let config: CodegenConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CodegenConfig::default());

        let config: CodegenConfig =
            serde_json::from_str(r#"{"nullCheckStyle": "null-coalescing", "variableNamePrefix": "t"}"#)
                .unwrap();
        assert_eq!(config.null_check_style, NullCheckStyle::NullCoalescing);
        assert_eq!(config.variable_name_prefix, "t");
    }

    #[test]
    fn rejects_bad_identifiers() {
        let config = CodegenConfig::default().with_prefix("1x");
        assert!(matches!(config.validate(), Err(CodegenError::InvalidConfig(_))));

        let config = CodegenConfig::default().with_namespace("crate::rt::");
        assert!(config.validate().is_err());

        let config = CodegenConfig::default().with_namespace("crate::rt");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn literal_tokens_are_rust_strings() {
        let value = Value::from(serde_json::json!({"a\u{1}": [1, 2.5, null, "x\"y"]}));
        assert_eq!(json_tokens(&value), r#"{"a\u{1}": [1i64, 2.5, null, "x\"y"]}"#);
        assert_eq!(json_tokens(&Value::Integer(-3_000_000_000)), "-3000000000i64");
    }

    #[test]
    fn block_receivers_are_parenthesized() {
        assert_eq!(operand("{ x }".to_string()), "({ x })");
        assert_eq!(operand("input.get(\"a\")".to_string()), "input.get(\"a\")");
    }
}
