//! Compiled expressions: parse once, evaluate many times.

use std::{fmt, str::FromStr};

use log::debug;
use thiserror::Error;

use crate::{
    ast::Expr,
    codegen::{CodeGenerator, CodegenConfig, CodegenError},
    evaluator::{EvalError, Evaluator},
    lexer::{Lexer, SyntaxError},
    node::DataNode,
    parser::Parser,
    value::Value,
};

/// Any error the engine can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JmesError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

/// A parsed expression together with its source text.
///
/// Immutable after [`compile`]; share it freely and evaluate it against as
/// many documents as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    text: String,
    ast: Expr,
}

/// Parses `text` into a [`CompiledExpression`].
///
/// ```
/// use jmes_lang::{compile, Value};
///
/// let expr = compile("people[?age > `30`].name").unwrap();
/// let data = Value::from(serde_json::json!({
///     "people": [{"name": "a", "age": 25}, {"name": "b", "age": 40}]
/// }));
/// assert_eq!(expr.evaluate(&data).unwrap(), Value::Array(vec!["b".into()]));
/// ```
pub fn compile(text: &str) -> Result<CompiledExpression, SyntaxError> {
    let ast = Parser::new(Lexer::new(text))?.parse()?;
    debug!("compiled '{}' to a {} expression", text, ast.kind_name());
    Ok(CompiledExpression {
        text: text.to_string(),
        ast,
    })
}

impl CompiledExpression {
    /// The text this expression was compiled from.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_ast(&self) -> &Expr {
        &self.ast
    }

    pub fn evaluate(&self, data: &Value) -> Result<Value, EvalError> {
        self.evaluate_node(data)
    }

    /// Evaluates against any [`DataNode`] tree. The tree is only read
    /// through lookups; just the parts that end up in the result are copied.
    pub fn evaluate_node<N: DataNode + ?Sized>(&self, data: &N) -> Result<Value, EvalError> {
        Evaluator::new().evaluate(&self.ast, data)
    }

    /// Evaluates against a `serde_json::Value`, returning one.
    pub fn search(&self, data: &serde_json::Value) -> Result<serde_json::Value, EvalError> {
        let result = self.evaluate_node(data)?;
        Ok(result.into())
    }

    /// Rust source for an accessor equivalent to this expression.
    pub fn generate_code(&self, config: &CodegenConfig) -> Result<String, CodegenError> {
        CodeGenerator::new(config)?.generate(&self.ast)
    }
}

impl FromStr for CompiledExpression {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        compile(s)
    }
}

/// The canonical form of the expression, which may differ in spacing and
/// parentheses from the compiled text.
impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.ast, f)
    }
}

/// Compiles and evaluates in one step.
pub fn search(text: &str, data: &serde_json::Value) -> Result<serde_json::Value, JmesError> {
    Ok(compile(text)?.search(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_on_json() {
        let data = json!({"a": {"b": [1, 2, 3]}});
        assert_eq!(search("a.b[-1]", &data).unwrap(), json!(3));
        assert_eq!(search("a.missing", &data).unwrap(), json!(null));
    }

    #[test]
    fn errors_convert() {
        let err = search("a.", &json!({})).unwrap_err();
        assert!(matches!(err, JmesError::Syntax(_)));

        let err = search("length(`1`)", &json!({})).unwrap_err();
        assert!(matches!(err, JmesError::Eval(EvalError::FunctionArgument { .. })));
    }

    #[test]
    fn display_is_canonical() {
        let expr: CompiledExpression = "foo[*] .bar|[0]".parse().unwrap();
        assert_eq!(expr.as_str(), "foo[*] .bar|[0]");
        assert_eq!(expr.to_string(), "foo[*].bar | [0]");
    }
}
