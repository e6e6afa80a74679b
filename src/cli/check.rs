//! Run expressions against JSON input, or just check that they parse.

use super::CliError;
use crate::{compile, printer::Printer};

/// Options for the search command
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub expression: String,
    /// JSON input string
    pub input: Option<String>,
}

/// Compiles the expression and evaluates it against the input document.
pub fn execute_search(options: &SearchOptions) -> Result<serde_json::Value, CliError> {
    let expr = compile(&options.expression)?;
    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let data: serde_json::Value = serde_json::from_str(json_str)?;
    Ok(expr.search(&data)?)
}

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub expression: String,
    /// Also return the parsed tree
    pub ast: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub struct CheckResult {
    /// The expression in canonical form
    pub canonical: String,
    /// Debug rendering of the tree, when requested
    pub ast: Option<String>,
}

/// Parses the expression without evaluating it.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let expr = compile(&options.expression)?;
    Ok(CheckResult {
        canonical: Printer::print(expr.as_ast()),
        ast: options.ast.then(|| format!("{:#?}", expr.as_ast())),
    })
}
