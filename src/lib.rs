//! A JMESPath query engine.
//!
//! Expressions are compiled once into an [`Expr`] tree, then either
//! evaluated against JSON-like data or turned into Rust accessor source by
//! the code generator. Both backends, and the printer behind
//! `Display for Expr`, walk the tree through the [`Visitor`] trait.
//!
//! ```
//! use serde_json::json;
//!
//! let data = json!({"locations": [
//!     {"name": "Seattle", "state": "WA"},
//!     {"name": "New York", "state": "NY"},
//!     {"name": "Olympia", "state": "WA"}
//! ]});
//! let result = jmes_lang::search(
//!     "locations[?state == 'WA'].name | sort(@) | {WashingtonCities: join(', ', @)}",
//!     &data,
//! ).unwrap();
//! assert_eq!(result, json!({"WashingtonCities": "Olympia, Seattle"}));
//! ```
pub mod ast;
pub mod cli;
pub mod codegen;
pub mod convert;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod lexer;
pub mod node;
pub mod output;
pub mod parser;
pub mod printer;
pub mod runtime;
pub mod value;
pub mod visitor;

pub use ast::{Comparator, Expr, Token, TokenKind};
pub use codegen::{CodeGenerator, CodegenConfig, CodegenError, NullCheckStyle};
pub use evaluator::{EvalError, Evaluator};
pub use expression::{CompiledExpression, JmesError, compile, search};
pub use lexer::{Lexer, SyntaxError};
pub use node::{DataNode, NodeKind};
pub use output::{to_json, to_json_pretty};
pub use parser::Parser;
pub use value::{Map, Value};
pub use visitor::Visitor;

/// Compiles `text` and evaluates it against `data`.
pub fn evaluate(text: &str, data: &Value) -> Result<Value, JmesError> {
    Ok(compile(text)?.evaluate(data)?)
}
