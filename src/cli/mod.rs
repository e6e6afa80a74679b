//! CLI support for jmes-lang
//!
//! The `jmes` binary is a thin wrapper over these functions, so other tools
//! can run the same commands in-process.

mod check;
mod generate;

pub use check::{CheckOptions, CheckResult, SearchOptions, execute_check, execute_search};
pub use generate::{CodegenOptions, execute_codegen};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Syntax(#[from] crate::SyntaxError),

    #[error("evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("code generation error: {0}")]
    Codegen(#[from] crate::CodegenError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("invalid config file {path}: {message}")]
    Config { path: String, message: String },
}

impl From<crate::JmesError> for CliError {
    fn from(e: crate::JmesError) -> Self {
        match e {
            crate::JmesError::Syntax(e) => CliError::Syntax(e),
            crate::JmesError::Eval(e) => CliError::Eval(e),
            crate::JmesError::Codegen(e) => CliError::Codegen(e),
        }
    }
}
