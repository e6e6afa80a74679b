//! Generate Rust accessor code for an expression.

use std::fs;

use super::CliError;
use crate::{
    codegen::{self, CodegenConfig, NullCheckStyle},
    compile,
};

/// Options for the codegen command. Flags override values loaded from
/// `config_path`.
#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    pub expression: String,
    pub config_path: Option<String>,
    pub prefix: Option<String>,
    pub style: Option<NullCheckStyle>,
    pub namespace: Option<String>,
    pub input_variable: Option<String>,
    /// Wrap the accessor in `pub fn <name>`
    pub function_name: Option<String>,
}

impl CodegenOptions {
    /// The config file (or the defaults) with flag overrides applied.
    pub fn config(&self) -> Result<CodegenConfig, CliError> {
        let mut config = match &self.config_path {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                serde_json::from_str(&text).map_err(|e| CliError::Config {
                    path: path.clone(),
                    message: e.to_string(),
                })?
            }
            None => CodegenConfig::default(),
        };
        if let Some(prefix) = &self.prefix {
            config = config.with_prefix(prefix.clone());
        }
        if let Some(style) = self.style {
            config = config.with_style(style);
        }
        if let Some(namespace) = &self.namespace {
            config = config.with_namespace(namespace.clone());
        }
        if let Some(input) = &self.input_variable {
            config = config.with_input_variable(input.clone());
        }
        Ok(config)
    }
}

pub fn execute_codegen(options: &CodegenOptions) -> Result<String, CliError> {
    let config = options.config()?;
    let expr = compile(&options.expression)?;
    let code = match &options.function_name {
        Some(name) => codegen::generate_function(name, expr.as_ast(), &config)?,
        None => expr.generate_code(&config)?,
    };
    Ok(code)
}
