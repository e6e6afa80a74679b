//! # JMESPath - Abstract Syntax Tree
//!
//! This module defines the tokens and syntax tree for JMESPath expressions.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (access, projections, logic, functions)
//! - **[operators]** - Comparison operators
//!
//! ## Quick Start
//!
//! ```text
//! reservations[*].instances[?state == 'running'].id | [0]
//! ```
//!
//! This takes every reservation's running instance ids, then the first of
//! the whole projected list.
//!
//! ## Core Concepts
//!
//! ### Projections
//!
//! `[*]`, `*`, `[]`, `[?...]` and slices turn the left side into a list and
//! apply everything to their right to each element, dropping null results.
//! The projection keeps going through `.name`, `[n]` and nested brackets
//! until a `|` (or a logical/comparison operator) ends it:
//!
//! ```text
//! foo[*].bar[0]     // first element of each bar
//! foo[*].bar | [0]  // first bar of the projected list
//! ```
//!
//! ### Missing Data
//!
//! Looking up a missing field or index yields `null`, and `null` flows
//! through the rest of the chain. Nothing about a missing value is an error.
//!
//! ### Truthiness
//!
//! `false`, `null`, `""`, `[]` and `{}` are falsy. Everything else is
//! truthy, including `0`.
//!
//! ## Examples
//!
//! ### Filter
//!
//! ```text
//! people[?age > `20`].name
//! ```
//!
//! ### Multi-select
//!
//! ```text
//! people[*].{name: name, years: age}
//! ```
//!
//! ### Functions
//!
//! ```text
//! sort_by(people, &age)[-1].name
//! ```
pub mod tokens;
pub mod expressions;
pub mod operators;

pub use tokens::{Token, TokenKind};
pub use expressions::Expr;
pub use operators::Comparator;
