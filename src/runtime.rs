//! Support functions called by generated accessors.
//!
//! Everything here works on `serde_json::Value` and returns `None` for a
//! missing result. The work is done by the same code [`crate::evaluate`]
//! uses, so an accessor produced by [`crate::codegen`] selects exactly what
//! evaluating the expression would.

use log::warn;
use serde_json::Value as Json;

use crate::{
    ast::Comparator,
    evaluator::{self, Evaluator},
    functions::Arg,
    value::Value,
};

fn to_value(json: Option<Json>) -> Value {
    json.map(Value::from).unwrap_or(Value::Null)
}

fn to_json(value: Value) -> Option<Json> {
    if value.is_null() { None } else { Some(value.into()) }
}

/// JMESPath truthiness; `None` is falsy.
pub fn is_truthy(value: &Option<Json>) -> bool {
    value.as_ref().is_some_and(is_truthy_value)
}

pub fn is_truthy_value(value: &Json) -> bool {
    match value {
        Json::Null => false,
        Json::Bool(b) => *b,
        Json::Number(_) => true,
        Json::String(s) => !s.is_empty(),
        Json::Array(items) => !items.is_empty(),
        Json::Object(map) => !map.is_empty(),
    }
}

/// `[index]`, negative indices counting from the end.
pub fn index(value: &Json, index: i64) -> Option<Json> {
    let items = value.as_array()?;
    let i = evaluator::resolve_index(items.len(), index)?;
    items.get(i).filter(|v| !v.is_null()).cloned()
}

/// `[start:stop:step]`; `None` when `value` isn't an array.
pub fn slice(value: &Json, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Option<Json> {
    let items = value.as_array()?;
    let sliced = evaluator::slice_indices(items.len(), start, stop, step)
        .into_iter()
        .filter_map(|i| items.get(i).cloned())
        .collect();
    Some(Json::Array(sliced))
}

/// Merges nested arrays one level deep.
pub fn flatten(value: Option<Json>) -> Option<Json> {
    to_json(evaluator::flatten(to_value(value)))
}

/// Values of an object, in key order.
pub fn object_values(value: Option<Json>) -> Option<Json> {
    match value? {
        Json::Object(map) => Some(Json::Array(map.into_iter().map(|(_, v)| v).collect())),
        _ => None,
    }
}

/// Comparison by operator symbol (`"=="`, `"<"`, ...).
pub fn compare(op: &str, lhs: Option<Json>, rhs: Option<Json>) -> Option<Json> {
    let Some(op) = Comparator::from_symbol(op) else {
        warn!("generated code used unknown comparator '{}'", op);
        return None;
    };
    to_json(evaluator::compare_values(op, &to_value(lhs), &to_value(rhs)))
}

/// Calls a built-in. Errors are logged and give `None`, since a generated
/// accessor has no error channel.
pub fn call(name: &str, args: Vec<Option<Json>>) -> Option<Json> {
    let args: Vec<Arg<'_>> = args.into_iter().map(|a| Arg::Value(to_value(a))).collect();
    match Evaluator::new().call_function(name, args) {
        Ok(value) => to_json(value),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}
