//! Built-in functions.
//!
//! The registry is fixed: [`FUNCTIONS`] lists every function with its
//! signature, the parser rejects names that aren't in it, and
//! [`Evaluator::call_function`] checks arity and argument types before
//! dispatching.

use std::cmp::Ordering;

use log::trace;
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::Expr,
    evaluator::{EvalError, Evaluator},
    value::{Map, Value},
};

/// What a single parameter position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Any,
    Number,
    String,
    Array,
    Object,
    /// An array whose elements are all numbers
    ArrayNumber,
    /// An array whose elements are all strings
    ArrayString,
    /// An `&expr` reference
    Expref,
}

impl ArgType {
    fn name(&self) -> &'static str {
        match self {
            ArgType::Any => "any",
            ArgType::Number => "number",
            ArgType::String => "string",
            ArgType::Array => "array",
            ArgType::Object => "object",
            ArgType::ArrayNumber => "array[number]",
            ArgType::ArrayString => "array[string]",
            ArgType::Expref => "expression reference",
        }
    }

    fn accepts(&self, arg: &Arg<'_>) -> bool {
        let value = match (self, arg) {
            (ArgType::Expref, Arg::Expref(_)) => return true,
            (_, Arg::Expref(_)) | (ArgType::Expref, _) => return false,
            (_, Arg::Value(value)) => value,
        };
        match self {
            ArgType::Any => true,
            ArgType::Number => value.is_number(),
            ArgType::String => matches!(value, Value::String(_)),
            ArgType::Array => matches!(value, Value::Array(_)),
            ArgType::Object => matches!(value, Value::Object(_)),
            ArgType::ArrayNumber => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_number)),
            ArgType::ArrayString => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| matches!(v, Value::String(_)))),
            ArgType::Expref => false,
        }
    }
}

/// Declared arity and parameter types of a built-in.
#[derive(Debug)]
pub struct Signature {
    pub name: &'static str,
    /// Accepted types per parameter position
    pub params: &'static [&'static [ArgType]],
    /// The last parameter repeats any number of times (at least once)
    pub variadic: bool,
}

impl Signature {
    /// Checks only the argument count.
    pub fn check_arity(&self, count: usize) -> Result<(), String> {
        let expected = self.params.len();
        if self.variadic && count < expected {
            return Err(format!(
                "expected at least {} argument(s), got {}",
                expected, count
            ));
        }
        if !self.variadic && count != expected {
            return Err(format!("expected {} argument(s), got {}", expected, count));
        }
        Ok(())
    }

    pub fn validate(&self, args: &[Arg<'_>]) -> Result<(), EvalError> {
        self.check_arity(args.len())
            .map_err(|message| EvalError::function_argument(self.name, message))?;

        for (i, arg) in args.iter().enumerate() {
            let accepted = self.params[i.min(self.params.len() - 1)];
            if !accepted.iter().any(|t| t.accepts(arg)) {
                let expected: Vec<&str> = accepted.iter().map(ArgType::name).collect();
                return Err(EvalError::function_argument(
                    self.name,
                    format!(
                        "argument {} must be {}, got {}",
                        i + 1,
                        expected.join(" or "),
                        arg.type_name()
                    ),
                ));
            }
        }
        Ok(())
    }
}

const ANY: &[ArgType] = &[ArgType::Any];
const NUMBER: &[ArgType] = &[ArgType::Number];
const STRING: &[ArgType] = &[ArgType::String];
const ARRAY: &[ArgType] = &[ArgType::Array];
const OBJECT: &[ArgType] = &[ArgType::Object];
const EXPREF: &[ArgType] = &[ArgType::Expref];
const ARRAY_NUMBER: &[ArgType] = &[ArgType::ArrayNumber];
const ARRAY_STRING: &[ArgType] = &[ArgType::ArrayString];
const SORTABLE: &[ArgType] = &[ArgType::ArrayNumber, ArgType::ArrayString];
const ARRAY_OR_STRING: &[ArgType] = &[ArgType::Array, ArgType::String];
const SIZED: &[ArgType] = &[ArgType::String, ArgType::Array, ArgType::Object];

const fn sig(name: &'static str, params: &'static [&'static [ArgType]]) -> Signature {
    Signature {
        name,
        params,
        variadic: false,
    }
}

const fn variadic(name: &'static str, params: &'static [&'static [ArgType]]) -> Signature {
    Signature {
        name,
        params,
        variadic: true,
    }
}

pub static FUNCTIONS: &[Signature] = &[
    sig("abs", &[NUMBER]),
    sig("avg", &[ARRAY_NUMBER]),
    sig("ceil", &[NUMBER]),
    sig("contains", &[ARRAY_OR_STRING, ANY]),
    sig("ends_with", &[STRING, STRING]),
    sig("floor", &[NUMBER]),
    sig("join", &[STRING, ARRAY_STRING]),
    sig("keys", &[OBJECT]),
    sig("length", &[SIZED]),
    sig("map", &[EXPREF, ARRAY]),
    sig("max", &[SORTABLE]),
    sig("max_by", &[ARRAY, EXPREF]),
    variadic("merge", &[OBJECT]),
    sig("min", &[SORTABLE]),
    sig("min_by", &[ARRAY, EXPREF]),
    variadic("not_null", &[ANY]),
    sig("reverse", &[ARRAY_OR_STRING]),
    sig("sort", &[SORTABLE]),
    sig("sort_by", &[ARRAY, EXPREF]),
    sig("starts_with", &[STRING, STRING]),
    sig("sum", &[ARRAY_NUMBER]),
    sig("to_array", &[ANY]),
    sig("to_number", &[ANY]),
    sig("to_string", &[ANY]),
    sig("type", &[ANY]),
    sig("values", &[OBJECT]),
];

pub fn lookup(name: &str) -> Option<&'static Signature> {
    FUNCTIONS.iter().find(|s| s.name == name)
}

/// An evaluated function argument.
#[derive(Debug, Clone)]
pub enum Arg<'e> {
    Value(Value),
    Expref(&'e Expr),
}

impl Arg<'_> {
    fn type_name(&self) -> &'static str {
        match self {
            Arg::Value(value) => value.type_name(),
            Arg::Expref(_) => "expression reference",
        }
    }
}

static NULL: Value = Value::Null;

fn value<'v>(args: &'v [Arg<'_>], i: usize) -> &'v Value {
    match args.get(i) {
        Some(Arg::Value(value)) => value,
        _ => &NULL,
    }
}

fn expref<'e>(name: &str, args: &[Arg<'e>], i: usize) -> Result<&'e Expr, EvalError> {
    match args.get(i) {
        Some(Arg::Expref(expr)) => Ok(expr),
        _ => Err(EvalError::function_argument(
            name,
            format!("argument {} must be an expression reference", i + 1),
        )),
    }
}

fn array<'v>(args: &'v [Arg<'_>], i: usize) -> &'v [Value] {
    value(args, i).as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn string<'v>(args: &'v [Arg<'_>], i: usize) -> &'v str {
    value(args, i).as_str().unwrap_or_default()
}

impl Evaluator {
    /// Validates `args` against the registry and runs the function.
    pub(crate) fn call_function(&mut self, name: &str, args: Vec<Arg<'_>>) -> Result<Value, EvalError> {
        let signature = lookup(name)
            .ok_or_else(|| EvalError::function_argument(name, "unknown function"))?;
        signature.validate(&args)?;
        trace!("calling {}() with {} argument(s)", name, args.len());

        match name {
            "abs" => Ok(fn_abs(value(&args, 0))),
            "avg" => Ok(fn_avg(array(&args, 0))),
            "ceil" => Ok(round_with(value(&args, 0), f64::ceil)),
            "contains" => Ok(fn_contains(value(&args, 0), value(&args, 1))),
            "ends_with" => Ok(Value::Boolean(string(&args, 0).ends_with(string(&args, 1)))),
            "floor" => Ok(round_with(value(&args, 0), f64::floor)),
            "join" => Ok(fn_join(string(&args, 0), array(&args, 1))),
            "keys" => Ok(fn_keys(value(&args, 0))),
            "length" => Ok(fn_length(value(&args, 0))),
            "map" => self.fn_map(expref(name, &args, 0)?, array(&args, 1)),
            "max" => Ok(extreme(array(&args, 0), Ordering::Greater)),
            "max_by" => self.extreme_by(name, array(&args, 0), expref(name, &args, 1)?, Ordering::Greater),
            "merge" => Ok(fn_merge(&args)),
            "min" => Ok(extreme(array(&args, 0), Ordering::Less)),
            "min_by" => self.extreme_by(name, array(&args, 0), expref(name, &args, 1)?, Ordering::Less),
            "not_null" => Ok(fn_not_null(&args)),
            "reverse" => Ok(fn_reverse(value(&args, 0))),
            "sort" => Ok(fn_sort(array(&args, 0))),
            "sort_by" => self.fn_sort_by(name, array(&args, 0), expref(name, &args, 1)?),
            "starts_with" => Ok(Value::Boolean(string(&args, 0).starts_with(string(&args, 1)))),
            "sum" => Ok(fn_sum(array(&args, 0))),
            "to_array" => Ok(fn_to_array(value(&args, 0))),
            "to_number" => Ok(fn_to_number(value(&args, 0))),
            "to_string" => Ok(fn_to_string(value(&args, 0))),
            "type" => Ok(Value::String(value(&args, 0).type_name().to_string())),
            "values" => Ok(fn_values(value(&args, 0))),
            _ => Err(EvalError::function_argument(name, "unknown function")),
        }
    }

    /// map(&expr, array) - applies expr to every element, keeping nulls
    fn fn_map(&mut self, expr: &Expr, items: &[Value]) -> Result<Value, EvalError> {
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            result.push(self.evaluate(expr, item)?);
        }
        Ok(Value::Array(result))
    }

    /// Evaluates `expr` on every element and checks the keys are all
    /// numbers or all strings.
    fn sort_keys(&mut self, name: &str, items: &[Value], expr: &Expr) -> Result<Vec<Value>, EvalError> {
        let mut keys = Vec::with_capacity(items.len());
        for item in items {
            let key = self.evaluate(expr, item)?;
            if !key.is_number() && !matches!(key, Value::String(_)) {
                return Err(EvalError::TypeMismatch(format!(
                    "{}() expression must produce numbers or strings, got {}",
                    name,
                    key.type_name()
                )));
            }
            if let Some(first) = keys.first()
                && first_kind(first) != first_kind(&key)
            {
                return Err(EvalError::TypeMismatch(format!(
                    "{}() expression produced both {} and {}",
                    name,
                    first_kind(first),
                    first_kind(&key)
                )));
            }
            keys.push(key);
        }
        Ok(keys)
    }

    /// sort_by(array, &expr) - stable sort on the expression's value
    fn fn_sort_by(&mut self, name: &str, items: &[Value], expr: &Expr) -> Result<Value, EvalError> {
        let keys = self.sort_keys(name, items, expr)?;
        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| keys[a].compare(&keys[b]).unwrap_or(Ordering::Equal));
        Ok(Value::Array(order.into_iter().map(|i| items[i].clone()).collect()))
    }

    /// max_by / min_by - element whose expression value is largest/smallest
    fn extreme_by(
        &mut self,
        name: &str,
        items: &[Value],
        expr: &Expr,
        want: Ordering,
    ) -> Result<Value, EvalError> {
        let keys = self.sort_keys(name, items, expr)?;
        let mut best: Option<usize> = None;
        for i in 0..items.len() {
            match best {
                None => best = Some(i),
                Some(b) if keys[i].compare(&keys[b]) == Some(want) => best = Some(i),
                _ => {}
            }
        }
        Ok(best.map(|i| items[i].clone()).unwrap_or(Value::Null))
    }
}

fn first_kind(value: &Value) -> &'static str {
    value.type_name()
}

/// abs(number)
fn fn_abs(n: &Value) -> Value {
    match n {
        Value::Integer(i) => i
            .checked_abs()
            .map(Value::Integer)
            .unwrap_or(Value::Float((*i as f64).abs())),
        Value::Float(f) => Value::Float(f.abs()),
        _ => Value::Null,
    }
}

/// ceil / floor. Whole results that fit an i64 come back as integers.
fn round_with(n: &Value, round: fn(f64) -> f64) -> Value {
    match n {
        Value::Integer(i) => Value::Integer(*i),
        Value::Float(f) => {
            let r = round(*f);
            if r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64 {
                Value::Integer(r as i64)
            } else {
                Value::Float(r)
            }
        }
        _ => Value::Null,
    }
}

/// Exact decimal sum; `None` if a value has no decimal form or the sum
/// overflows.
fn decimal_sum(items: &[Value]) -> Option<Decimal> {
    let mut total = Decimal::ZERO;
    for item in items {
        let d = match item {
            Value::Integer(i) => Decimal::from_i64(*i)?,
            Value::Float(f) => Decimal::from_f64(*f)?,
            _ => continue,
        };
        total = total.checked_add(d)?;
    }
    Some(total)
}

fn float_sum(items: &[Value]) -> f64 {
    items.iter().filter_map(Value::as_float).sum()
}

/// sum(array[number]) - integers stay integers, floats are summed exactly
fn fn_sum(items: &[Value]) -> Value {
    let all_integers = items.iter().all(|v| matches!(v, Value::Integer(_)));
    if all_integers {
        let total = items.iter().try_fold(0i64, |acc, v| match v {
            Value::Integer(i) => acc.checked_add(*i),
            _ => Some(acc),
        });
        if let Some(total) = total {
            return Value::Integer(total);
        }
    }
    match decimal_sum(items).and_then(|d| d.to_f64()) {
        Some(total) => Value::Float(total),
        None => Value::Float(float_sum(items)),
    }
}

/// avg(array[number]) - null for an empty array
fn fn_avg(items: &[Value]) -> Value {
    if items.is_empty() {
        return Value::Null;
    }
    let count = items.len();
    let exact = decimal_sum(items)
        .and_then(|sum| sum.checked_div(Decimal::from(count)))
        .and_then(|avg| avg.to_f64());
    match exact {
        Some(avg) => Value::Float(avg),
        None => Value::Float(float_sum(items) / count as f64),
    }
}

/// contains(array|string, any)
fn fn_contains(subject: &Value, search: &Value) -> Value {
    let found = match (subject, search) {
        (Value::Array(items), needle) => items.iter().any(|item| item == needle),
        (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
        _ => false,
    };
    Value::Boolean(found)
}

/// join(glue, array[string])
fn fn_join(glue: &str, items: &[Value]) -> Value {
    let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
    Value::String(parts.join(glue))
}

fn fn_keys(object: &Value) -> Value {
    match object {
        Value::Object(obj) => Value::Array(obj.keys().map(|k| Value::String(k.clone())).collect()),
        _ => Value::Null,
    }
}

fn fn_values(object: &Value) -> Value {
    match object {
        Value::Object(obj) => Value::Array(obj.values().cloned().collect()),
        _ => Value::Null,
    }
}

/// length(string|array|object) - strings count characters, not bytes
fn fn_length(subject: &Value) -> Value {
    let len = match subject {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(obj) => obj.len(),
        _ => return Value::Null,
    };
    Value::Integer(len as i64)
}

/// max / min over numbers or strings; null for an empty array
fn extreme(items: &[Value], want: Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for item in items {
        match best {
            None => best = Some(item),
            Some(b) if item.compare(b) == Some(want) => best = Some(item),
            _ => {}
        }
    }
    best.cloned().unwrap_or(Value::Null)
}

/// merge(object...) - later keys win
fn fn_merge(args: &[Arg<'_>]) -> Value {
    let mut merged = Map::new();
    for arg in args {
        if let Arg::Value(Value::Object(obj)) = arg {
            for (k, v) in obj.iter() {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    Value::Object(merged)
}

/// not_null(any...) - first argument that isn't null
fn fn_not_null(args: &[Arg<'_>]) -> Value {
    args.iter()
        .find_map(|arg| match arg {
            Arg::Value(v) if !v.is_null() => Some(v.clone()),
            _ => None,
        })
        .unwrap_or(Value::Null)
}

fn fn_reverse(subject: &Value) -> Value {
    match subject {
        Value::Array(items) => Value::Array(items.iter().rev().cloned().collect()),
        Value::String(s) => Value::String(s.chars().rev().collect()),
        _ => Value::Null,
    }
}

/// sort(array[number]|array[string]) - strings sort by code point
fn fn_sort(items: &[Value]) -> Value {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));
    Value::Array(sorted)
}

fn fn_to_array(v: &Value) -> Value {
    match v {
        Value::Array(_) => v.clone(),
        other => Value::Array(vec![other.clone()]),
    }
}

/// to_number(any) - numbers pass through, numeric strings parse, the rest
/// is null
fn fn_to_number(v: &Value) -> Value {
    match v {
        Value::Integer(_) | Value::Float(_) => v.clone(),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                Value::Integer(i)
            } else {
                match s.parse::<f64>() {
                    Ok(f) if f.is_finite() => Value::Float(f),
                    _ => Value::Null,
                }
            }
        }
        _ => Value::Null,
    }
}

/// to_string(any) - strings pass through, everything else is JSON-encoded
fn fn_to_string(v: &Value) -> Value {
    match v {
        Value::String(_) => v.clone(),
        other => Value::String(crate::output::to_json(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_sorted_and_unique() {
        let names: Vec<&str> = FUNCTIONS.iter().map(|s| s.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn arity_messages() {
        let length = lookup("length").unwrap();
        assert_eq!(length.check_arity(2), Err("expected 1 argument(s), got 2".to_string()));
        let merge = lookup("merge").unwrap();
        assert!(merge.check_arity(0).is_err());
        assert!(merge.check_arity(3).is_ok());
    }

    #[test]
    fn string_parameters_accept_strings() {
        let reverse = lookup("reverse").unwrap();
        assert!(reverse.validate(&[Arg::Value(Value::from("abc"))]).is_ok());
        assert!(reverse.validate(&[Arg::Value(Value::Integer(1))]).is_err());
        let length = lookup("length").unwrap();
        assert_eq!(length.check_arity(0), Err("expected 1 argument(s), got 0".to_string()));
    }

    #[test]
    fn sum_keeps_integers() {
        assert_eq!(fn_sum(&[Value::Integer(1), Value::Integer(2)]), Value::Integer(3));
        assert_eq!(fn_sum(&[Value::Float(0.1), Value::Float(0.2)]), Value::Float(0.3));
        assert_eq!(fn_sum(&[]), Value::Integer(0));
    }
}
