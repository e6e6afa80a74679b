use log::trace;
use thiserror::Error;

use crate::{
    ast::{Comparator, Expr},
    functions::Arg,
    node::{DataNode, NodeKind},
    value::{Map, Value},
    visitor::Visitor,
};

/// Errors that can occur during evaluation.
///
/// Missing data is never an error; it evaluates to `null`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// An operation got a value of a type it cannot work with
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A built-in was called with the wrong number or type of arguments
    #[error("invalid arguments to {function}(): {message}")]
    FunctionArgument { function: String, message: String },
}

impl EvalError {
    pub fn function_argument(function: &str, message: impl Into<String>) -> Self {
        EvalError::FunctionArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// An intermediate result: a node of the input, or a value the expression
/// built.
///
/// Field, index and `@` steps hand back borrowed nodes, so walking a path
/// through a large document copies nothing until the final result is taken.
pub enum Selection<'a, N: ?Sized> {
    Borrowed(&'a N),
    Owned(Value),
}

impl<'a, N: DataNode + ?Sized> Selection<'a, N> {
    fn null() -> Self {
        Selection::Owned(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        match self {
            Selection::Borrowed(node) => node.is_null(),
            Selection::Owned(value) => value.is_null(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Selection::Borrowed(node) => is_truthy_node(*node),
            Selection::Owned(value) => value.is_truthy(),
        }
    }

    /// The result as an owned value, copying it out of the input if it
    /// was borrowed.
    pub fn into_value(self) -> Value {
        match self {
            Selection::Borrowed(node) => Value::from_node(node),
            Selection::Owned(value) => value,
        }
    }
}

fn is_truthy_node<N: DataNode + ?Sized>(node: &N) -> bool {
    match node.kind() {
        NodeKind::Null => false,
        NodeKind::Boolean => node.as_bool().unwrap_or(false),
        NodeKind::Number => true,
        NodeKind::String => node.as_str().is_some_and(|s| !s.is_empty()),
        NodeKind::Array | NodeKind::Object => node.length() > 0,
    }
}

/// Tree-walking evaluator over any [`DataNode`] tree.
///
/// Holds no state between calls; one instance can evaluate any number of
/// expressions.
#[derive(Debug, Default, Clone, Copy)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Evaluator
    }

    pub fn evaluate<N: DataNode + ?Sized>(&mut self, expr: &Expr, data: &N) -> Result<Value, EvalError> {
        trace!("evaluating {} against {:?}", expr.kind_name(), data.kind());
        expr.accept(self, data).map(Selection::into_value)
    }

    /// Evaluates `rhs` against an earlier result.
    fn apply<'a, N: DataNode + ?Sized>(
        &mut self,
        left: Selection<'a, N>,
        rhs: &Expr,
    ) -> Result<Selection<'a, N>, EvalError> {
        match left {
            Selection::Borrowed(node) => rhs.accept(self, node),
            Selection::Owned(value) => Ok(Selection::Owned(self.evaluate(rhs, &value)?)),
        }
    }

    /// Evaluates `rhs` on each element that passes `predicate`, keeping only
    /// non-null results.
    fn project<'b, M: DataNode + ?Sized + 'b>(
        &mut self,
        items: impl Iterator<Item = &'b M>,
        predicate: Option<&Expr>,
        rhs: &Expr,
    ) -> Result<Value, EvalError> {
        let mut result = Vec::new();
        let mut seen = 0;
        for item in items {
            seen += 1;
            if let Some(predicate) = predicate
                && !predicate.accept(self, item)?.is_truthy()
            {
                continue;
            }
            let projected = rhs.accept(self, item)?;
            if !projected.is_null() {
                result.push(projected.into_value());
            }
        }
        trace!("projected {} of {} element(s)", result.len(), seen);
        Ok(Value::Array(result))
    }

    /// Projects over an array result; anything else gives null.
    fn project_array<'a, N: DataNode + ?Sized>(
        &mut self,
        left: Selection<'a, N>,
        predicate: Option<&Expr>,
        rhs: &Expr,
    ) -> Result<Selection<'a, N>, EvalError> {
        let projected = match left {
            Selection::Borrowed(node) if node.is_array() => {
                self.project(node.iterate(), predicate, rhs)?
            }
            Selection::Owned(Value::Array(items)) => self.project(items.iter(), predicate, rhs)?,
            _ => Value::Null,
        };
        Ok(Selection::Owned(projected))
    }
}

impl<'a, N: DataNode + ?Sized + 'a> Visitor<&'a N> for Evaluator {
    type Output = Result<Selection<'a, N>, EvalError>;

    fn visit_field(&mut self, name: &str, input: &'a N) -> Self::Output {
        Ok(input
            .get_field(name)
            .map_or_else(Selection::null, Selection::Borrowed))
    }

    fn visit_index(&mut self, index: i64, input: &'a N) -> Self::Output {
        if !input.is_array() {
            return Ok(Selection::null());
        }
        Ok(resolve_index(input.length(), index)
            .and_then(|i| input.get_index(i))
            .map_or_else(Selection::null, Selection::Borrowed))
    }

    fn visit_slice(
        &mut self,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
        input: &'a N,
    ) -> Self::Output {
        if !input.is_array() {
            return Ok(Selection::null());
        }
        let items = slice_indices(input.length(), start, stop, step)
            .into_iter()
            .filter_map(|i| input.get_index(i))
            .map(Value::from_node)
            .collect();
        Ok(Selection::Owned(Value::Array(items)))
    }

    fn visit_flatten(&mut self, inner: &Expr, input: &'a N) -> Self::Output {
        let flattened = match inner.accept(self, input)? {
            Selection::Borrowed(node) if node.is_array() => flatten_node(node),
            Selection::Owned(value) => flatten(value),
            Selection::Borrowed(_) => Value::Null,
        };
        Ok(Selection::Owned(flattened))
    }

    fn visit_object_values(&mut self, inner: &Expr, input: &'a N) -> Self::Output {
        let values = match inner.accept(self, input)? {
            Selection::Borrowed(node) if node.is_object() => {
                Value::Array(node.entries().map(|(_, v)| Value::from_node(v)).collect())
            }
            Selection::Owned(Value::Object(obj)) => Value::Array(obj.into_values().collect()),
            _ => Value::Null,
        };
        Ok(Selection::Owned(values))
    }

    fn visit_subexpression(&mut self, lhs: &Expr, rhs: &Expr, input: &'a N) -> Self::Output {
        let left = lhs.accept(self, input)?;
        if left.is_null() {
            return Ok(Selection::null());
        }
        self.apply(left, rhs)
    }

    fn visit_pipe(&mut self, lhs: &Expr, rhs: &Expr, input: &'a N) -> Self::Output {
        let left = lhs.accept(self, input)?;
        self.apply(left, rhs)
    }

    fn visit_projection(&mut self, lhs: &Expr, rhs: &Expr, input: &'a N) -> Self::Output {
        // `*` projects straight over the object's values
        if let Expr::ObjectValues(inner) = lhs {
            let projected = match inner.accept(self, input)? {
                Selection::Borrowed(node) if node.is_object() => {
                    self.project(node.entries().map(|(_, v)| v), None, rhs)?
                }
                Selection::Owned(Value::Object(obj)) => self.project(obj.values(), None, rhs)?,
                _ => Value::Null,
            };
            return Ok(Selection::Owned(projected));
        }
        let left = lhs.accept(self, input)?;
        self.project_array(left, None, rhs)
    }

    fn visit_filter_projection(
        &mut self,
        lhs: &Expr,
        predicate: &Expr,
        rhs: &Expr,
        input: &'a N,
    ) -> Self::Output {
        let left = lhs.accept(self, input)?;
        self.project_array(left, Some(predicate), rhs)
    }

    fn visit_multi_select_list(&mut self, items: &[Expr], input: &'a N) -> Self::Output {
        if input.is_null() {
            return Ok(Selection::null());
        }
        let mut result = Vec::with_capacity(items.len());
        for item in items {
            result.push(item.accept(self, input)?.into_value());
        }
        Ok(Selection::Owned(Value::Array(result)))
    }

    fn visit_multi_select_hash(&mut self, pairs: &[(String, Expr)], input: &'a N) -> Self::Output {
        if input.is_null() {
            return Ok(Selection::null());
        }
        let mut result = Map::with_capacity(pairs.len());
        for (key, expr) in pairs {
            result.insert(key.clone(), expr.accept(self, input)?.into_value());
        }
        Ok(Selection::Owned(Value::Object(result)))
    }

    fn visit_or(&mut self, lhs: &Expr, rhs: &Expr, input: &'a N) -> Self::Output {
        let left = lhs.accept(self, input)?;
        if left.is_truthy() {
            Ok(left)
        } else {
            rhs.accept(self, input)
        }
    }

    fn visit_and(&mut self, lhs: &Expr, rhs: &Expr, input: &'a N) -> Self::Output {
        let left = lhs.accept(self, input)?;
        if left.is_truthy() {
            rhs.accept(self, input)
        } else {
            Ok(left)
        }
    }

    fn visit_not(&mut self, inner: &Expr, input: &'a N) -> Self::Output {
        let value = inner.accept(self, input)?;
        Ok(Selection::Owned(Value::Boolean(!value.is_truthy())))
    }

    fn visit_comparison(
        &mut self,
        op: Comparator,
        lhs: &Expr,
        rhs: &Expr,
        input: &'a N,
    ) -> Self::Output {
        let left = lhs.accept(self, input)?.into_value();
        let right = rhs.accept(self, input)?.into_value();
        Ok(Selection::Owned(compare_values(op, &left, &right)))
    }

    fn visit_function_call(&mut self, name: &str, args: &[Expr], input: &'a N) -> Self::Output {
        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(match arg {
                Expr::ExpressionRef(inner) => Arg::Expref(inner),
                other => Arg::Value(other.accept(self, input)?.into_value()),
            });
        }
        self.call_function(name, evaluated).map(Selection::Owned)
    }

    fn visit_expression_ref(&mut self, _inner: &Expr, _input: &'a N) -> Self::Output {
        Err(EvalError::TypeMismatch(
            "an expression reference can only be passed to a function".to_string(),
        ))
    }

    fn visit_current_node(&mut self, input: &'a N) -> Self::Output {
        Ok(Selection::Borrowed(input))
    }

    fn visit_literal(&mut self, value: &Value, _input: &'a N) -> Self::Output {
        Ok(Selection::Owned(value.clone()))
    }
}

/// Position of `index` in a sequence of `len`, counting from the end when
/// negative.
pub fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let i = if index < 0 { len as i64 + index } else { index };
    usize::try_from(i).ok().filter(|&i| i < len)
}

/// Clamps a slice endpoint into range, counting negatives from the end.
fn adjust_endpoint(len: i64, endpoint: i64, step: i64) -> i64 {
    if endpoint < 0 {
        let shifted = endpoint + len;
        if shifted >= 0 {
            shifted
        } else if step < 0 {
            -1
        } else {
            0
        }
    } else if endpoint >= len {
        if step < 0 { len - 1 } else { len }
    } else {
        endpoint
    }
}

/// Positions selected by `[start:stop:step]` in a sequence of `len`, with
/// Python semantics. A zero step selects nothing.
pub fn slice_indices(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Vec<usize> {
    let len = len as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return Vec::new();
    }

    let (mut i, stop) = if step > 0 {
        (
            start.map_or(0, |s| adjust_endpoint(len, s, step)),
            stop.map_or(len, |s| adjust_endpoint(len, s, step)),
        )
    } else {
        (
            start.map_or(len - 1, |s| adjust_endpoint(len, s, step)),
            stop.map_or(-1, |s| adjust_endpoint(len, s, step)),
        )
    };

    let mut result = Vec::new();
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if (0..len).contains(&i) {
            result.push(i as usize);
        }
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    result
}

/// [`flatten`] over a borrowed array node.
fn flatten_node<N: DataNode + ?Sized>(node: &N) -> Value {
    let mut result = Vec::with_capacity(node.length());
    for item in node.iterate() {
        if item.is_array() {
            result.extend(item.iterate().map(Value::from_node));
        } else {
            result.push(Value::from_node(item));
        }
    }
    Value::Array(result)
}

/// Merges nested arrays one level deep; non-arrays give null.
pub fn flatten(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            let mut result = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Array(inner) => result.extend(inner),
                    other => result.push(other),
                }
            }
            Value::Array(result)
        }
        _ => Value::Null,
    }
}

/// `==` and `!=` compare any values structurally. Ordering operators only
/// apply to numbers; anything else compares to null.
pub fn compare_values(op: Comparator, left: &Value, right: &Value) -> Value {
    if op.is_ordering() && !(left.is_number() && right.is_number()) {
        return Value::Null;
    }
    match op {
        Comparator::Equal => Value::Boolean(left == right),
        Comparator::NotEqual => Value::Boolean(left != right),
        _ => match left.compare(right) {
            Some(ordering) => Value::Boolean(match op {
                Comparator::LessThan => ordering.is_lt(),
                Comparator::LessEqual => ordering.is_le(),
                Comparator::GreaterThan => ordering.is_gt(),
                Comparator::GreaterEqual => ordering.is_ge(),
                Comparator::Equal | Comparator::NotEqual => false,
            }),
            None => Value::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_steps() {
        assert_eq!(slice_indices(6, None, None, Some(2)), vec![0, 2, 4]);
        assert_eq!(slice_indices(6, None, None, Some(-1)), vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(slice_indices(6, Some(-2), None, None), vec![4, 5]);
        assert_eq!(slice_indices(6, Some(10), None, None), Vec::<usize>::new());
        assert_eq!(slice_indices(6, Some(4), Some(1), Some(-2)), vec![4, 2]);
        assert_eq!(slice_indices(0, None, None, Some(-1)), Vec::<usize>::new());
    }

    #[test]
    fn test_negative_index() {
        assert_eq!(resolve_index(3, -1), Some(2));
        assert_eq!(resolve_index(3, -4), None);
        assert_eq!(resolve_index(3, 3), None);
    }

    #[test]
    fn test_borrowed_results_stay_borrowed() {
        let data = Value::from(serde_json::json!({"a": {"b": [1, 2]}}));
        let b = data.get_field("a").and_then(|a| a.get_field("b")).unwrap();
        let expr = crate::compile("a.b").unwrap();
        match expr.as_ast().accept(&mut Evaluator::new(), &data).unwrap() {
            Selection::Borrowed(node) => assert!(std::ptr::eq(node, b)),
            Selection::Owned(_) => panic!("field path was copied"),
        }
    }

    #[test]
    fn test_ordering_needs_numbers() {
        let a = Value::from("a");
        let b = Value::from("b");
        assert_eq!(compare_values(Comparator::LessThan, &a, &b), Value::Null);
        assert_eq!(
            compare_values(Comparator::LessThan, &Value::Integer(1), &Value::Float(1.5)),
            Value::Boolean(true)
        );
        assert_eq!(compare_values(Comparator::Equal, &a, &a), Value::Boolean(true));
    }
}
