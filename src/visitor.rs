//! Double dispatch over the expression tree.
//!
//! Every backend (the evaluator, the code generator, the printer) implements
//! [`Visitor`] for the input it threads through the walk and the output it
//! produces. [`Expr::accept`] is the one place that matches on the node kind,
//! so a new backend only needs a new `Visitor` impl, and a new node kind
//! fails to compile until every backend handles it.

use crate::ast::{Comparator, Expr};
use crate::value::Value;

pub trait Visitor<Input> {
    type Output;

    fn visit_field(&mut self, name: &str, input: Input) -> Self::Output;
    fn visit_index(&mut self, index: i64, input: Input) -> Self::Output;
    fn visit_slice(
        &mut self,
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
        input: Input,
    ) -> Self::Output;
    fn visit_flatten(&mut self, inner: &Expr, input: Input) -> Self::Output;
    fn visit_object_values(&mut self, inner: &Expr, input: Input) -> Self::Output;
    fn visit_subexpression(&mut self, lhs: &Expr, rhs: &Expr, input: Input) -> Self::Output;
    fn visit_pipe(&mut self, lhs: &Expr, rhs: &Expr, input: Input) -> Self::Output;
    fn visit_projection(&mut self, lhs: &Expr, rhs: &Expr, input: Input) -> Self::Output;
    fn visit_filter_projection(
        &mut self,
        lhs: &Expr,
        predicate: &Expr,
        rhs: &Expr,
        input: Input,
    ) -> Self::Output;
    fn visit_multi_select_list(&mut self, items: &[Expr], input: Input) -> Self::Output;
    fn visit_multi_select_hash(&mut self, pairs: &[(String, Expr)], input: Input) -> Self::Output;
    fn visit_or(&mut self, lhs: &Expr, rhs: &Expr, input: Input) -> Self::Output;
    fn visit_and(&mut self, lhs: &Expr, rhs: &Expr, input: Input) -> Self::Output;
    fn visit_not(&mut self, inner: &Expr, input: Input) -> Self::Output;
    fn visit_comparison(
        &mut self,
        op: Comparator,
        lhs: &Expr,
        rhs: &Expr,
        input: Input,
    ) -> Self::Output;
    fn visit_function_call(&mut self, name: &str, args: &[Expr], input: Input) -> Self::Output;
    fn visit_expression_ref(&mut self, inner: &Expr, input: Input) -> Self::Output;
    fn visit_current_node(&mut self, input: Input) -> Self::Output;
    fn visit_literal(&mut self, value: &Value, input: Input) -> Self::Output;
}

impl Expr {
    /// Forwards to the visitor method for this node's kind.
    pub fn accept<I, V: Visitor<I> + ?Sized>(&self, visitor: &mut V, input: I) -> V::Output {
        match self {
            Expr::Field(name) => visitor.visit_field(name, input),
            Expr::Index(index) => visitor.visit_index(*index, input),
            Expr::Slice { start, stop, step } => visitor.visit_slice(*start, *stop, *step, input),
            Expr::Flatten(inner) => visitor.visit_flatten(inner, input),
            Expr::ObjectValues(inner) => visitor.visit_object_values(inner, input),
            Expr::Subexpression { lhs, rhs } => visitor.visit_subexpression(lhs, rhs, input),
            Expr::Pipe { lhs, rhs } => visitor.visit_pipe(lhs, rhs, input),
            Expr::Projection { lhs, rhs } => visitor.visit_projection(lhs, rhs, input),
            Expr::FilterProjection {
                lhs,
                predicate,
                rhs,
            } => visitor.visit_filter_projection(lhs, predicate, rhs, input),
            Expr::MultiSelectList(items) => visitor.visit_multi_select_list(items, input),
            Expr::MultiSelectHash(pairs) => visitor.visit_multi_select_hash(pairs, input),
            Expr::Or { lhs, rhs } => visitor.visit_or(lhs, rhs, input),
            Expr::And { lhs, rhs } => visitor.visit_and(lhs, rhs, input),
            Expr::Not(inner) => visitor.visit_not(inner, input),
            Expr::Comparison { op, lhs, rhs } => visitor.visit_comparison(*op, lhs, rhs, input),
            Expr::FunctionCall { name, args } => visitor.visit_function_call(name, args, input),
            Expr::ExpressionRef(inner) => visitor.visit_expression_ref(inner, input),
            Expr::CurrentNode => visitor.visit_current_node(input),
            Expr::Literal(value) => visitor.visit_literal(value, input),
        }
    }
}
