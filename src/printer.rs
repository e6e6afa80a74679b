//! Expression text for an [`Expr`].
//!
//! [`Printer`] walks the tree and writes it back out in canonical form:
//! single spaces around binary operators, `, ` between arguments, literals as
//! `` `json` ``. Children are parenthesized whenever printing them bare would
//! make the parser build a different tree, so parsing the printed text of a
//! parsed expression gives back an equal tree.

use std::fmt;

use crate::{
    ast::{Comparator, Expr},
    value::Value,
    visitor::Visitor,
};

/// How loosely a node holds together when followed or surrounded by other
/// syntax. Higher levels need parentheses in more places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level {
    /// Survives any postfix `[...]`: names, literals, calls, `x[0]`
    Primary,
    /// A `.` chain or `!x`; survives `.name`, `[?` and `[]`
    Chain,
    /// Open-ended on the right; only `[]` ends it
    Projection,
    /// Binary operators
    Operator,
}

fn level(expr: &Expr) -> Level {
    match expr {
        Expr::Field(_)
        | Expr::Index(_)
        | Expr::Slice { .. }
        | Expr::CurrentNode
        | Expr::Literal(_)
        | Expr::MultiSelectList(_)
        | Expr::MultiSelectHash(_)
        | Expr::FunctionCall { .. }
        | Expr::ExpressionRef(_) => Level::Primary,
        Expr::Subexpression { rhs, .. } if matches!(**rhs, Expr::Index(_)) => Level::Primary,
        Expr::Subexpression { .. } | Expr::Not(_) => Level::Chain,
        Expr::Projection { .. }
        | Expr::FilterProjection { .. }
        | Expr::Flatten(_)
        | Expr::ObjectValues(_) => Level::Projection,
        Expr::Comparison { .. } | Expr::And { .. } | Expr::Or { .. } | Expr::Pipe { .. } => {
            Level::Operator
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A field name as written in an expression, quoted when it isn't a bare
/// identifier.
pub fn field_name(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name))
    }
}

fn slice_text(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> String {
    let part = |n: Option<i64>| n.map(|n| n.to_string()).unwrap_or_default();
    match step {
        Some(step) => format!("[{}:{}:{}]", part(start), part(stop), step),
        None => format!("[{}:{}]", part(start), part(stop)),
    }
}

pub struct Printer;

impl Printer {
    pub fn print(expr: &Expr) -> String {
        expr.accept(&mut Printer, ())
    }

    /// Prints `expr`, parenthesized if it is looser than `max`.
    fn wrapped(&mut self, expr: &Expr, max: Level) -> String {
        let text = expr.accept(self, ());
        if level(expr) > max {
            format!("({})", text)
        } else {
            text
        }
    }

    /// Left side of a postfix form; `@` disappears since `[0]`, `[*]` and
    /// friends already apply to the current node.
    fn postfix_lhs(&mut self, expr: &Expr, max: Level) -> String {
        match expr {
            Expr::CurrentNode => String::new(),
            other => self.wrapped(other, max),
        }
    }

    /// What follows a projection: nothing for `@`, brackets directly,
    /// anything else after a dot.
    fn projection_rhs(&mut self, rhs: &Expr) -> String {
        if *rhs == Expr::CurrentNode {
            return String::new();
        }
        let text = rhs.accept(self, ());
        if text.starts_with('[') {
            text
        } else {
            format!(".{}", text)
        }
    }

    fn binary(&mut self, op: &str, lhs: &Expr, rhs: &Expr, same: fn(&Expr) -> bool, max: Level) -> String {
        let left = if same(lhs) {
            lhs.accept(self, ())
        } else {
            self.wrapped(lhs, max)
        };
        let right = self.wrapped(rhs, max);
        format!("{} {} {}", left, op, right)
    }
}

impl Visitor<()> for Printer {
    type Output = String;

    fn visit_field(&mut self, name: &str, _: ()) -> String {
        field_name(name)
    }

    fn visit_index(&mut self, index: i64, _: ()) -> String {
        format!("[{}]", index)
    }

    fn visit_slice(&mut self, start: Option<i64>, stop: Option<i64>, step: Option<i64>, _: ()) -> String {
        slice_text(start, stop, step)
    }

    fn visit_flatten(&mut self, inner: &Expr, _: ()) -> String {
        format!("{}[]", self.postfix_lhs(inner, Level::Projection))
    }

    fn visit_object_values(&mut self, inner: &Expr, _: ()) -> String {
        match inner {
            Expr::CurrentNode => "*".to_string(),
            other => format!("{}.*", self.wrapped(other, Level::Chain)),
        }
    }

    fn visit_subexpression(&mut self, lhs: &Expr, rhs: &Expr, _: ()) -> String {
        match rhs {
            Expr::Index(_) | Expr::Slice { .. } => {
                let left = self.wrapped(lhs, Level::Primary);
                format!("{}{}", left, rhs.accept(self, ()))
            }
            _ => {
                let left = self.wrapped(lhs, Level::Chain);
                format!("{}.{}", left, rhs.accept(self, ()))
            }
        }
    }

    fn visit_pipe(&mut self, lhs: &Expr, rhs: &Expr, _: ()) -> String {
        let left = lhs.accept(self, ());
        let right = match rhs {
            Expr::Pipe { .. } => format!("({})", rhs.accept(self, ())),
            _ => rhs.accept(self, ()),
        };
        format!("{} | {}", left, right)
    }

    fn visit_projection(&mut self, lhs: &Expr, rhs: &Expr, _: ()) -> String {
        let left = match lhs {
            Expr::ObjectValues(_) | Expr::Slice { .. } => lhs.accept(self, ()),
            Expr::Flatten(inner) => format!("{}[]", self.postfix_lhs(inner, Level::Projection)),
            Expr::Subexpression { lhs: inner, rhs: slice } if matches!(**slice, Expr::Slice { .. }) => {
                let prefix = self.postfix_lhs(inner, Level::Primary);
                format!("{}{}", prefix, slice.accept(self, ()))
            }
            other => format!("{}[*]", self.postfix_lhs(other, Level::Primary)),
        };
        format!("{}{}", left, self.projection_rhs(rhs))
    }

    fn visit_filter_projection(&mut self, lhs: &Expr, predicate: &Expr, rhs: &Expr, _: ()) -> String {
        let left = self.postfix_lhs(lhs, Level::Chain);
        let predicate = predicate.accept(self, ());
        format!("{}[?{}]{}", left, predicate, self.projection_rhs(rhs))
    }

    fn visit_multi_select_list(&mut self, items: &[Expr], _: ()) -> String {
        let items: Vec<String> = items.iter().map(|e| e.accept(self, ())).collect();
        format!("[{}]", items.join(", "))
    }

    fn visit_multi_select_hash(&mut self, pairs: &[(String, Expr)], _: ()) -> String {
        let pairs: Vec<String> = pairs
            .iter()
            .map(|(key, e)| format!("{}: {}", field_name(key), e.accept(self, ())))
            .collect();
        format!("{{{}}}", pairs.join(", "))
    }

    fn visit_or(&mut self, lhs: &Expr, rhs: &Expr, _: ()) -> String {
        let left = match lhs {
            Expr::Pipe { .. } => format!("({})", lhs.accept(self, ())),
            _ => lhs.accept(self, ()),
        };
        let right = match rhs {
            Expr::Pipe { .. } | Expr::Or { .. } => format!("({})", rhs.accept(self, ())),
            _ => rhs.accept(self, ()),
        };
        format!("{} || {}", left, right)
    }

    fn visit_and(&mut self, lhs: &Expr, rhs: &Expr, _: ()) -> String {
        let tight = |e: &Expr| matches!(e, Expr::And { .. } | Expr::Comparison { .. });
        let left = if tight(lhs) || level(lhs) < Level::Operator {
            lhs.accept(self, ())
        } else {
            format!("({})", lhs.accept(self, ()))
        };
        let right = match rhs {
            Expr::Comparison { .. } => rhs.accept(self, ()),
            _ => self.wrapped(rhs, Level::Projection),
        };
        format!("{} && {}", left, right)
    }

    fn visit_not(&mut self, inner: &Expr, _: ()) -> String {
        format!("!{}", self.wrapped(inner, Level::Primary))
    }

    fn visit_comparison(&mut self, op: Comparator, lhs: &Expr, rhs: &Expr, _: ()) -> String {
        self.binary(
            op.as_str(),
            lhs,
            rhs,
            |e| matches!(e, Expr::Comparison { .. }),
            Level::Projection,
        )
    }

    fn visit_function_call(&mut self, name: &str, args: &[Expr], _: ()) -> String {
        let args: Vec<String> = args.iter().map(|e| e.accept(self, ())).collect();
        format!("{}({})", name, args.join(", "))
    }

    fn visit_expression_ref(&mut self, inner: &Expr, _: ()) -> String {
        format!("&{}", inner.accept(self, ()))
    }

    fn visit_current_node(&mut self, _: ()) -> String {
        "@".to_string()
    }

    fn visit_literal(&mut self, value: &Value, _: ()) -> String {
        format!("`{}`", crate::output::to_json(value).replace('`', "\\`"))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Printer::print(self))
    }
}
