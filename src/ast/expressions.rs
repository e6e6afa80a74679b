use crate::ast::Comparator;
use crate::value::Value;

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Nodes are built bottom-up by the parser from already-parsed children and
/// never change afterwards. Projection scope is part of the tree shape: the
/// `rhs` of a [`Expr::Projection`] holds exactly the operations applied to
/// each element.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Access
    /// Field access by name
    ///
    /// # Examples
    /// ```text
    /// foo
    /// "with space"
    /// ```
    Field(String),

    /// Array index, negative values count from the end
    ///
    /// # Examples
    /// ```text
    /// [0]
    /// [-1]
    /// ```
    Index(i64),

    /// Python-style array slice
    ///
    /// # Examples
    /// ```text
    /// [1:3]
    /// [::-1]
    /// ```
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },

    /// Merges one level of nested arrays produced by the inner expression
    Flatten(Box<Expr>),

    /// Values of an object, in key order (the `*` wildcard)
    ObjectValues(Box<Expr>),

    // Composition
    /// Dot-chained access: `rhs` runs against the result of `lhs`
    Subexpression { lhs: Box<Expr>, rhs: Box<Expr> },

    /// `lhs | rhs`: `rhs` sees the whole result of `lhs`
    Pipe { lhs: Box<Expr>, rhs: Box<Expr> },

    /// Applies `rhs` to each element of the array produced by `lhs`
    ///
    /// # Examples
    /// ```text
    /// foo[*].bar
    /// foo[].bar
    /// foo.*.bar
    /// ```
    Projection { lhs: Box<Expr>, rhs: Box<Expr> },

    /// Projection that keeps only elements matching `predicate`
    ///
    /// # Example
    /// ```text
    /// people[?age > `20`].name
    /// ```
    FilterProjection {
        lhs: Box<Expr>,
        predicate: Box<Expr>,
        rhs: Box<Expr>,
    },

    // Construction
    /// `[a, b, c]` evaluated against the current node
    MultiSelectList(Vec<Expr>),

    /// `{k: a, j: b}` evaluated against the current node, keys kept in order
    MultiSelectHash(Vec<(String, Expr)>),

    // Logic
    /// `lhs || rhs`
    Or { lhs: Box<Expr>, rhs: Box<Expr> },

    /// `lhs && rhs`
    And { lhs: Box<Expr>, rhs: Box<Expr> },

    /// `!expr`
    Not(Box<Expr>),

    /// Equality or ordering comparison
    Comparison {
        op: Comparator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    // Functions
    /// Built-in function call
    ///
    /// # Example
    /// ```text
    /// length(foo)
    /// sort_by(people, &age)
    /// ```
    FunctionCall { name: String, args: Vec<Expr> },

    /// `&expr`, an unevaluated expression handed to a function
    ExpressionRef(Box<Expr>),

    // Leaves
    /// `@`
    CurrentNode,

    /// Constant from a `` `json` `` or `'raw'` literal
    Literal(Value),
}

impl Expr {
    /// Node kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Field(_) => "Field",
            Expr::Index(_) => "Index",
            Expr::Slice { .. } => "Slice",
            Expr::Flatten(_) => "Flatten",
            Expr::ObjectValues(_) => "ObjectValues",
            Expr::Subexpression { .. } => "Subexpression",
            Expr::Pipe { .. } => "Pipe",
            Expr::Projection { .. } => "Projection",
            Expr::FilterProjection { .. } => "FilterProjection",
            Expr::MultiSelectList(_) => "MultiSelectList",
            Expr::MultiSelectHash(_) => "MultiSelectHash",
            Expr::Or { .. } => "Or",
            Expr::And { .. } => "And",
            Expr::Not(_) => "Not",
            Expr::Comparison { .. } => "Comparison",
            Expr::FunctionCall { .. } => "FunctionCall",
            Expr::ExpressionRef(_) => "ExpressionRef",
            Expr::CurrentNode => "CurrentNode",
            Expr::Literal(_) => "Literal",
        }
    }

    pub fn field(name: impl Into<String>) -> Expr {
        Expr::Field(name.into())
    }

    pub fn subexpr(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Subexpression {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn pipe(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Pipe {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn projection(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Projection {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn filter_projection(lhs: Expr, predicate: Expr, rhs: Expr) -> Expr {
        Expr::FilterProjection {
            lhs: Box::new(lhs),
            predicate: Box::new(predicate),
            rhs: Box::new(rhs),
        }
    }

    pub fn comparison(op: Comparator, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Or {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::And {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn not(inner: Expr) -> Expr {
        Expr::Not(Box::new(inner))
    }

    pub fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }
}
