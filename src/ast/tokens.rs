use crate::ast::Comparator;
use crate::value::Value;

/// A lexical token with its source text and 0-based character offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source slice this token was read from
    pub text: String,
    /// Character offset of the token's first character
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Left binding power used by the parser's precedence climbing.
    pub fn lbp(&self) -> usize {
        self.kind.lbp()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Names
    /// Unquoted field name or function name
    ///
    /// Must start with a letter or underscore, followed by letters, digits,
    /// or underscores.
    ///
    /// # Examples
    /// ```text
    /// foo
    /// item_count
    /// _internal
    /// ```
    Identifier(String),

    /// Quoted identifier, decoded from its JSON string form
    ///
    /// # Examples
    /// ```text
    /// "with space"
    /// "été"
    /// ```
    QuotedIdentifier(String),

    // Literals
    /// Integer used for indices and slices
    ///
    /// # Examples
    /// ```text
    /// 0
    /// -1
    /// ```
    Number(i64),

    /// Raw string literal enclosed in single quotes
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// 'it\'s'
    /// ```
    RawString(String),

    /// JSON literal enclosed in backticks
    ///
    /// # Examples
    /// ```text
    /// `{"a": 1}`
    /// `[1, 2]`
    /// `true`
    /// ```
    Literal(Value),

    // Access
    /// Sub-expression separator
    Dot,

    /// Wildcard, either `[*]` or `.*`
    Star,

    /// Left bracket for indices, slices, projections and multi-select lists
    LBracket,

    /// Right bracket
    RBracket,

    /// Left brace for multi-select hashes
    LBrace,

    /// Right brace
    RBrace,

    /// Flatten operator (`[]`)
    Flatten,

    /// Start of a filter projection (`[?`)
    Filter,

    /// Pipe (`|`), ends any projection to its left
    Pipe,

    // Logical
    /// Logical or (`||`)
    Or,

    /// Logical and (`&&`)
    And,

    /// Logical not (`!`)
    Not,

    /// One of `==`, `!=`, `<`, `<=`, `>`, `>=`
    Comparator(Comparator),

    // Misc
    /// Current node (`@`)
    At,

    /// Expression reference prefix (`&`)
    Ampersand,

    /// Left parenthesis for grouping or function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Separator for function arguments and multi-select items
    Comma,

    /// Slice separator and multi-select hash key separator
    Colon,

    /// End of input
    Eof,
}

impl TokenKind {
    pub fn lbp(&self) -> usize {
        match self {
            TokenKind::Pipe => 1,
            TokenKind::Or => 2,
            TokenKind::And => 3,
            TokenKind::Comparator(_) => 5,
            TokenKind::Flatten => 9,
            TokenKind::Star => 20,
            TokenKind::Filter => 21,
            TokenKind::Dot => 40,
            TokenKind::Not => 45,
            TokenKind::LBrace => 50,
            TokenKind::LBracket => 55,
            TokenKind::LParen => 60,
            _ => 0,
        }
    }

    /// Short human-readable description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::QuotedIdentifier(name) => format!("quoted identifier \"{}\"", name),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::RawString(_) => "raw string".to_string(),
            TokenKind::Literal(_) => "literal".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Flatten => "'[]'".to_string(),
            TokenKind::Filter => "'[?'".to_string(),
            TokenKind::Pipe => "'|'".to_string(),
            TokenKind::Or => "'||'".to_string(),
            TokenKind::And => "'&&'".to_string(),
            TokenKind::Not => "'!'".to_string(),
            TokenKind::Comparator(op) => format!("'{}'", op),
            TokenKind::At => "'@'".to_string(),
            TokenKind::Ampersand => "'&'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Eof => "end of expression".to_string(),
        }
    }
}
