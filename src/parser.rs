use crate::{
    ast::{Expr, Token, TokenKind},
    functions,
    lexer::{Lexer, SyntaxError},
    value::Value,
};

/// Tokens binding looser than this end a projection's right-hand side.
const PROJECTION_STOP: usize = 10;

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, SyntaxError> {
        Ok(Parser {
            tokens: lexer.tokenize()?,
            index: 0,
        })
    }

    fn current(&self) -> &Token {
        // `tokenize` always ends with Eof and `advance` never moves past it
        &self.tokens[self.index]
    }

    fn peek(&self, offset: usize) -> &TokenKind {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.index + offset).min(last)].kind
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    fn unexpected(&self, context: &str) -> SyntaxError {
        let token = self.current();
        SyntaxError::new(
            token.position,
            format!("unexpected {} {}", token.kind.describe(), context),
        )
    }

    /// Consumes a closing delimiter, reporting an unterminated group at the
    /// position of its opening delimiter when input runs out first.
    fn expect_close(&mut self, kind: TokenKind, open: &Token) -> Result<(), SyntaxError> {
        if self.check(&kind) {
            self.advance();
            return Ok(());
        }
        Err(self.missing_close(&kind, open))
    }

    /// An expression inside a group. Input that ends before the expression
    /// starts is an unclosed group, reported at its opening delimiter.
    fn parse_grouped(&mut self, close: TokenKind, open: &Token) -> Result<Expr, SyntaxError> {
        if self.check(&TokenKind::Eof) {
            return Err(self.missing_close(&close, open));
        }
        self.parse_expression(0)
    }

    fn missing_close(&self, kind: &TokenKind, open: &Token) -> SyntaxError {
        if self.check(&TokenKind::Eof) {
            return SyntaxError::new(
                open.position,
                format!("unclosed '{}': expected {}", open.text, kind.describe()),
            );
        }
        self.unexpected(&format!("(expected {})", kind.describe()))
    }

    /// Parses a complete expression; anything left over is an error.
    pub fn parse(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_expression(0)?;
        if !self.check(&TokenKind::Eof) {
            return Err(self.unexpected("after complete expression"));
        }
        Ok(expr)
    }

    /// Precedence climbing: keep folding infix operators into `left` while
    /// they bind tighter than `rbp`.
    pub fn parse_expression(&mut self, rbp: usize) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_prefix()?;
        while rbp < self.current().lbp() {
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    /// Parse expressions that can start an expression: names, literals,
    /// `@`, brackets, braces, `!`, `(`
    fn parse_prefix(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::At => {
                self.advance();
                Ok(Expr::CurrentNode)
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Field(name))
            }
            TokenKind::QuotedIdentifier(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    return Err(SyntaxError::new(
                        token.position,
                        "quoted identifiers cannot be used as function names",
                    ));
                }
                Ok(Expr::Field(name))
            }
            TokenKind::Literal(value) => {
                self.advance();
                Ok(Expr::Literal(value))
            }
            TokenKind::RawString(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::Star => {
                self.advance();
                let rhs = self.parse_projection_rhs(TokenKind::Star.lbp())?;
                Ok(Expr::projection(
                    Expr::ObjectValues(Box::new(Expr::CurrentNode)),
                    rhs,
                ))
            }
            TokenKind::LBracket => {
                self.advance();
                match self.peek(0).clone() {
                    TokenKind::Number(_) | TokenKind::Colon => {
                        self.parse_index_or_slice(Expr::CurrentNode, &token)
                    }
                    TokenKind::Star if *self.peek(1) == TokenKind::RBracket => {
                        self.advance();
                        self.advance();
                        let rhs = self.parse_projection_rhs(TokenKind::Star.lbp())?;
                        Ok(Expr::projection(Expr::CurrentNode, rhs))
                    }
                    _ => self.parse_multi_select_list(&token),
                }
            }
            TokenKind::Flatten => {
                self.advance();
                let rhs = self.parse_projection_rhs(TokenKind::Flatten.lbp())?;
                Ok(Expr::projection(
                    Expr::Flatten(Box::new(Expr::CurrentNode)),
                    rhs,
                ))
            }
            TokenKind::Filter => {
                self.advance();
                self.parse_filter(Expr::CurrentNode, &token)
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_multi_select_hash(&token)
            }
            TokenKind::Not => {
                self.advance();
                let inner = self.parse_expression(TokenKind::Not.lbp())?;
                Ok(Expr::not(inner))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_grouped(TokenKind::RParen, &token)?;
                self.expect_close(TokenKind::RParen, &token)?;
                Ok(expr)
            }
            TokenKind::Ampersand => Err(SyntaxError::new(
                token.position,
                "expression references ('&') are only valid as function arguments",
            )),
            TokenKind::Number(_) => Err(SyntaxError::new(
                token.position,
                format!(
                    "unexpected number '{}': numbers are only valid inside brackets",
                    token.text
                ),
            )),
            TokenKind::Eof => Err(SyntaxError::new(
                token.position,
                "unexpected end of expression: expected an expression",
            )),
            _ => Err(self.unexpected("at start of expression")),
        }
    }

    /// Parse operators that continue an expression: `.`, `[`, `|`, `||`,
    /// `&&`, comparators, `(`
    fn parse_infix(&mut self, left: Expr) -> Result<Expr, SyntaxError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Dot => {
                self.advance();
                let rhs = self.parse_dot(TokenKind::Dot.lbp())?;
                Ok(Expr::subexpr(left, rhs))
            }
            TokenKind::Pipe => {
                self.advance();
                let rhs = self.parse_expression(TokenKind::Pipe.lbp())?;
                Ok(Expr::pipe(left, rhs))
            }
            TokenKind::Or => {
                self.advance();
                let rhs = self.parse_expression(TokenKind::Or.lbp())?;
                Ok(Expr::or(left, rhs))
            }
            TokenKind::And => {
                self.advance();
                let rhs = self.parse_expression(TokenKind::And.lbp())?;
                Ok(Expr::and(left, rhs))
            }
            TokenKind::Comparator(op) => {
                self.advance();
                let rhs = self.parse_expression(token.kind.lbp())?;
                Ok(Expr::comparison(op, left, rhs))
            }
            TokenKind::Flatten => {
                self.advance();
                let rhs = self.parse_projection_rhs(TokenKind::Flatten.lbp())?;
                Ok(Expr::projection(Expr::Flatten(Box::new(left)), rhs))
            }
            TokenKind::Filter => {
                self.advance();
                self.parse_filter(left, &token)
            }
            TokenKind::LBracket => {
                self.advance();
                match self.peek(0).clone() {
                    TokenKind::Number(_) | TokenKind::Colon => {
                        self.parse_index_or_slice(left, &token)
                    }
                    TokenKind::Star => {
                        self.advance();
                        self.expect_close(TokenKind::RBracket, &token)?;
                        let rhs = self.parse_projection_rhs(TokenKind::Star.lbp())?;
                        Ok(Expr::projection(left, rhs))
                    }
                    TokenKind::Eof => Err(SyntaxError::new(
                        token.position,
                        "unclosed '[': expected an index, slice or '*'",
                    )),
                    _ => Err(self.unexpected("inside '[' (expected an index, slice or '*')")),
                }
            }
            TokenKind::LParen => {
                let name = match left {
                    Expr::Field(name) => name,
                    other => {
                        return Err(SyntaxError::new(
                            token.position,
                            format!("'(' after a {} expression: only names can be called", other.kind_name()),
                        ));
                    }
                };
                let name_position = self.tokens[self.index.saturating_sub(1)].position;
                self.advance();
                self.parse_function_call(name, name_position, &token)
            }
            _ => Err(self.unexpected("after expression")),
        }
    }

    /// Right side of a `.`: a name, a multi-select, `*`, or a function call.
    fn parse_dot(&mut self, lbp: usize) -> Result<Expr, SyntaxError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::LBracket => {
                self.advance();
                self.parse_multi_select_list(&token)
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_multi_select_hash(&token)
            }
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) | TokenKind::Star => {
                self.parse_expression(lbp)
            }
            TokenKind::Eof => Err(SyntaxError::new(
                token.position,
                "unexpected end of expression after '.'",
            )),
            _ => Err(self.unexpected("after '.'")),
        }
    }

    /// Everything a projection applies per element. Stops (yielding `@`) at
    /// the first token binding looser than a projection, so `|` and friends
    /// apply to the projected list as a whole.
    fn parse_projection_rhs(&mut self, lbp: usize) -> Result<Expr, SyntaxError> {
        if self.current().lbp() < PROJECTION_STOP {
            return Ok(Expr::CurrentNode);
        }
        match self.current().kind {
            TokenKind::Dot => {
                self.advance();
                self.parse_dot(lbp)
            }
            TokenKind::LBracket | TokenKind::Filter => self.parse_expression(lbp),
            _ => Err(self.unexpected("after projection (expected '.', '[' or '[?')")),
        }
    }

    /// `[n]` or `[start:stop:step]`, with the opening bracket consumed.
    fn parse_index_or_slice(&mut self, left: Expr, open: &Token) -> Result<Expr, SyntaxError> {
        let mut parts: [Option<i64>; 3] = [None, None, None];
        let mut pos = 0;

        loop {
            match self.current().kind {
                TokenKind::Number(n) => {
                    if parts[pos].is_some() {
                        return Err(self.unexpected("in slice (expected ':' or ']')"));
                    }
                    parts[pos] = Some(n);
                    self.advance();
                }
                TokenKind::Colon => {
                    pos += 1;
                    if pos > 2 {
                        return Err(SyntaxError::new(
                            self.current().position,
                            "too many ':' in slice: at most start:stop:step",
                        ));
                    }
                    self.advance();
                }
                TokenKind::RBracket => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(SyntaxError::new(
                        open.position,
                        "unclosed '[': expected ']'",
                    ));
                }
                _ => return Err(self.unexpected("in index or slice")),
            }
        }

        if pos == 0 {
            // A lone number: parts[0] is set because we entered on a number
            let index = parts[0].ok_or_else(|| SyntaxError::new(open.position, "empty index"))?;
            return Ok(match left {
                Expr::CurrentNode => Expr::Index(index),
                left => Expr::subexpr(left, Expr::Index(index)),
            });
        }

        if parts[2] == Some(0) {
            return Err(SyntaxError::new(open.position, "slice step cannot be 0"));
        }

        let slice = Expr::Slice {
            start: parts[0],
            stop: parts[1],
            step: parts[2],
        };
        let lhs = match left {
            Expr::CurrentNode => slice,
            left => Expr::subexpr(left, slice),
        };
        let rhs = self.parse_projection_rhs(TokenKind::Star.lbp())?;
        Ok(Expr::projection(lhs, rhs))
    }

    /// `[?predicate]` followed by the projected right-hand side.
    fn parse_filter(&mut self, left: Expr, open: &Token) -> Result<Expr, SyntaxError> {
        let predicate = self.parse_grouped(TokenKind::RBracket, open)?;
        self.expect_close(TokenKind::RBracket, open)?;
        let rhs = self.parse_projection_rhs(TokenKind::Filter.lbp())?;
        Ok(Expr::filter_projection(left, predicate, rhs))
    }

    fn parse_multi_select_list(&mut self, open: &Token) -> Result<Expr, SyntaxError> {
        let mut items = vec![];

        loop {
            items.push(self.parse_grouped(TokenKind::RBracket, open)?);
            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.expect_close(TokenKind::RBracket, open)?;
                break;
            }
        }

        Ok(Expr::MultiSelectList(items))
    }

    fn parse_multi_select_hash(&mut self, open: &Token) -> Result<Expr, SyntaxError> {
        let mut pairs = vec![];

        loop {
            let key = match &self.current().kind {
                TokenKind::Identifier(s) | TokenKind::QuotedIdentifier(s) => s.clone(),
                TokenKind::RBrace if pairs.is_empty() => {
                    return Err(SyntaxError::new(
                        open.position,
                        "empty multi-select hash: expected at least one key",
                    ));
                }
                TokenKind::Eof => {
                    return Err(SyntaxError::new(open.position, "unclosed '{': expected a key"));
                }
                _ => return Err(self.unexpected("in multi-select hash (expected a key)")),
            };
            self.advance();

            if !self.check(&TokenKind::Colon) {
                return Err(self.unexpected("after multi-select hash key (expected ':')"));
            }
            self.advance();

            let value = self.parse_grouped(TokenKind::RBrace, open)?;
            pairs.push((key, value));

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.expect_close(TokenKind::RBrace, open)?;
                break;
            }
        }

        Ok(Expr::MultiSelectHash(pairs))
    }

    /// Arguments of `name(...)`, with `(` consumed. `&expr` is only
    /// accepted here.
    fn parse_function_call(
        &mut self,
        name: String,
        name_position: usize,
        open: &Token,
    ) -> Result<Expr, SyntaxError> {
        if functions::lookup(&name).is_none() {
            return Err(SyntaxError::new(
                name_position,
                format!("unknown function '{}'", name),
            ));
        }

        let mut args = vec![];
        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::Ampersand) {
                self.advance();
                let inner = self.parse_grouped(TokenKind::RParen, open)?;
                args.push(Expr::ExpressionRef(Box::new(inner)));
            } else {
                args.push(self.parse_grouped(TokenKind::RParen, open)?);
            }

            if self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&TokenKind::RParen) {
                    return Err(self.unexpected("after ',' in function arguments"));
                }
            } else if !self.check(&TokenKind::RParen) {
                return Err(self.missing_close(&TokenKind::RParen, open));
            }
        }
        self.advance(); // consume ')'

        Ok(Expr::FunctionCall { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Expr, SyntaxError> {
        Parser::new(Lexer::new(text))?.parse()
    }

    #[test]
    fn projection_continues_through_brackets() {
        let expr = parse("foo[*].bar[0]").unwrap();
        assert_eq!(
            expr,
            Expr::projection(
                Expr::field("foo"),
                Expr::subexpr(Expr::field("bar"), Expr::Index(0))
            )
        );
    }

    #[test]
    fn pipe_stops_projection() {
        let expr = parse("foo[*].bar | [0]").unwrap();
        assert_eq!(
            expr,
            Expr::pipe(
                Expr::projection(Expr::field("foo"), Expr::field("bar")),
                Expr::Index(0)
            )
        );
    }

    #[test]
    fn unclosed_bracket_points_at_bracket() {
        let err = parse("foo[").unwrap_err();
        assert_eq!(err.position, 3);
    }
}
