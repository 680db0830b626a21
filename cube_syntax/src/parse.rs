use crate::{
    ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt},
    error::Error,
    lex::Lexer,
    token::{Token, TokenKind},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::EQ | TokenKind::NE => Precedence::Equals,
        TokenKind::LT | TokenKind::GT => Precedence::LessGreater,
        TokenKind::PLUS | TokenKind::MINUS => Precedence::Sum,
        TokenKind::ASTERISK | TokenKind::SLASH => Precedence::Product,
        TokenKind::LPAREN => Precedence::Call,
        TokenKind::LBRACKET => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Pratt parser over a two-token window pulled from the lexer. Errors
/// accumulate as strings and parsing continues best-effort; callers must
/// check `errors()` before trusting the returned program.
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    peek_token: Token,
    errors: Vec<Error>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        let mut parser = Self {
            lexer,
            current_token: Token::eof(),
            peek_token: Token::eof(),
            errors: Vec::default(),
        };
        // Fill both slots of the lookahead window
        parser.next_token();
        parser.next_token();
        parser
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.current_is(TokenKind::EOF) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }
        program
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.current_token.kind {
            TokenKind::LET => self.parse_let_statement(),
            TokenKind::RETURN => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::IDENT) {
            return None;
        }
        let name = self.current_token.literal.clone();

        if !self.expect_peek(TokenKind::ASSIGN) {
            return None;
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::SEMICOLON) {
            self.next_token();
        }
        Some(Stmt::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        if self.peek_is(TokenKind::SEMICOLON) {
            self.next_token();
            return Some(Stmt::Return(None));
        }
        if self.peek_is(TokenKind::RBRACE) || self.peek_is(TokenKind::EOF) {
            return Some(Stmt::Return(None));
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;

        if self.peek_is(TokenKind::SEMICOLON) {
            self.next_token();
        }
        Some(Stmt::Return(Some(value)))
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;

        // This makes the semicolon an optional terminator
        if self.peek_is(TokenKind::SEMICOLON) {
            self.next_token();
        }
        Some(Stmt::Expression(expr))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenKind::SEMICOLON) && precedence < self.peek_precedence() {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    /// Prefix dispatch, keyed on the current token kind.
    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.current_token.kind {
            TokenKind::IDENT => Some(Expr::Ident(self.current_token.literal.clone())),
            TokenKind::INT => self.parse_integer_literal(),
            TokenKind::STRING => Some(Expr::Str(self.current_token.literal.clone())),
            TokenKind::TRUE => Some(Expr::Boolean(true)),
            TokenKind::FALSE => Some(Expr::Boolean(false)),
            TokenKind::BANG | TokenKind::MINUS => self.parse_prefix_expression(),
            TokenKind::LPAREN => self.parse_grouped_expression(),
            TokenKind::IF => self.parse_if_expression(),
            TokenKind::FUNCTION => self.parse_function_literal(),
            TokenKind::LBRACKET => self.parse_array_literal(),
            TokenKind::LBRACE => self.parse_hash_literal(),
            kind => {
                self.errors
                    .push(format!("no prefix parse function for {kind}"));
                None
            }
        }
    }

    /// Infix dispatch; the current token is the operator, `left` the
    /// already-parsed operand.
    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.current_token.kind {
            TokenKind::LPAREN => self.parse_call_expression(left),
            TokenKind::LBRACKET => self.parse_index_expression(left),
            _ => self.parse_infix_expression(left),
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        match self.current_token.literal.parse() {
            Ok(value) => Some(Expr::Integer(value)),
            Err(_) => {
                self.errors.push(format!(
                    "could not parse token {:?} as integer",
                    self.current_token.literal
                ));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let op = PrefixOp::from_token(self.current_token.kind)
            .expect("non-prefix operators cannot be dispatched here");
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix {
            op,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let op = InfixOp::from_token(self.current_token.kind)
            .expect("non-infix operators cannot be dispatched here");
        let precedence = self.current_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RPAREN) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::LPAREN) {
            return None;
        }

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RPAREN) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBRACE) {
            return None;
        }
        let consequence = self.parse_block();

        let alternative = if self.peek_is(TokenKind::ELSE) {
            self.next_token();
            if !self.expect_peek(TokenKind::LBRACE) {
                return None;
            }
            Some(self.parse_block())
        } else {
            None
        };

        Some(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::LPAREN) {
            return None;
        }
        let params = self.parse_function_params()?;

        if !self.expect_peek(TokenKind::LBRACE) {
            return None;
        }
        let body = self.parse_block();

        Some(Expr::Function { params, body })
    }

    fn parse_function_params(&mut self) -> Option<Vec<String>> {
        let mut params = Vec::new();

        self.next_token();
        if self.current_is(TokenKind::RPAREN) {
            return Some(params);
        }

        params.push(self.current_token.literal.clone());
        while self.peek_is(TokenKind::COMMA) {
            // Skip the comma and position on the next identifier
            self.next_token();
            self.next_token();
            params.push(self.current_token.literal.clone());
        }

        if !self.expect_peek(TokenKind::RPAREN) {
            return None;
        }
        Some(params)
    }

    /// A missing `}` is silently tolerated at EOF.
    fn parse_block(&mut self) -> Block {
        let mut block = Block::default();

        self.next_token();
        while !self.current_is(TokenKind::RBRACE) && !self.current_is(TokenKind::EOF) {
            if let Some(stmt) = self.parse_statement() {
                block.statements.push(stmt);
            }
            self.next_token();
        }
        block
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        Some(Expr::Array(
            self.parse_expression_list(TokenKind::RBRACKET)?,
        ))
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let mut entries = Vec::new();

        while !self.peek_is(TokenKind::RBRACE) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(TokenKind::COLON) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            entries.push((key, value));

            if !self.peek_is(TokenKind::RBRACE) && !self.expect_peek(TokenKind::COMMA) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RBRACE) {
            return None;
        }
        Some(Expr::Hash(entries))
    }

    fn parse_call_expression(&mut self, func: Expr) -> Option<Expr> {
        Some(Expr::Call {
            func: Box::new(func),
            args: self.parse_expression_list(TokenKind::RPAREN)?,
        })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RBRACKET) {
            return None;
        }
        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();

        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::COMMA) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn next_token(&mut self) {
        self.current_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current_token.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_token.kind == kind
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            return true;
        }
        self.peek_error(kind);
        false
    }

    fn peek_error(&mut self, expected: TokenKind) {
        self.errors.push(format!(
            "expected next token to be {expected}, found {}",
            self.peek_token.kind
        ));
    }

    fn current_precedence(&self) -> Precedence {
        precedence_of(self.current_token.kind)
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek_token.kind)
    }
}
