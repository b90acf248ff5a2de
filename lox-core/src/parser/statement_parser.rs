//! Recursive-descent parser for Lox declarations, statements and expressions
//!
//! Parses programs like:
//! - `var a = 1;`
//! - `fun add(a, b) { return a + b; }`
//! - `for (var i = 0; i < 3; i = i + 1) print i;`
//! - `if (a and b) { ... } else { ... }`
//!
//! A syntax error abandons the current declaration only. The parser then
//! synchronizes to the next statement boundary and keeps going, so a single
//! pass reports every independent error in the source.

use crate::parser::ast::{Expr, FunctionDecl, Program, Stmt};
use crate::parser::error::{ErrorPhase, LoxError};
use crate::parser::lexer::{Lexer, Literal, Token, TokenKind};
use crate::stack::ensure_sufficient_stack;
use crate::types::Value;
use std::rc::Rc;

/// Calls and declarations accept at most this many arguments/parameters
const MAX_ARITY: usize = 255;

/// Result of a full parse: every statement that parsed cleanly plus all errors
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub program: Program,
    pub errors: Vec<LoxError>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<Program, Vec<LoxError>> {
        if self.errors.is_empty() {
            Ok(self.program)
        } else {
            Err(self.errors)
        }
    }
}

/// Parses a token stream into a program
pub struct StatementParser {
    tokens: Vec<Token>,
    position: usize,
    errors: Vec<LoxError>,
}

impl StatementParser {
    /// Create a parser over a token stream. A trailing EOF is added if missing.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token::new(TokenKind::Eof, "", None, line));
        }

        StatementParser {
            tokens,
            position: 0,
            errors: Vec::new(),
        }
    }

    /// Current token
    fn current(&self) -> &Token {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// Most recently consumed token
    fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    /// Advance to the next token, returning the one just consumed
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous().clone()
    }

    /// Check if current token matches (without consuming)
    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    /// Consume the current token if it is any of `kinds`
    fn match_any(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.iter().any(|kind| self.check(*kind)) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expect a specific token kind, failing with `message` at the current token
    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, LoxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn error_at_current(&self, message: &str) -> LoxError {
        LoxError::at_token(ErrorPhase::Syntax, self.current(), message)
    }

    /// Record an error that does not abandon the current rule
    fn report(&mut self, token: &Token, message: &str) {
        self.errors
            .push(LoxError::at_token(ErrorPhase::Syntax, token, message));
    }

    /// Discard tokens until a likely statement boundary
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.current().kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Parse a complete program, recovering after each malformed declaration
    pub fn parse_program(mut self) -> ParseOutput {
        let mut program = Program::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.parse_declaration() {
                program.push(stmt);
            }
        }

        tracing::debug!(
            statements = program.len(),
            errors = self.errors.len(),
            "parsing complete"
        );

        ParseOutput {
            program,
            errors: self.errors,
        }
    }

    /// Parse one declaration; on error, record it and synchronize
    fn parse_declaration(&mut self) -> Option<Stmt> {
        let result = ensure_sufficient_stack(|| {
            if self.match_any(&[TokenKind::Fun]).is_some() {
                self.parse_function_declaration()
            } else if self.match_any(&[TokenKind::Var]).is_some() {
                self.parse_var_declaration()
            } else {
                self.parse_statement()
            }
        });

        match result {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                tracing::trace!(line = err.line, message = %err.message, "syntax error");
                self.errors.push(err);
                self.synchronize();
                None
            }
        }
    }

    /// Parse: fun <name>(<params>) { <body> }
    fn parse_function_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self.expect(TokenKind::Identifier, "Expect function name.")?;
        self.expect(TokenKind::LeftParen, "Expect '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    let token = self.current().clone();
                    self.report(&token, "Can't have more than 255 parameters.");
                }
                params.push(self.expect(TokenKind::Identifier, "Expect parameter name.")?);

                if self.match_any(&[TokenKind::Comma]).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.expect(TokenKind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.parse_block()?;

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    /// Parse: var <name> [= <expression>];
    fn parse_var_declaration(&mut self) -> Result<Stmt, LoxError> {
        let name = self.expect(TokenKind::Identifier, "Expect variable name.")?;

        let initializer = if self.match_any(&[TokenKind::Equal]).is_some() {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        )?;
        Ok(Stmt::Var { name, initializer })
    }

    /// Parse a single statement
    fn parse_statement(&mut self) -> Result<Stmt, LoxError> {
        match self.current().kind {
            TokenKind::For => {
                self.advance();
                self.parse_for_statement()
            }
            TokenKind::If => {
                self.advance();
                self.parse_if_statement()
            }
            TokenKind::Print => {
                let keyword = self.advance();
                self.parse_print_statement(keyword)
            }
            TokenKind::Return => {
                let keyword = self.advance();
                self.parse_return_statement(keyword)
            }
            TokenKind::While => {
                self.advance();
                self.parse_while_statement()
            }
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.parse_block()?))
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Parse: for (<init>; <cond>; <incr>) <body>
    ///
    /// Desugared into `{ init; while (cond) { body; incr; } }`. A missing
    /// condition becomes `true`.
    fn parse_for_statement(&mut self) -> Result<Stmt, LoxError> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_any(&[TokenKind::Semicolon]).is_some() {
            None
        } else if self.match_any(&[TokenKind::Var]).is_some() {
            Some(self.parse_var_declaration()?)
        } else {
            Some(self.parse_expression_statement()?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            Expr::Literal(Value::Bool(true))
        } else {
            self.parse_expression()?
        };
        self.expect(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.parse_statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let mut statements = Vec::with_capacity(2);
        if let Some(initializer) = initializer {
            statements.push(initializer);
        }
        statements.push(Stmt::While {
            condition,
            body: Box::new(body),
        });

        Ok(Stmt::Block(statements))
    }

    /// Parse: if (<cond>) <then> [else <else>]
    fn parse_if_statement(&mut self) -> Result<Stmt, LoxError> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_any(&[TokenKind::Else]).is_some() {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_print_statement(&mut self, keyword: Token) -> Result<Stmt, LoxError> {
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print { keyword, value })
    }

    fn parse_return_statement(&mut self, keyword: Token) -> Result<Stmt, LoxError> {
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, LoxError> {
        self.expect(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.parse_statement()?);

        Ok(Stmt::While { condition, body })
    }

    /// Parse declarations up to the closing brace (opening brace already consumed)
    fn parse_block(&mut self) -> Result<Vec<Stmt>, LoxError> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }

        self.expect(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, LoxError> {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // =========================================================================
    // Expression Parsing
    // =========================================================================

    /// Grammar: expression = assignment
    pub fn parse_expression(&mut self) -> Result<Expr, LoxError> {
        ensure_sufficient_stack(|| self.parse_assignment_expression())
    }

    /// Grammar: assignment = IDENTIFIER '=' assignment | or_expr
    fn parse_assignment_expression(&mut self) -> Result<Expr, LoxError> {
        let expr = self.parse_or_expression()?;

        if let Some(equals) = self.match_any(&[TokenKind::Equal]) {
            let value = self.parse_assignment_expression()?;

            if let Expr::Variable { name, .. } = &expr {
                return Ok(Expr::assign(name.clone(), value));
            }
            self.report(&equals, "Invalid assignment target.");
            return Ok(expr);
        }

        Ok(expr)
    }

    /// Grammar: or_expr = and_expr ('or' and_expr)*
    fn parse_or_expression(&mut self) -> Result<Expr, LoxError> {
        let mut left = self.parse_and_expression()?;

        while let Some(operator) = self.match_any(&[TokenKind::Or]) {
            let right = self.parse_and_expression()?;
            left = Expr::logical(left, operator, right);
        }

        Ok(left)
    }

    /// Grammar: and_expr = equality_expr ('and' equality_expr)*
    fn parse_and_expression(&mut self) -> Result<Expr, LoxError> {
        let mut left = self.parse_equality_expression()?;

        while let Some(operator) = self.match_any(&[TokenKind::And]) {
            let right = self.parse_equality_expression()?;
            left = Expr::logical(left, operator, right);
        }

        Ok(left)
    }

    /// Grammar: equality_expr = comparison_expr (('==' | '!=') comparison_expr)*
    fn parse_equality_expression(&mut self) -> Result<Expr, LoxError> {
        let mut left = self.parse_comparison_expression()?;

        while let Some(operator) = self.match_any(&[TokenKind::EqualEqual, TokenKind::BangEqual])
        {
            let right = self.parse_comparison_expression()?;
            left = Expr::binary(left, operator, right);
        }

        Ok(left)
    }

    /// Grammar: comparison_expr = term_expr (('<' | '<=' | '>' | '>=') term_expr)*
    fn parse_comparison_expression(&mut self) -> Result<Expr, LoxError> {
        let mut left = self.parse_term_expression()?;

        while let Some(operator) = self.match_any(&[
            TokenKind::Greater,
            TokenKind::GreaterEqual,
            TokenKind::Less,
            TokenKind::LessEqual,
        ]) {
            let right = self.parse_term_expression()?;
            left = Expr::binary(left, operator, right);
        }

        Ok(left)
    }

    /// Grammar: term_expr = factor_expr (('+' | '-') factor_expr)*
    fn parse_term_expression(&mut self) -> Result<Expr, LoxError> {
        let mut left = self.parse_factor_expression()?;

        while let Some(operator) = self.match_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let right = self.parse_factor_expression()?;
            left = Expr::binary(left, operator, right);
        }

        Ok(left)
    }

    /// Grammar: factor_expr = unary_expr (('*' | '/') unary_expr)*
    fn parse_factor_expression(&mut self) -> Result<Expr, LoxError> {
        let mut left = self.parse_unary_expression()?;

        while let Some(operator) = self.match_any(&[TokenKind::Star, TokenKind::Slash]) {
            let right = self.parse_unary_expression()?;
            left = Expr::binary(left, operator, right);
        }

        Ok(left)
    }

    /// Grammar: unary_expr = ('!' | '-') unary_expr | call_expr
    fn parse_unary_expression(&mut self) -> Result<Expr, LoxError> {
        if let Some(operator) = self.match_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let operand = ensure_sufficient_stack(|| self.parse_unary_expression())?;
            return Ok(Expr::unary(operator, operand));
        }

        self.parse_call_expression()
    }

    /// Grammar: call_expr = primary_expr ('(' arguments? ')')*
    fn parse_call_expression(&mut self) -> Result<Expr, LoxError> {
        let mut expr = self.parse_primary_expression()?;

        while self.match_any(&[TokenKind::LeftParen]).is_some() {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, LoxError> {
        let mut arguments = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let token = self.current().clone();
                    self.report(&token, "Can't have more than 255 arguments.");
                }
                arguments.push(self.parse_expression()?);

                if self.match_any(&[TokenKind::Comma]).is_none() {
                    break;
                }
            }
        }

        let paren = self.expect(TokenKind::RightParen, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    /// Grammar: primary_expr = literal | IDENTIFIER | '(' expression ')'
    fn parse_primary_expression(&mut self) -> Result<Expr, LoxError> {
        let token = self.current().clone();
        let kind = token.kind;

        let expr = match kind {
            TokenKind::False => Expr::Literal(Value::Bool(false)),
            TokenKind::True => Expr::Literal(Value::Bool(true)),
            TokenKind::Nil => Expr::Literal(Value::Nil),
            TokenKind::Number | TokenKind::String => match &token.literal {
                Some(Literal::Number(n)) => Expr::Literal(Value::Number(*n)),
                Some(Literal::Str(s)) => Expr::Literal(Value::string(s)),
                None => return Err(self.error_at_current("Expect expression.")),
            },
            TokenKind::Identifier => Expr::variable(token),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::Grouping(Box::new(inner)));
            }
            _ => return Err(self.error_at_current("Expect expression.")),
        };

        self.advance();
        Ok(expr)
    }
}

/// Lex and parse `input`; lexical errors precede syntax errors in the output
pub fn parse_statements(input: &str) -> ParseOutput {
    let lexed = Lexer::new(input).tokenize();
    let mut output = StatementParser::new(lexed.tokens).parse_program();

    if !lexed.errors.is_empty() {
        let mut errors = lexed.errors;
        errors.append(&mut output.errors);
        output.errors = errors;
    }

    output
}

/// Convenience function to parse a string into a single expression
pub fn parse_expression(input: &str) -> Result<Expr, Vec<LoxError>> {
    let lexed = Lexer::new(input).tokenize();
    if !lexed.errors.is_empty() {
        return Err(lexed.errors);
    }

    let mut parser = StatementParser::new(lexed.tokens);
    let expr = parser.parse_expression().map_err(|e| vec![e])?;

    if !parser.is_at_end() {
        let trailing = parser.error_at_current("Expect end of expression.");
        let mut errors = parser.errors;
        errors.push(trailing);
        return Err(errors);
    }
    if !parser.errors.is_empty() {
        return Err(parser.errors);
    }

    Ok(expr)
}
