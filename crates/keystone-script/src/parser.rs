// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! A recursive descent parser for Keystone.
//!
//! Statements may be terminated by `;` but need not be; the grammar has no
//! infix operator that could continue across a line break except `==`,
//! `!=`, `.` and call parentheses.

use crate::Error;
use crate::ast::*;
use crate::lexer::{Scanner, Span, Token, TokenKind};

/// Deepest expression nesting accepted before parsing gives up
pub const MAX_NESTING_DEPTH: usize = 256;

/// A recursive descent parser for Keystone.
pub struct Parser<'a> {
    source: &'a str,
    scanner: Scanner<'a>,
    current: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            source,
            scanner,
            current,
            depth: 0,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program, Error> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            body.push(self.parse_statement()?);
            if self.check(&TokenKind::Semicolon) {
                self.advance();
            }
        }

        Ok(Program { body })
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement, Error> {
        match &self.current.kind {
            TokenKind::Let => {
                self.advance();
                let (name, value) = self.parse_binding()?;
                Ok(Statement::Let { name, value })
            }
            TokenKind::Export => {
                self.advance();
                let (name, value) = self.parse_binding()?;
                Ok(Statement::Export { name, value })
            }
            TokenKind::Print => {
                self.advance();
                let mut values = Vec::new();
                if self.starts_expression() {
                    values.push(self.parse_expression()?);
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        values.push(self.parse_expression()?);
                    }
                }
                Ok(Statement::Print(values))
            }
            TokenKind::Assert => {
                let line = self.line_of(self.current.span);
                self.advance();
                let condition = self.parse_expression()?;
                let message = if self.check(&TokenKind::Comma) {
                    self.advance();
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(Statement::Assert {
                    condition,
                    message,
                    line,
                })
            }
            TokenKind::Raise => {
                self.advance();
                Ok(Statement::Raise(self.parse_expression()?))
            }
            _ => Ok(Statement::Expression(self.parse_expression()?)),
        }
    }

    /// `name = expression`
    fn parse_binding(&mut self) -> Result<(String, Expression), Error> {
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Equal)?;
        let value = self.parse_expression()?;
        Ok((name, value))
    }

    /// Parses an expression.
    pub fn parse_expression(&mut self) -> Result<Expression, Error> {
        self.enter()?;
        let expr = self.parse_equality();
        self.depth -= 1;
        expr
    }

    fn parse_equality(&mut self) -> Result<Expression, Error> {
        let mut left = self.parse_unary()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::Binary {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, Error> {
        if self.check(&TokenKind::Minus) {
            self.advance();
            self.enter()?;
            let operand = self.parse_unary();
            self.depth -= 1;
            return Ok(Expression::Negate(Box::new(operand?)));
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Expression, Error> {
        let mut expr = self.parse_primary()?;
        let depth = self.depth;

        loop {
            if self.check(&TokenKind::LeftParen) || self.check(&TokenKind::Dot) {
                // Postfix chains nest too
                self.enter()?;
            }
            if self.check(&TokenKind::LeftParen) {
                self.advance();
                let arguments = self.parse_list(&TokenKind::RightParen)?;
                expr = Expression::Call {
                    callee: Box::new(expr),
                    arguments,
                };
            } else if self.check(&TokenKind::Dot) {
                self.advance();
                let name = self.expect_identifier()?;
                expr = Expression::Field {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        self.depth = depth;
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expression, Error> {
        let expr = match &self.current.kind {
            TokenKind::Number(n) => Expression::Literal(Literal::Number(*n)),
            TokenKind::String(s) => Expression::Literal(Literal::String(s.clone())),
            TokenKind::True => Expression::Literal(Literal::Boolean(true)),
            TokenKind::False => Expression::Literal(Literal::Boolean(false)),
            TokenKind::Nil => Expression::Literal(Literal::Nil),
            TokenKind::Identifier(name) => Expression::Identifier(name.clone()),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => {
                self.advance();
                let items = self.parse_list(&TokenKind::RightBracket)?;
                return Ok(Expression::List(items));
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(expr)
    }

    /// Comma separated expressions up to and including `close`
    fn parse_list(&mut self, close: &TokenKind) -> Result<Vec<Expression>, Error> {
        let mut items = Vec::new();

        if !self.check(close) {
            loop {
                items.push(self.parse_expression()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
                // Trailing comma
                if self.check(close) {
                    break;
                }
            }
        }

        self.expect(close)?;
        Ok(items)
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Nil
                | TokenKind::Identifier(_)
                | TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::Minus
        )
    }

    // ==================== Helper Methods ====================

    fn advance(&mut self) {
        self.current = self.scanner.next_token();
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), Error> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("{:?}", kind)))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, Error> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = match &self.current.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::UnterminatedString => "unterminated string".to_string(),
            TokenKind::Invalid(ch) => format!("unexpected character '{}'", ch),
            other => format!("{:?}", other),
        };
        Error::Syntax {
            message: format!("Expected {}, found {}", expected, found),
            line: self.line_of(self.current.span),
        }
    }

    fn enter(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(Error::Syntax {
                message: format!("Expression nested deeper than {} levels", MAX_NESTING_DEPTH),
                line: self.line_of(self.current.span),
            });
        }
        Ok(())
    }

    fn line_of(&self, span: Span) -> usize {
        let end = span.start.min(self.source.len());
        self.source[..end].matches('\n').count() + 1
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        Parser::new(src).parse_program().unwrap()
    }

    fn parse_stmt(src: &str) -> Statement {
        parse_ok(src).body.into_iter().next().unwrap()
    }

    #[test]
    fn test_let_with_require_call() {
        assert_eq!(
            parse_stmt("let util = require(\"./util\", true)"),
            Statement::Let {
                name: "util".into(),
                value: Expression::Call {
                    callee: Box::new(Expression::Identifier("require".into())),
                    arguments: vec![
                        Expression::Literal(Literal::String("./util".into())),
                        Expression::Literal(Literal::Boolean(true)),
                    ],
                },
            }
        );
    }

    #[test]
    fn test_field_access_chains() {
        assert_eq!(
            parse_stmt("a.b.c(1)"),
            Statement::Expression(Expression::Call {
                callee: Box::new(Expression::Field {
                    object: Box::new(Expression::Field {
                        object: Box::new(Expression::Identifier("a".into())),
                        name: "b".into(),
                    }),
                    name: "c".into(),
                }),
                arguments: vec![Expression::Literal(Literal::Number(1.0))],
            })
        );
    }

    #[test]
    fn test_optional_semicolons() {
        let program = parse_ok("export a = 1; export b = 2\nprint a, b;;\nprint");
        assert_eq!(program.body.len(), 4);
        assert_eq!(program.body[3], Statement::Print(vec![]));
    }

    #[test]
    fn test_assert_records_line() {
        let program = parse_ok("let x = 1\n\nassert x == 1, \"x\"");
        match &program.body[1] {
            Statement::Assert { line, message, .. } => {
                assert_eq!(*line, 3);
                assert!(message.is_some());
            }
            other => panic!("expected assert, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_errors_report_line() {
        let err = Parser::new("let a = 1\nlet = 2").parse_program().unwrap_err();
        match err {
            Error::Syntax { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("identifier"), "{}", message);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }

        let err = Parser::new("print \"open").parse_program().unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        for source in [
            "-".repeat(50_000) + "1",
            "(".repeat(50_000) + "1" + &")".repeat(50_000),
            "[".repeat(50_000),
            "x".to_string() + &".y".repeat(50_000),
        ] {
            match Parser::new(&source).parse_program() {
                Err(Error::Syntax { message, .. }) => {
                    assert!(message.contains("nested deeper"), "{}", message)
                }
                other => panic!("expected syntax error, got {:?}", other),
            }
        }

        let nested = "(".repeat(50) + "1" + &")".repeat(50);
        assert!(Parser::new(&nested).parse_program().is_ok());
    }
}
