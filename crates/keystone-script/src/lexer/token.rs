// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Token definitions for the Keystone lexer.

/// A span in the source code, representing a range of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The different kinds of tokens in Keystone.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal
    Number(f64),
    /// String literal, escapes already processed
    String(String),
    /// true
    True,
    /// false
    False,
    /// nil
    Nil,

    /// Identifier
    Identifier(String),

    // Keywords
    /// let
    Let,
    /// export
    Export,
    /// print
    Print,
    /// assert
    Assert,
    /// raise
    Raise,

    // Punctuation
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// ,
    Comma,
    /// .
    Dot,
    /// ;
    Semicolon,
    /// =
    Equal,
    /// ==
    EqualEqual,
    /// !=
    NotEqual,
    /// -
    Minus,

    // Special
    /// A string literal missing its closing quote
    UnterminatedString,
    /// Character that starts no token
    Invalid(char),
    /// End of input
    Eof,
}

impl TokenKind {
    /// Look up a keyword by its spelling.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        match ident {
            "let" => Some(TokenKind::Let),
            "export" => Some(TokenKind::Export),
            "print" => Some(TokenKind::Print),
            "assert" => Some(TokenKind::Assert),
            "raise" => Some(TokenKind::Raise),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "nil" => Some(TokenKind::Nil),
            _ => None,
        }
    }
}
