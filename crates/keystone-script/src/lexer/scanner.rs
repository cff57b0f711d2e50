// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};
use unicode_xid::UnicodeXID;

/// A scanner that tokenizes Keystone source code.
pub struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            current_pos: 0,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let start = self.current_pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start));
        };

        let kind = match ch {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semicolon,
            '-' => TokenKind::Minus,
            '=' => {
                if self.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.match_char('=') {
                    TokenKind::NotEqual
                } else {
                    TokenKind::Invalid('!')
                }
            }
            '"' | '\'' => self.scan_string(ch),
            '0'..='9' => self.scan_number(ch),
            _ if is_id_start(ch) => self.scan_identifier(ch),
            _ => TokenKind::Invalid(ch),
        };

        Token::new(kind, Span::new(start, self.current_pos))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\n' | '\r' => {
                    self.advance();
                }
                '#' => {
                    // Comment runs to end of line
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        while let Some((_, ch)) = self.advance() {
            match ch {
                c if c == quote => return TokenKind::String(value),
                '\n' => break,
                '\\' => match self.advance() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, '0')) => value.push('\0'),
                    Some((_, other)) => value.push(other),
                    None => break,
                },
                c => value.push(c),
            }
        }

        TokenKind::UnterminatedString
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() || ch == '_' {
                if ch != '_' {
                    text.push(ch);
                }
                self.advance();
            } else {
                break;
            }
        }

        // Fraction only when a digit follows the dot
        if self.peek() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some((_, c)) if c.is_ascii_digit()) {
                self.advance();
                text.push('.');
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        match text.parse() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid(first),
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut ident = String::from(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::keyword(&ident).unwrap_or(TokenKind::Identifier(ident))
    }
}

fn is_id_start(ch: char) -> bool {
    ch == '_' || UnicodeXID::is_xid_start(ch)
}

fn is_id_continue(ch: char) -> bool {
    UnicodeXID::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = scanner.next_token();
            if token.kind == TokenKind::Eof {
                return kinds;
            }
            kinds.push(token.kind);
        }
    }

    #[test]
    fn test_statement_tokens() {
        assert_eq!(
            kinds("let util = require(\"./util\")"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier("util".into()),
                TokenKind::Equal,
                TokenKind::Identifier("require".into()),
                TokenKind::LeftParen,
                TokenKind::String("./util".into()),
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42 3.5 1_000"), vec![
            TokenKind::Number(42.0),
            TokenKind::Number(3.5),
            TokenKind::Number(1000.0),
        ]);
    }

    #[test]
    fn test_operators_and_comments() {
        assert_eq!(
            kinds("a == b # trailing comment\nc != -1"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::EqualEqual,
                TokenKind::Identifier("b".into()),
                TokenKind::Identifier("c".into()),
                TokenKind::NotEqual,
                TokenKind::Minus,
                TokenKind::Number(1.0),
            ]
        );
    }

    #[test]
    fn test_string_escapes_and_errors() {
        assert_eq!(kinds(r#"'it\'s' "a\tb""#), vec![
            TokenKind::String("it's".into()),
            TokenKind::String("a\tb".into()),
        ]);
        assert_eq!(kinds("\"open"), vec![TokenKind::UnterminatedString]);
        assert_eq!(kinds("@"), vec![TokenKind::Invalid('@')]);
    }
}
