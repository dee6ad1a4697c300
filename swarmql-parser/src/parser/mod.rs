mod expression;
mod query;

#[cfg(not(feature = "std"))]
use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::fmt::Display;

use swarmql_ast::SqlQuery;
use swarmql_core::{Keyword, Token};
use swarmql_lexer::tokenize;

use crate::error::{parse_error, ParserError};

/// Parses a complete `SELECT` query.
pub fn parse_query(sql: &str) -> Result<SqlQuery, ParserError> {
    Parser::new_with_sql(sql).parse_query()
}

/// SQL parser.
///
/// The grammar is LL(1): a single token of lookahead over an index cursor
/// is enough everywhere, including the balanced-paren raw captures for
/// subqueries, function arguments and `CASE … END` bodies.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Creates a new parser over an already-lexed token sequence.
    pub fn new_with_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Creates a new parser for the given SQL string.
    pub fn new_with_sql(sql: &str) -> Self {
        Self::new_with_tokens(tokenize(sql))
    }

    /// Returns true when every token has been consumed.
    pub fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Returns a reference to the next token without consuming it.
    pub fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consumes the next token if `func` accepts it.
    pub fn next_token_if(&mut self, func: impl FnOnce(&Token) -> bool) -> Option<Token> {
        match self.peek_token() {
            Some(token) if func(token) => self.next_token(),
            _ => None,
        }
    }

    /// Consumes the next token and returns true if it equals `expected`.
    pub fn next_token_if_is(&mut self, expected: &Token) -> bool {
        self.next_token_if(|token| token == expected).is_some()
    }

    /// Consumes the next token and returns true if it is the expected
    /// keyword.
    pub fn parse_keyword(&mut self, keyword: Keyword) -> bool {
        self.next_token_if(|token| token.is_keyword(keyword))
            .is_some()
    }

    /// Consumes the next keyword token and errors if it does not match.
    pub fn expect_keyword(&mut self, expected: Keyword) -> Result<(), ParserError> {
        if self.parse_keyword(expected) {
            Ok(())
        } else {
            self.expected(expected)
        }
    }

    /// Consumes the next token and errors if it does not match.
    pub fn expect_token(&mut self, expected: &Token) -> Result<(), ParserError> {
        if self.next_token_if_is(expected) {
            Ok(())
        } else {
            self.expected(expected)
        }
    }

    /// Reports an unexpected token.
    pub fn expected<R>(&self, expected: impl Display) -> Result<R, ParserError> {
        match self.peek_token() {
            Some(found) => parse_error(format!("Expected: {}, found: {}", expected, found)),
            None => parse_error(format!("Expected: {}, but not found", expected)),
        }
    }

    /// Consumes the next token as a bare identifier. Punctuation does not
    /// qualify and is left in place.
    pub fn parse_identifier(&mut self) -> Option<String> {
        self.next_token_if(|token| {
            !matches!(
                token,
                Token::Comma | Token::LeftParen | Token::RightParen | Token::Asterisk
            )
        })
        .map(|token| token.to_string())
    }

    /// Consumes the next token and returns its raw text.
    pub fn consume_raw(&mut self) -> Result<String, ParserError> {
        match self.next_token() {
            Some(token) => Ok(token.to_string()),
            None => parse_error("Unexpected end of input"),
        }
    }

    /// Captures raw text up to the parenthesis matching an already-consumed
    /// `(`. Inner parentheses are kept; tokens are joined by single spaces
    /// so the fragment can be re-lexed later. A missing closer ends the
    /// capture at end of input.
    pub fn raw_parenthesized(&mut self) -> String {
        let mut raw = String::new();
        let mut depth = 1usize;
        while let Some(token) = self.next_token() {
            match token {
                Token::LeftParen => depth += 1,
                Token::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            if !raw.is_empty() {
                raw.push(' ');
            }
            raw.push_str(&token.to_string());
        }
        raw
    }

    /// Drains the remaining tokens into one space-joined string.
    pub fn raw_remainder(&mut self) -> String {
        let mut raw = String::new();
        while let Some(token) = self.next_token() {
            if !raw.is_empty() {
                raw.push(' ');
            }
            raw.push_str(&token.to_string());
        }
        raw
    }
}
