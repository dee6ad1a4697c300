#[cfg(not(feature = "std"))]
use alloc::{string::String, vec, vec::Vec};
use core::{iter::Peekable, str::Chars};

use swarmql_core::{CompareOp, Token};

/// SQL lexer.
///
/// Whitespace separates tokens and is never emitted. Quoted strings keep
/// their surrounding quotes in the token's `Display` form; inside a string
/// a backslash escapes the next character (both kept literally) and a
/// doubled quote embeds a single quote character.
pub struct Lexer<'a> {
    iter: Peekable<Chars<'a>>,
}

/// Tokenizes `input` in one call.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            iter: input.chars().peekable(),
        }
    }

    /// Tokenizes the input and produces the token sequence.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = vec![];
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            match self.iter.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.iter.next();
                }
                Some(&quote @ ('\'' | '"')) => {
                    self.iter.next();
                    return Some(self.tokenize_string_literal(quote));
                }
                Some(',') => return self.consume_as(Token::Comma),
                Some('(') => return self.consume_as(Token::LeftParen),
                Some(')') => return self.consume_as(Token::RightParen),
                Some('*') => return self.consume_as(Token::Asterisk),
                Some('=') => return self.consume_as(Token::Op(CompareOp::Eq)),
                Some('!') => {
                    self.iter.next();
                    return Some(if self.next_if_is('=') {
                        Token::Op(CompareOp::NotEq)
                    } else {
                        Token::Exclamation
                    });
                }
                Some('<') => {
                    self.iter.next();
                    return Some(Token::Op(if self.next_if_is('=') {
                        CompareOp::LtEq
                    } else if self.next_if_is('>') {
                        CompareOp::NotEq
                    } else {
                        CompareOp::Lt
                    }));
                }
                Some('>') => {
                    self.iter.next();
                    return Some(Token::Op(if self.next_if_is('=') {
                        CompareOp::GtEq
                    } else {
                        CompareOp::Gt
                    }));
                }
                Some(_) => return Some(self.tokenize_word()),
                None => return None,
            }
        }
    }

    /// Scans a string literal body; the open quote has been consumed.
    /// An unterminated literal is accepted up to end of input.
    fn tokenize_string_literal(&mut self, quote: char) -> Token {
        let mut value = String::new();
        while let Some(ch) = self.iter.next() {
            if ch == '\\' {
                value.push(ch);
                if let Some(escaped) = self.iter.next() {
                    value.push(escaped);
                }
                continue;
            }
            if ch == quote {
                if self.next_if_is(quote) {
                    value.push(quote);
                    continue;
                }
                break;
            }
            value.push(ch);
        }
        Token::String { quote, value }
    }

    /// Accumulates everything that is not whitespace, a quote, punctuation
    /// or the start of a comparison operator into one word.
    fn tokenize_word(&mut self) -> Token {
        let word = self.next_while(|&ch| {
            !ch.is_whitespace() && !matches!(ch, '\'' | '"' | '(' | ')' | ',' | '*' | '=' | '!' | '<' | '>')
        });
        Token::word(word)
    }

    fn consume_as(&mut self, token: Token) -> Option<Token> {
        self.iter.next();
        Some(token)
    }

    #[inline]
    fn next_if_is(&mut self, ch: char) -> bool {
        self.iter.next_if_eq(&ch).is_some()
    }

    fn next_while<F: Fn(&char) -> bool>(&mut self, predicate: F) -> String {
        let mut value = String::new();
        while let Some(ch) = self.iter.next_if(&predicate) {
            value.push(ch);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tokenize {
        ($input:expr, $expected:expr) => {{
            let got = tokenize($input);
            assert_eq!(got, $expected, "input: {:?}", $input);
        }};
    }

    fn s(value: &str) -> Token {
        Token::String {
            quote: '\'',
            value: value.to_string(),
        }
    }

    #[test]
    fn tokenize_simple_select() {
        tokenize!(
            "SELECT name FROM city WHERE pop >= 100",
            vec![
                Token::word("SELECT"),
                Token::word("name"),
                Token::word("FROM"),
                Token::word("city"),
                Token::word("WHERE"),
                Token::word("pop"),
                Token::Op(CompareOp::GtEq),
                Token::word("100"),
            ]
        );
    }

    #[test]
    fn tokenize_punctuation_without_spaces() {
        tokenize!(
            "count(*),sum(pop)",
            vec![
                Token::word("count"),
                Token::LeftParen,
                Token::Asterisk,
                Token::RightParen,
                Token::Comma,
                Token::word("sum"),
                Token::LeftParen,
                Token::word("pop"),
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn tokenize_comparison_operators() {
        tokenize!(
            "a=b a!=b a<>b a<b a<=b a>b a>=b",
            vec![
                Token::word("a"),
                Token::Op(CompareOp::Eq),
                Token::word("b"),
                Token::word("a"),
                Token::Op(CompareOp::NotEq),
                Token::word("b"),
                Token::word("a"),
                Token::Op(CompareOp::NotEq),
                Token::word("b"),
                Token::word("a"),
                Token::Op(CompareOp::Lt),
                Token::word("b"),
                Token::word("a"),
                Token::Op(CompareOp::LtEq),
                Token::word("b"),
                Token::word("a"),
                Token::Op(CompareOp::Gt),
                Token::word("b"),
                Token::word("a"),
                Token::Op(CompareOp::GtEq),
                Token::word("b"),
            ]
        );
    }

    #[test]
    fn tokenize_lone_exclamation() {
        tokenize!(
            "a ! b",
            vec![Token::word("a"), Token::Exclamation, Token::word("b")]
        );
    }

    #[test]
    fn tokenize_string_literals() {
        tokenize!("'hello'", vec![s("hello")]);
        tokenize!(
            "\"two words\"",
            vec![Token::String {
                quote: '"',
                value: "two words".into()
            }]
        );
        // doubled quote embeds one quote character
        tokenize!("'it''s'", vec![s("it's")]);
        // backslash escape is preserved literally, both characters
        tokenize!("'a\\nb'", vec![s("a\\nb")]);
        // an escaped quote does not close the literal
        tokenize!("'a\\'b'", vec![s("a\\'b")]);
    }

    #[test]
    fn tokenize_unterminated_string() {
        tokenize!(
            "select 'foo",
            vec![Token::word("select"), s("foo")]
        );
    }

    #[test]
    fn tokenize_qualified_and_numeric_words() {
        tokenize!(
            "a.grp 12.5 -3",
            vec![Token::word("a.grp"), Token::word("12.5"), Token::word("-3")]
        );
    }

    #[test]
    fn words_resolve_keywords_case_insensitively() {
        let tokens = tokenize("select From wHeRe");
        assert!(tokens[0].is_keyword(swarmql_core::Keyword::SELECT));
        assert!(tokens[1].is_keyword(swarmql_core::Keyword::FROM));
        assert!(tokens[2].is_keyword(swarmql_core::Keyword::WHERE));
    }
}
