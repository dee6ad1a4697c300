#[cfg(not(feature = "std"))]
use alloc::string::String;
use core::fmt;

use crate::keyword::Keyword;

/// A lexed SQL token.
///
/// The swarmql dialect captures subqueries, CTE bodies and `CASE` arms as
/// raw text and re-parses them on evaluation, so `Display` is part of the
/// contract: rendering a token and lexing it again must round-trip.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Token {
    /// A bare word: identifier, number, or keyword.
    Word(Word),
    /// A quoted string literal. `value` holds the content between the
    /// quotes with escape sequences preserved and doubled quotes collapsed;
    /// `Display` re-attaches the surrounding quotes.
    String {
        /// The quote character, `'` or `"`.
        quote: char,
        /// The literal content without the surrounding quotes.
        value: String,
    },
    /// Comma `,`
    Comma,
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Asterisk `*`
    Asterisk,
    /// A comparison operator.
    Op(CompareOp),
    /// A lone exclamation mark (an `!` not followed by `=`).
    Exclamation,
}

impl Token {
    /// Creates a word token, resolving it against the keyword table.
    pub fn word(value: impl Into<String>) -> Self {
        let value = value.into();
        let keyword = Keyword::lookup(&value);
        Token::Word(Word { value, keyword })
    }

    /// Returns true if this token is the given keyword.
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Word(word) if word.keyword == Some(keyword))
    }

    /// Returns the matching keyword if this token is one of `keywords`.
    pub fn is_one_of_keywords(&self, keywords: &[Keyword]) -> Option<Keyword> {
        match self {
            Token::Word(Word {
                keyword: Some(kw), ..
            }) if keywords.contains(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Returns the comparison operator if this token is one.
    pub fn compare_op(&self) -> Option<CompareOp> {
        match self {
            Token::Op(op) => Some(*op),
            _ => None,
        }
    }

    /// Returns the word if this token is a bare identifier or keyword.
    pub fn as_word(&self) -> Option<&Word> {
        match self {
            Token::Word(word) => Some(word),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => f.write_str(&word.value),
            Token::String { quote, value } => write!(f, "{}{}{}", quote, value, quote),
            Token::Comma => f.write_str(","),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::Asterisk => f.write_str("*"),
            Token::Op(op) => f.write_str(op.as_str()),
            Token::Exclamation => f.write_str("!"),
        }
    }
}

/// A bare word with its keyword resolution.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Word {
    /// The word as written, case preserved.
    pub value: String,
    /// The keyword this word resolves to, if any.
    pub keyword: Option<Keyword>,
}

/// A comparison operator.
///
/// `<>` lexes to [`CompareOp::NotEq`] as well; the two spellings are
/// equivalent everywhere in the dialect.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=` or `<>`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

impl CompareOp {
    /// Returns the operator's canonical spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
