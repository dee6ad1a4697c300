// Keyword table modeled on the sorted-array scheme of
// https://github.com/sqlparser-rs/sqlparser-rs/blob/main/src/keywords.rs

/// A reserved word of the swarmql dialect.
///
/// Keywords are matched case-insensitively; the lexer resolves every bare
/// word against this table once, so the parser can compare enum values
/// instead of strings.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Keyword {
    ALL,
    AND,
    AS,
    ASC,
    BETWEEN,
    BY,
    CASE,
    CROSS,
    DELETE,
    DESC,
    DISTINCT,
    ELSE,
    END,
    EXISTS,
    FIRST,
    FROM,
    GROUP,
    HAVING,
    IN,
    INNER,
    INSERT,
    IS,
    JOIN,
    LAST,
    LEFT,
    LIKE,
    LIMIT,
    NOT,
    NULL,
    NULLS,
    OFF,
    OFFSET,
    ON,
    OR,
    ORDER,
    OUTER,
    REGEXP,
    RIGHT,
    SELECT,
    SET,
    THEN,
    UNION,
    UPDATE,
    WHEN,
    WHERE,
    WITH,
}

/// All keywords, in the same order as [`KEYWORD_STRINGS`].
const KEYWORDS: &[Keyword] = &[
    Keyword::ALL,
    Keyword::AND,
    Keyword::AS,
    Keyword::ASC,
    Keyword::BETWEEN,
    Keyword::BY,
    Keyword::CASE,
    Keyword::CROSS,
    Keyword::DELETE,
    Keyword::DESC,
    Keyword::DISTINCT,
    Keyword::ELSE,
    Keyword::END,
    Keyword::EXISTS,
    Keyword::FIRST,
    Keyword::FROM,
    Keyword::GROUP,
    Keyword::HAVING,
    Keyword::IN,
    Keyword::INNER,
    Keyword::INSERT,
    Keyword::IS,
    Keyword::JOIN,
    Keyword::LAST,
    Keyword::LEFT,
    Keyword::LIKE,
    Keyword::LIMIT,
    Keyword::NOT,
    Keyword::NULL,
    Keyword::NULLS,
    Keyword::OFF,
    Keyword::OFFSET,
    Keyword::ON,
    Keyword::OR,
    Keyword::ORDER,
    Keyword::OUTER,
    Keyword::REGEXP,
    Keyword::RIGHT,
    Keyword::SELECT,
    Keyword::SET,
    Keyword::THEN,
    Keyword::UNION,
    Keyword::UPDATE,
    Keyword::WHEN,
    Keyword::WHERE,
    Keyword::WITH,
];

/// All keyword strings, sorted for binary search.
const KEYWORD_STRINGS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CROSS", "DELETE", "DESC", "DISTINCT",
    "ELSE", "END", "EXISTS", "FIRST", "FROM", "GROUP", "HAVING", "IN", "INNER", "INSERT", "IS",
    "JOIN", "LAST", "LEFT", "LIKE", "LIMIT", "NOT", "NULL", "NULLS", "OFF", "OFFSET", "ON", "OR",
    "ORDER", "OUTER", "REGEXP", "RIGHT", "SELECT", "SET", "THEN", "UNION", "UPDATE", "WHEN",
    "WHERE", "WITH",
];

impl Keyword {
    /// Resolves a word against the keyword table, case-insensitively.
    pub fn lookup(word: &str) -> Option<Keyword> {
        if word.len() > 8 || !word.is_ascii() {
            // longest keyword is DISTINCT
            return None;
        }
        let mut buf = [0u8; 8];
        let upper = &mut buf[..word.len()];
        upper.copy_from_slice(word.as_bytes());
        upper.make_ascii_uppercase();
        let upper = core::str::from_utf8(upper).ok()?;
        KEYWORD_STRINGS
            .binary_search(&upper)
            .map(|idx| KEYWORDS[idx])
            .ok()
    }

    /// Returns the canonical (uppercase) spelling.
    pub fn as_str(&self) -> &'static str {
        // discriminant order matches the sorted string table
        KEYWORD_STRINGS[*self as usize]
    }
}

impl core::fmt::Display for Keyword {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
