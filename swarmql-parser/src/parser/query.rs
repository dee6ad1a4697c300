#[cfg(not(feature = "std"))]
use alloc::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};

use swarmql_ast::{
    AggFunc, FromSource, JoinClause, JoinKind, JoinOn, OrderBy, SelectItem, SqlQuery,
};
use swarmql_core::{CompareOp, Keyword, Token};

use crate::{error::ParserError, parser::Parser};

/// Clause keywords that end a bare table alias.
const TABLE_ALIAS_STOP: &[Keyword] = &[
    Keyword::JOIN,
    Keyword::INNER,
    Keyword::LEFT,
    Keyword::RIGHT,
    Keyword::CROSS,
    Keyword::ON,
    Keyword::WHERE,
    Keyword::GROUP,
    Keyword::HAVING,
    Keyword::ORDER,
    Keyword::LIMIT,
    Keyword::OFFSET,
    Keyword::UNION,
];

impl Parser {
    /// Parses a query.
    ///
    /// ```txt
    /// SELECT [DISTINCT [ON (col, …)]] select_list
    ///     FROM (table | '(' subquery ')') [alias]
    ///     (join_clause)*
    ///     [WHERE expr] [GROUP BY col, …] [HAVING expr]
    ///     [ORDER BY (col [ASC | DESC] [NULLS FIRST | LAST]), …]
    ///     [LIMIT n] [OFFSET n]
    /// ```
    pub fn parse_query(&mut self) -> Result<SqlQuery, ParserError> {
        self.expect_keyword(Keyword::SELECT)?;

        let mut distinct = false;
        let mut distinct_on = vec![];
        if self.parse_keyword(Keyword::DISTINCT) {
            if self.parse_keyword(Keyword::ON) {
                distinct_on = self.parse_distinct_on()?;
            } else {
                distinct = true;
            }
        }

        let select_items = self.parse_select_list()?;

        self.expect_keyword(Keyword::FROM)?;
        let from = if self.next_token_if_is(&Token::LeftParen) {
            FromSource::Subquery(self.raw_parenthesized())
        } else {
            match self.parse_identifier() {
                Some(name) => FromSource::Table(name),
                None => return self.expected("a table name or subquery"),
            }
        };
        let from_alias = self.parse_alias(TABLE_ALIAS_STOP)?;

        let mut joins = vec![];
        while let Some(join) = self.parse_join_clause()? {
            joins.push(join);
        }

        let where_expr = if self.parse_keyword(Keyword::WHERE) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut group_by = vec![];
        if self.parse_keyword(Keyword::GROUP) {
            self.expect_keyword(Keyword::BY)?;
            group_by = self.parse_name_list();
        }

        let having_expr = if self.parse_keyword(Keyword::HAVING) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut order_by = vec![];
        if self.parse_keyword(Keyword::ORDER) {
            self.expect_keyword(Keyword::BY)?;
            order_by = self.parse_order_by_list()?;
        }

        let mut limit = -1;
        if self.parse_keyword(Keyword::LIMIT) {
            limit = self.parse_integer()?;
        }
        let mut offset = 0;
        if self.parse_keyword(Keyword::OFFSET) {
            offset = self.parse_integer()?;
        }

        Ok(SqlQuery {
            distinct,
            distinct_on,
            select_items,
            from,
            from_alias,
            joins,
            where_expr,
            group_by,
            having_expr,
            order_by,
            limit,
            offset,
        })
    }

    /// Parses the parenthesized key list of `DISTINCT ON (col, …)`.
    fn parse_distinct_on(&mut self) -> Result<Vec<String>, ParserError> {
        self.expect_token(&Token::LeftParen)?;
        let mut columns = vec![];
        loop {
            columns.push(self.consume_raw()?);
            if self.next_token_if_is(&Token::Comma) {
                continue;
            }
            self.expect_token(&Token::RightParen)?;
            break;
        }
        Ok(columns)
    }

    /// Parses the select list; at least one item is required.
    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>, ParserError> {
        let mut items = vec![];
        loop {
            if self.next_token_if_is(&Token::Asterisk) {
                items.push(SelectItem::Star);
            } else {
                items.push(self.parse_select_item()?);
            }
            if !self.next_token_if_is(&Token::Comma) {
                break;
            }
        }
        if items.is_empty() {
            return self.expected("a select list");
        }
        Ok(items)
    }

    fn parse_select_item(&mut self) -> Result<SelectItem, ParserError> {
        let head = match self.next_token() {
            Some(token) => token,
            None => return self.expected("a select item"),
        };

        let mut item = if head.is_keyword(Keyword::CASE) {
            SelectItem::Func {
                raw: self.capture_case_raw(&head),
                alias: None,
            }
        } else if self.next_token_if_is(&Token::LeftParen) {
            let args = self.raw_parenthesized();
            let fname = head.to_string().to_ascii_lowercase();
            let raw = format!("{}({})", fname, args);
            match AggFunc::from_name(&fname) {
                Some(func) => SelectItem::Aggregate {
                    func,
                    arg: if args.is_empty() {
                        "*".to_string()
                    } else {
                        args
                    },
                    raw,
                    alias: None,
                },
                None => SelectItem::Func { raw, alias: None },
            }
        } else {
            SelectItem::Column {
                column: head.to_string(),
                alias: None,
            }
        };

        let alias = self.parse_alias(&[Keyword::FROM])?;
        match &mut item {
            SelectItem::Star => {}
            SelectItem::Column { alias: slot, .. }
            | SelectItem::Aggregate { alias: slot, .. }
            | SelectItem::Func { alias: slot, .. } => *slot = alias,
        }
        Ok(item)
    }

    /// Captures a `CASE … END` body as raw text, tracking nested
    /// `CASE`/`END` pairs. `head` is the already-consumed `CASE` token.
    fn capture_case_raw(&mut self, head: &Token) -> String {
        let mut raw = head.to_string();
        let mut depth = 0usize;
        while let Some(token) = self.next_token() {
            if token.is_keyword(Keyword::CASE) {
                depth += 1;
            }
            raw.push(' ');
            raw.push_str(&token.to_string());
            if token.is_keyword(Keyword::END) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
        }
        raw
    }

    /// Parses `[AS] alias`: an `AS` makes the identifier mandatory, a bare
    /// word becomes the alias unless it reads as one of the `stop` clause
    /// keywords.
    fn parse_alias(&mut self, stop: &[Keyword]) -> Result<Option<String>, ParserError> {
        if self.parse_keyword(Keyword::AS) {
            return match self.parse_identifier() {
                Some(alias) => Ok(Some(alias)),
                None => self.expected("an alias after AS"),
            };
        }
        let alias = self.next_token_if(|token| match token.as_word() {
            Some(word) => match word.keyword {
                Some(keyword) => !stop.contains(&keyword),
                None => true,
            },
            None => false,
        });
        Ok(alias.map(|token| token.to_string()))
    }

    /// Parses one join clause, or returns `None` when the next token does
    /// not start one. `OUTER` after `LEFT`/`RIGHT` is accepted and ignored.
    fn parse_join_clause(&mut self) -> Result<Option<JoinClause>, ParserError> {
        let kind = if self.parse_keyword(Keyword::LEFT) {
            self.parse_keyword(Keyword::OUTER);
            self.expect_keyword(Keyword::JOIN)?;
            JoinKind::Left
        } else if self.parse_keyword(Keyword::RIGHT) {
            self.parse_keyword(Keyword::OUTER);
            self.expect_keyword(Keyword::JOIN)?;
            JoinKind::Right
        } else if self.parse_keyword(Keyword::CROSS) {
            self.expect_keyword(Keyword::JOIN)?;
            JoinKind::Cross
        } else if self.parse_keyword(Keyword::JOIN) {
            JoinKind::Inner
        } else if self.parse_keyword(Keyword::INNER) {
            self.expect_keyword(Keyword::JOIN)?;
            JoinKind::Inner
        } else {
            return Ok(None);
        };

        let table = match self.parse_identifier() {
            Some(table) => table,
            None => return self.expected("a join table"),
        };
        let alias = self.parse_alias(TABLE_ALIAS_STOP)?;

        let on = if kind == JoinKind::Cross {
            None
        } else {
            self.expect_keyword(Keyword::ON)?;
            let left_col = self.consume_raw()?;
            self.expect_token(&Token::Op(CompareOp::Eq))?;
            let right_col = self.consume_raw()?;
            Some(JoinOn {
                left_col,
                right_col,
            })
        };

        Ok(Some(JoinClause {
            kind,
            table,
            alias,
            on,
        }))
    }

    /// Parses a comma-separated list of raw names (`GROUP BY` keys).
    fn parse_name_list(&mut self) -> Vec<String> {
        let mut names = vec![];
        while let Some(token) = self.next_token() {
            names.push(token.to_string());
            if !self.next_token_if_is(&Token::Comma) {
                break;
            }
        }
        names
    }

    /// Parses the `ORDER BY` key list.
    fn parse_order_by_list(&mut self) -> Result<Vec<OrderBy>, ParserError> {
        let mut list = vec![];
        while !self.eof() {
            let key = self.consume_raw()?;
            let asc = if self.parse_keyword(Keyword::ASC) {
                true
            } else {
                !self.parse_keyword(Keyword::DESC)
            };
            let mut nulls_last = false;
            if self.parse_keyword(Keyword::NULLS) {
                if self.parse_keyword(Keyword::LAST) {
                    nulls_last = true;
                } else if !self.parse_keyword(Keyword::FIRST) {
                    return self.expected("FIRST or LAST after NULLS");
                }
            }
            list.push(OrderBy {
                key,
                asc,
                nulls_last,
            });
            if !self.next_token_if_is(&Token::Comma) {
                break;
            }
        }
        Ok(list)
    }

    /// Parses an integer literal for `LIMIT`/`OFFSET`.
    fn parse_integer(&mut self) -> Result<i64, ParserError> {
        let raw = self.consume_raw()?;
        match raw.parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => self.expected(format!("an integer, got '{}'", raw)),
        }
    }
}
