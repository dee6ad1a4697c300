#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, format, string::ToString, vec};

use swarmql_ast::Expr;
use swarmql_core::{Keyword, Token};

use crate::{error::ParserError, parser::Parser};

impl Parser {
    /// Parses a predicate expression.
    ///
    /// Precedence, low to high: `OR` → `AND` → compare → primary.
    pub fn parse_expr(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_and()?;
        while self.parse_keyword(Keyword::OR) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParserError> {
        let mut left = self.parse_compare()?;
        while self.parse_keyword(Keyword::AND) {
            let right = self.parse_compare()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// Parses a primary followed by an optional comparison construct:
    /// `IS [NOT] NULL`, `[NOT] BETWEEN x AND y`, `[NOT] IN (list | subquery)`,
    /// `[NOT] LIKE pat`, `[NOT] REGEXP pat`, or `<op> primary`.
    fn parse_compare(&mut self) -> Result<Expr, ParserError> {
        let left = self.parse_primary()?;
        let negated = self.parse_keyword(Keyword::NOT);

        if self.parse_keyword(Keyword::IS) {
            let is_not = self.parse_keyword(Keyword::NOT);
            self.expect_keyword(Keyword::NULL)?;
            let expr = Expr::IsNull {
                expr: Box::new(left),
                negated: is_not,
            };
            return Ok(wrap_not(expr, negated));
        }

        if self.parse_keyword(Keyword::BETWEEN) {
            let low = self.consume_raw()?;
            self.expect_keyword(Keyword::AND)?;
            let high = self.consume_raw()?;
            let expr = Expr::Between {
                expr: Box::new(left),
                low,
                high,
            };
            return Ok(wrap_not(expr, negated));
        }

        if self.parse_keyword(Keyword::IN) {
            let expr = self.parse_in(left)?;
            return Ok(wrap_not(expr, negated));
        }

        if self.parse_keyword(Keyword::LIKE) {
            let expr = Expr::Like {
                expr: Box::new(left),
                pattern: self.consume_raw()?,
            };
            return Ok(wrap_not(expr, negated));
        }

        if self.parse_keyword(Keyword::REGEXP) {
            let expr = Expr::Regexp {
                expr: Box::new(left),
                pattern: self.consume_raw()?,
            };
            return Ok(wrap_not(expr, negated));
        }

        if let Some(op) = self.peek_token().and_then(Token::compare_op) {
            self.next_token();
            let right = self.parse_primary()?;
            let expr = Expr::Compare {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
            return Ok(wrap_not(expr, negated));
        }

        Ok(left)
    }

    /// Parses the parens following `IN`, which hold either a subquery or a
    /// list of literal values.
    fn parse_in(&mut self, left: Expr) -> Result<Expr, ParserError> {
        self.expect_token(&Token::LeftParen)?;
        if self
            .peek_token()
            .map(|token| {
                token
                    .is_one_of_keywords(&[Keyword::SELECT, Keyword::WITH])
                    .is_some()
            })
            .unwrap_or(false)
        {
            return Ok(Expr::InSubquery {
                expr: Box::new(left),
                subquery: self.raw_parenthesized(),
            });
        }
        let mut list = vec![];
        loop {
            list.push(self.consume_raw()?);
            if self.next_token_if_is(&Token::RightParen) {
                break;
            }
            self.expect_token(&Token::Comma)?;
        }
        Ok(Expr::InList {
            expr: Box::new(left),
            list,
        })
    }

    /// Parses an expression primary: a parenthesized expression,
    /// `EXISTS (subquery)`, `NOT primary`, a function call captured as raw
    /// text, or a bare value token.
    fn parse_primary(&mut self) -> Result<Expr, ParserError> {
        if self.next_token_if_is(&Token::LeftParen) {
            let inner = self.parse_expr()?;
            self.expect_token(&Token::RightParen)?;
            return Ok(inner);
        }
        if self.parse_keyword(Keyword::EXISTS) {
            self.expect_token(&Token::LeftParen)?;
            return Ok(Expr::Exists {
                subquery: self.raw_parenthesized(),
            });
        }
        if self.parse_keyword(Keyword::NOT) {
            return Ok(Expr::Not(Box::new(self.parse_primary()?)));
        }
        let head = match self.next_token() {
            Some(token) => token,
            None => return self.expected("an expression"),
        };
        if self.next_token_if_is(&Token::LeftParen) {
            let args = self.raw_parenthesized();
            return Ok(Expr::Value(format!(
                "{}({})",
                head.to_string().to_ascii_lowercase(),
                args
            )));
        }
        Ok(Expr::Value(head.to_string()))
    }
}

fn wrap_not(expr: Expr, negated: bool) -> Expr {
    if negated {
        expr.negated()
    } else {
        expr
    }
}
