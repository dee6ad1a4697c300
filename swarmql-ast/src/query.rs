#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};
use core::fmt;

use crate::expression::Expr;

/// A parsed `SELECT` query.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SqlQuery {
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// `SELECT DISTINCT ON (col, …)` key columns; empty when absent.
    pub distinct_on: Vec<String>,
    /// The select list, never empty.
    pub select_items: Vec<SelectItem>,
    /// The driving table or inline subquery.
    pub from: FromSource,
    /// Alias for the driving source; the table name doubles as the alias
    /// when none is given.
    pub from_alias: Option<String>,
    /// Join clauses, applied left to right.
    pub joins: Vec<JoinClause>,
    /// `WHERE` predicate.
    pub where_expr: Option<Expr>,
    /// `GROUP BY` key columns.
    pub group_by: Vec<String>,
    /// `HAVING` predicate, evaluated against the synthetic aggregate row.
    pub having_expr: Option<Expr>,
    /// `ORDER BY` keys.
    pub order_by: Vec<OrderBy>,
    /// `LIMIT` row count; `-1` means not given (the session default
    /// applies).
    pub limit: i64,
    /// `OFFSET` row count.
    pub offset: i64,
}

/// The driving source of a query's `FROM` clause.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FromSource {
    /// A named table (or CTE).
    Table(String),
    /// A parenthesized subquery, carried as raw text.
    Subquery(String),
}

/// One item of the select list.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectItem {
    /// `*` — expands to the row's unqualified columns.
    Star,
    /// A plain column reference.
    Column {
        /// The column name as written (possibly `table.col`).
        column: String,
        /// `AS alias` or a bare trailing identifier.
        alias: Option<String>,
    },
    /// An aggregate call, `COUNT/SUM/AVG/MIN/MAX`.
    Aggregate {
        /// The aggregate function.
        func: AggFunc,
        /// The argument column, or `*` for `COUNT(*)`.
        arg: String,
        /// The normalized call text, `func(args)` lowercase-named; also the
        /// key aggregate results are exposed under for `HAVING`.
        raw: String,
        /// `AS alias` or a bare trailing identifier.
        alias: Option<String>,
    },
    /// A scalar function call or `CASE … END`, carried as raw text.
    Func {
        /// The reassembled call or `CASE` text.
        raw: String,
        /// `AS alias` or a bare trailing identifier.
        alias: Option<String>,
    },
}

impl SelectItem {
    /// The alias, if one was given.
    pub fn alias(&self) -> Option<&str> {
        match self {
            SelectItem::Star => None,
            SelectItem::Column { alias, .. }
            | SelectItem::Aggregate { alias, .. }
            | SelectItem::Func { alias, .. } => alias.as_deref(),
        }
    }

    /// The name this item contributes to the output column list: the alias
    /// when given, else the column or raw call text.
    pub fn output_name(&self) -> &str {
        if let Some(alias) = self.alias() {
            return alias;
        }
        match self {
            SelectItem::Star => "*",
            SelectItem::Column { column, .. } => column,
            SelectItem::Aggregate { raw, .. } | SelectItem::Func { raw, .. } => raw,
        }
    }
}

/// An aggregate function name.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AggFunc {
    /// `COUNT(*)` or `COUNT(col)`.
    Count,
    /// `SUM(col)` — unparseable cells fold in as 0.
    Sum,
    /// `AVG(col)` — 0 over an empty numeric set.
    Avg,
    /// `MIN(col)` — numeric when both sides are, else lexicographic.
    Min,
    /// `MAX(col)` — numeric when both sides are, else lexicographic.
    Max,
}

impl AggFunc {
    /// Resolves a call name, case-insensitively.
    pub fn from_name(name: &str) -> Option<AggFunc> {
        if name.eq_ignore_ascii_case("count") {
            Some(AggFunc::Count)
        } else if name.eq_ignore_ascii_case("sum") {
            Some(AggFunc::Sum)
        } else if name.eq_ignore_ascii_case("avg") {
            Some(AggFunc::Avg)
        } else if name.eq_ignore_ascii_case("min") {
            Some(AggFunc::Min)
        } else if name.eq_ignore_ascii_case("max") {
            Some(AggFunc::Max)
        } else {
            None
        }
    }

    /// The lowercase function name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggFunc::Count => "count",
            AggFunc::Sum => "sum",
            AggFunc::Avg => "avg",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A join clause.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JoinClause {
    /// The join flavor.
    pub kind: JoinKind,
    /// The joined table (or CTE).
    pub table: String,
    /// Alias for the joined table.
    pub alias: Option<String>,
    /// The `ON left = right` equality columns; `None` for `CROSS`.
    pub on: Option<JoinOn>,
}

/// The `ON <left> = <right>` columns of a join.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JoinOn {
    /// Column resolved against the accumulated left-hand row.
    pub left_col: String,
    /// Column resolved against the joined table's row.
    pub right_col: String,
}

/// Join flavor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JoinKind {
    /// Keep only matching pairs.
    Inner,
    /// Keep every left row, matched or not.
    Left,
    /// Keep every right row, matched or not.
    Right,
    /// Cartesian product, no `ON` clause.
    Cross,
}

/// One `ORDER BY` key.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrderBy {
    /// The sort key: a 1-based output position, an output column name, or
    /// a row column.
    pub key: String,
    /// Ascending unless `DESC` was given.
    pub asc: bool,
    /// `NULLS LAST`; the default places nulls first.
    pub nulls_last: bool,
}
