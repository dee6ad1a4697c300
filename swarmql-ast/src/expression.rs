#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec::Vec};

use swarmql_core::CompareOp;

/// A predicate or value expression.
///
/// Leaf operands are raw token text: a quoted literal keeps its quotes, a
/// function call keeps its reassembled `name(arg …)` form, anything else is
/// a column reference or bare literal. The evaluator decides per leaf, so
/// the tree stays flat and cheap to walk.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// A raw value: literal, column reference, function call or `CASE` text.
    Value(String),
    /// `<lhs> <op> <rhs>`
    Compare {
        /// The comparison operator.
        op: CompareOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `<lhs> AND <rhs>`
    And(Box<Expr>, Box<Expr>),
    /// `<lhs> OR <rhs>`
    Or(Box<Expr>, Box<Expr>),
    /// `NOT <expr>`
    Not(Box<Expr>),
    /// `<expr> IN (v1, v2, …)` over literal values.
    InList {
        /// The probed expression.
        expr: Box<Expr>,
        /// Raw member tokens, quotes preserved.
        list: Vec<String>,
    },
    /// `<expr> IN (SELECT …)`; the subquery is re-parsed on evaluation.
    InSubquery {
        /// The probed expression.
        expr: Box<Expr>,
        /// Raw subquery text, tokens joined by single spaces.
        subquery: String,
    },
    /// `<expr> BETWEEN <low> AND <high>` (inclusive).
    Between {
        /// The probed expression.
        expr: Box<Expr>,
        /// Raw lower bound token.
        low: String,
        /// Raw upper bound token.
        high: String,
    },
    /// `<expr> LIKE <pattern>` (case-insensitive, `%`/`_` wildcards).
    Like {
        /// The probed expression.
        expr: Box<Expr>,
        /// Raw pattern token, quotes preserved.
        pattern: String,
    },
    /// `<expr> REGEXP <pattern>` (case-insensitive search).
    Regexp {
        /// The probed expression.
        expr: Box<Expr>,
        /// Raw pattern token, quotes preserved.
        pattern: String,
    },
    /// `EXISTS (SELECT …)`; the subquery is re-parsed on evaluation.
    Exists {
        /// Raw subquery text, tokens joined by single spaces.
        subquery: String,
    },
    /// `<expr> IS [NOT] NULL`. Null and empty text both count as null here.
    IsNull {
        /// The probed expression.
        expr: Box<Expr>,
        /// True for `IS NOT NULL`.
        negated: bool,
    },
}

impl Expr {
    /// Wraps `self` in a negation.
    pub fn negated(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}
