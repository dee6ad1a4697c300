use swarmql_ast::Expr;

use crate::{
    cell::{compare_cells, like_match, parse_number, strip_quotes, Cell},
    compose::execute_with_outer,
    error::EngineError,
    exec::QueryEnv,
    row::Row,
    scalar::{eval_case, eval_function},
    world::World,
};

/// Evaluates a `VALUE` leaf to a cell: quoted literal, `CASE` text,
/// numeric literal, function call (row keys win, so aggregate results
/// shadow the builtins), or row lookup.
pub(crate) fn eval_value(expr: &Expr, row: &Row, outer: Option<&Row>) -> Cell {
    let raw = match expr {
        Expr::Value(raw) => raw,
        _ => return Cell::null(),
    };
    if raw.starts_with('\'') || raw.starts_with('"') {
        return Cell::new(strip_quotes(raw), false);
    }
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("case") && lower.contains(" end") {
        return eval_case(raw, row, outer);
    }
    if parse_number(raw).is_some() {
        return Cell::new(raw.clone(), false);
    }
    if raw.contains('(') && raw.ends_with(')') {
        let cell = row.lookup(outer, raw);
        if !cell.is_null {
            return cell;
        }
        return eval_function(raw, row, outer);
    }
    row.lookup(outer, raw)
}

/// Evaluates a predicate over one row.
///
/// `AND`/`OR` short-circuit; comparisons with a null operand are false; a
/// bare value is truthy when non-null and neither numerically zero nor one
/// of `""`, `"0"`, `"false"`, `"null"`.
pub(crate) fn eval_expr<W: World>(
    env: &QueryEnv<'_, W>,
    expr: &Expr,
    row: &Row,
    outer: Option<&Row>,
) -> Result<bool, EngineError> {
    match expr {
        Expr::And(lhs, rhs) => Ok(eval_expr(env, lhs, row, outer)? && eval_expr(env, rhs, row, outer)?),
        Expr::Or(lhs, rhs) => Ok(eval_expr(env, lhs, row, outer)? || eval_expr(env, rhs, row, outer)?),
        Expr::Not(inner) => Ok(!eval_expr(env, inner, row, outer)?),
        Expr::Compare { op, lhs, rhs } => {
            let a = eval_value(lhs, row, outer);
            let b = eval_value(rhs, row, outer);
            Ok(compare_cells(&a, &b, *op))
        }
        Expr::Between {
            expr: probe,
            low,
            high,
        } => {
            let a = eval_value(probe, row, outer);
            if a.is_null {
                return Ok(false);
            }
            let b = Cell::new(strip_quotes(low), false);
            let c = Cell::new(strip_quotes(high), false);
            if let (Some(na), Some(nb), Some(nc)) = (a.number, b.number, c.number) {
                return Ok(na >= nb && na <= nc);
            }
            Ok(a.text >= b.text && a.text <= c.text)
        }
        Expr::InList { expr: probe, list } => {
            let a = eval_value(probe, row, outer);
            if a.is_null {
                return Ok(false);
            }
            Ok(list.iter().any(|member| {
                let b = Cell::new(strip_quotes(member), false);
                compare_cells(&a, &b, swarmql_core::CompareOp::Eq)
            }))
        }
        Expr::InSubquery {
            expr: probe,
            subquery,
        } => {
            let a = eval_value(probe, row, outer);
            if a.is_null {
                return Ok(false);
            }
            let sub = execute_with_outer(env, subquery, Some(row))?;
            if sub.columns.is_empty() {
                return Ok(false);
            }
            Ok(sub.rows.iter().any(|r| {
                r.first()
                    .map(|first| {
                        compare_cells(
                            &a,
                            &Cell::new(first.clone(), false),
                            swarmql_core::CompareOp::Eq,
                        )
                    })
                    .unwrap_or(false)
            }))
        }
        Expr::Like {
            expr: probe,
            pattern,
        } => {
            let a = eval_value(probe, row, outer);
            if a.is_null {
                return Ok(false);
            }
            Ok(like_match(&a.text, strip_quotes(pattern)))
        }
        Expr::Regexp {
            expr: probe,
            pattern,
        } => {
            let a = eval_value(probe, row, outer);
            if a.is_null {
                return Ok(false);
            }
            let re = regex::RegexBuilder::new(strip_quotes(pattern))
                .case_insensitive(true)
                .build()
                .map_err(|_| EngineError::Eval("REGEXP-Pattern ungueltig.".into()))?;
            Ok(re.is_match(&a.text))
        }
        Expr::Exists { subquery } => {
            let sub = execute_with_outer(env, subquery, Some(row))?;
            Ok(!sub.rows.is_empty())
        }
        Expr::IsNull {
            expr: probe,
            negated,
        } => {
            let a = eval_value(probe, row, outer);
            let is_null = a.is_null || a.text.is_empty();
            Ok(*negated != is_null)
        }
        Expr::Value(_) => {
            let v = eval_value(expr, row, outer);
            if v.is_null {
                return Ok(false);
            }
            if let Some(number) = v.number {
                return Ok(number.abs() > 1e-9);
            }
            let s = v.text.to_ascii_lowercase();
            Ok(!s.is_empty() && s != "0" && s != "false" && s != "null")
        }
    }
}
