use log::trace;
use swarmql_core::Keyword;
use swarmql_parser::Parser;

use crate::{
    error::EngineError,
    exec::{execute_single, joined_key, CteMap, QueryEnv},
    result::SqlResult,
    row::Row,
    world::World,
};

/// One arm of a top-level UNION. `all` records whether the `UNION`
/// keyword *following* this arm carried `ALL`.
struct UnionPart {
    sql: String,
    all: bool,
}

/// Executes a composed query: an optional `WITH` prelude feeding a CTE
/// map, then one or more `UNION [ALL]` arms.
pub(crate) fn execute_with_outer<W: World>(
    env: &QueryEnv<'_, W>,
    sql: &str,
    outer: Option<&Row>,
) -> Result<SqlResult, EngineError> {
    let mut cte_map = CteMap::new();
    let mut input = sql.trim_start().to_string();

    if input
        .get(..4)
        .map(|prefix| prefix.eq_ignore_ascii_case("with"))
        .unwrap_or(false)
    {
        input = parse_cte_prelude(env, &input, &mut cte_map, outer)?;
    }

    let parts = split_union(&input);
    if parts.len() > 1 {
        trace!("union of {} arms", parts.len());
        let mut combined = SqlResult::default();
        for (i, part) in parts.iter().enumerate() {
            let (sub, _) = execute_single(env, &part.sql, &cte_map, outer)?;
            if i == 0 {
                combined = sub;
                continue;
            }
            if sub.columns.len() != combined.columns.len() {
                return Err(EngineError::Semantic(
                    "UNION: Spaltenanzahl passt nicht.".into(),
                ));
            }
            combined.rows.extend(sub.rows);
            // The dedup step is governed by the preceding arm's ALL flag.
            if !parts[i - 1].all {
                let mut seen = std::collections::HashSet::new();
                combined.rows.retain(|row| seen.insert(joined_key(row)));
            }
        }
        return Ok(combined);
    }

    execute_single(env, &input, &cte_map, outer).map(|(result, _)| result)
}

/// Parses and executes a `WITH name AS (body), …` prelude. Each body runs
/// in order and its result enters the CTE map under the lowercased name;
/// the remaining tokens are the driving query.
fn parse_cte_prelude<W: World>(
    env: &QueryEnv<'_, W>,
    input: &str,
    cte_map: &mut CteMap,
    outer: Option<&Row>,
) -> Result<String, EngineError> {
    let mut p = Parser::new_with_sql(input);
    if !p.parse_keyword(Keyword::WITH) {
        return Err(EngineError::Parse("CTE-Parser: erwartet WITH.".into()));
    }
    loop {
        let name = match p.next_token() {
            Some(token) => token.to_string(),
            None => return Err(EngineError::Parse("CTE-Parser: Name fehlt.".into())),
        };
        if !p.parse_keyword(Keyword::AS) {
            return Err(EngineError::Parse("CTE-Parser: AS fehlt.".into()));
        }
        if !p.next_token_if_is(&swarmql_core::Token::LeftParen) {
            return Err(EngineError::Parse("CTE-Parser: Klammer fehlt.".into()));
        }
        let body = p.raw_parenthesized();
        let (result, _) = execute_single(env, &body, cte_map, outer)?;
        trace!("cte '{}': {} rows", name, result.rows.len());
        cte_map.insert(name.to_ascii_lowercase(), result);
        if p.next_token_if_is(&swarmql_core::Token::Comma) {
            continue;
        }
        return Ok(p.raw_remainder());
    }
}

/// Splits a query into top-level `UNION [ALL]` arms by scanning the token
/// stream at parenthesis depth zero.
fn split_union(sql: &str) -> Vec<UnionPart> {
    let mut p = Parser::new_with_sql(sql);
    let mut parts = vec![];
    let mut current = String::new();
    let mut depth = 0usize;
    while let Some(token) = p.next_token() {
        match &token {
            swarmql_core::Token::LeftParen => depth += 1,
            swarmql_core::Token::RightParen => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && token.is_keyword(Keyword::UNION) {
            let all = p.parse_keyword(Keyword::ALL);
            parts.push(UnionPart {
                sql: std::mem::take(&mut current),
                all,
            });
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&token.to_string());
    }
    if !current.is_empty() {
        parts.push(UnionPart {
            sql: current,
            all: false,
        });
    }
    parts
}
