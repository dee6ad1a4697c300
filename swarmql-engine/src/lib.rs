//! # swarmql-engine
//!
//! swarmql-engine executes the swarmql SQL dialect against an in-memory,
//! schemaless world store: string-field rows grouped into named tables,
//! tagged with an optional 2D position and layered as deltas over a base
//! snapshot under a tombstone set.
//!
//! The entry point is [`execute_sql`]. A statement is dispatched to the
//! `SET LIMIT` handler, to the store's DML appliers, or through the query
//! pipeline: scan → join → filter → group/aggregate → project → distinct →
//! order → distinct-on → slice, with `WITH` CTEs and `UNION [ALL]`
//! composition on top.
//!
//! ```
//! use swarmql_engine::{execute_sql, MemoryWorld, Payload};
//!
//! let mut world = MemoryWorld::new();
//! let city = world.add_table("city");
//! world.insert(Payload::new(city, 1, &[("name", "A"), ("pop", "100")]));
//!
//! let result = execute_sql(&mut world, "SELECT name FROM city", None).unwrap();
//! assert_eq!(result.rows, vec![vec!["A".to_string()]]);
//! ```

#![deny(missing_docs)]
#![deny(unused_imports)]

mod aggregate;
mod cell;
mod compose;
mod error;
mod eval;
mod exec;
mod result;
mod row;
mod scalar;
mod world;

use log::debug;
use swarmql_core::Keyword;
use swarmql_parser::Parser;

use crate::exec::QueryEnv;

pub use crate::{
    error::EngineError,
    result::SqlResult,
    world::{payload_key, Focus, MemoryWorld, Payload, PayloadField, PayloadKey, World},
};

/// Executes one SQL statement against the world.
///
/// `SELECT` reads the store; `SET LIMIT` updates the session default row
/// cap; `INSERT`/`UPDATE`/`DELETE` are delegated to the world's DML
/// appliers. With a `focus`, table scans include only base rows inside the
/// focus disc (deltas always pass).
pub fn execute_sql<W: World>(
    world: &mut W,
    sql: &str,
    focus: Option<Focus>,
) -> Result<SqlResult, EngineError> {
    let lower = sql.trim_start().to_ascii_lowercase();
    if lower.starts_with("set") {
        debug!("session statement: {}", sql.trim());
        return run_set(world, sql);
    }
    if lower.starts_with("insert") {
        let rows = world.apply_insert_sql(sql).map_err(EngineError::Dml)?;
        return Ok(rows_affected(rows));
    }
    if lower.starts_with("update") {
        let rows = world.apply_update_sql(sql).map_err(EngineError::Dml)?;
        return Ok(rows_affected(rows));
    }
    if lower.starts_with("delete") {
        let rows = world.apply_delete_sql(sql).map_err(EngineError::Dml)?;
        return Ok(rows_affected(rows));
    }
    let env = QueryEnv {
        world: &*world,
        focus,
    };
    compose::execute_with_outer(&env, sql, None)
}

/// `SET LIMIT (N | OFF)` — updates the session default and echoes it.
fn run_set<W: World>(world: &mut W, sql: &str) -> Result<SqlResult, EngineError> {
    let mut p = Parser::new_with_sql(sql);
    if !p.parse_keyword(Keyword::SET) {
        return Err(EngineError::Semantic("SET: ungueltig.".into()));
    }
    if !p.parse_keyword(Keyword::LIMIT) {
        return Err(EngineError::Semantic("SET: nur LIMIT unterstuetzt.".into()));
    }
    if p.parse_keyword(Keyword::OFF) {
        world.set_default_limit(-1);
    } else {
        let raw = match p.next_token() {
            Some(token) => token.to_string(),
            None => return Err(EngineError::Semantic("SET LIMIT: Wert fehlt.".into())),
        };
        let limit = raw
            .parse::<i64>()
            .map_err(|_| EngineError::Semantic("SET LIMIT: ungueltiger Wert.".into()))?;
        world.set_default_limit(limit);
    }
    Ok(SqlResult {
        columns: vec!["limit".into()],
        rows: vec![vec![world.default_limit().to_string()]],
    })
}

fn rows_affected(count: usize) -> SqlResult {
    SqlResult {
        columns: vec!["rows_affected".into()],
        rows: vec![vec![count.to_string()]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec(world: &mut MemoryWorld, sql: &str) -> SqlResult {
        execute_sql(world, sql, None).unwrap()
    }

    fn exec_err(world: &mut MemoryWorld, sql: &str) -> String {
        execute_sql(world, sql, None).unwrap_err().to_string()
    }

    fn num(s: &str) -> f64 {
        s.parse::<f64>().unwrap()
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn city_world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        let city = world.add_table("city");
        world.insert(Payload::new(
            city,
            1,
            &[("id", "1"), ("name", "A"), ("pop", "100")],
        ));
        world.insert(Payload::new(
            city,
            2,
            &[("id", "2"), ("name", "B"), ("pop", "50")],
        ));
        world.insert(Payload::new(
            city,
            3,
            &[("id", "3"), ("name", "C"), ("pop", "200")],
        ));
        world
    }

    fn join_world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        let a = world.add_table("a");
        let b = world.add_table("b");
        world.insert(Payload::new(a, 1, &[("id", "1"), ("grp", "x")]));
        world.insert(Payload::new(a, 2, &[("id", "2"), ("grp", "x")]));
        world.insert(Payload::new(a, 3, &[("id", "3"), ("grp", "y")]));
        world.insert(Payload::new(a, 4, &[("id", "4"), ("grp", "z")]));
        world.insert(Payload::new(b, 1, &[("id", "1"), ("val", "5")]));
        world.insert(Payload::new(b, 2, &[("id", "2"), ("val", "10")]));
        world.insert(Payload::new(b, 3, &[("id", "3"), ("val", "20")]));
        world
    }

    #[test]
    fn select_filter_order() {
        let mut world = city_world();
        let result = exec(
            &mut world,
            "SELECT name FROM city WHERE pop >= 100 ORDER BY pop DESC",
        );
        assert_eq!(result.columns, vec!["name".to_string()]);
        assert_eq!(result.rows, vec![row(&["C"]), row(&["A"])]);
    }

    #[test]
    fn count_and_sum_without_group() {
        let mut world = city_world();
        let result = exec(&mut world, "SELECT COUNT(*), SUM(pop) FROM city");
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0][0], "3");
        assert_eq!(num(&result.rows[0][1]), 350.0);
    }

    #[test]
    fn left_join_group_having() {
        let mut world = join_world();
        let result = exec(
            &mut world,
            "SELECT a.grp, SUM(b.val) FROM a LEFT JOIN b ON a.id = b.id \
             GROUP BY a.grp HAVING SUM(b.val) > 10 ORDER BY a.grp",
        );
        assert_eq!(result.columns[0], "a.grp");
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0][0], "x");
        assert_eq!(num(&result.rows[0][1]), 15.0);
        assert_eq!(result.rows[1][0], "y");
        assert_eq!(num(&result.rows[1][1]), 20.0);
    }

    #[test]
    fn like_filter() {
        let mut world = city_world();
        let result = exec(&mut world, "SELECT name FROM city WHERE name LIKE 'A%'");
        assert_eq!(result.rows, vec![row(&["A"])]);
    }

    #[test]
    fn cte_feeds_aggregate() {
        let mut world = city_world();
        let result = exec(
            &mut world,
            "WITH big AS (SELECT * FROM city WHERE pop >= 100) SELECT COUNT(*) FROM big",
        );
        assert_eq!(result.rows, vec![row(&["2"])]);
    }

    #[test]
    fn in_subquery() {
        let mut world = city_world();
        let result = exec(
            &mut world,
            "SELECT name FROM city WHERE id IN (SELECT id FROM city WHERE pop = 200)",
        );
        assert_eq!(result.rows, vec![row(&["C"])]);
    }

    #[test]
    fn correlated_exists() {
        let mut world = city_world();
        let result = exec(
            &mut world,
            "SELECT name FROM city c WHERE EXISTS \
             (SELECT id FROM city WHERE id = c.id AND pop > 100)",
        );
        assert_eq!(result.rows, vec![row(&["C"])]);
    }

    #[test]
    fn count_star_on_empty_table_is_zero() {
        let mut world = MemoryWorld::new();
        world.add_table("empty");
        let result = exec(&mut world, "SELECT COUNT(*) FROM empty");
        assert_eq!(result.rows, vec![row(&["0"])]);
    }

    #[test]
    fn plain_select_on_empty_table_keeps_columns() {
        let mut world = MemoryWorld::new();
        world.add_table("empty");
        let result = exec(&mut world, "SELECT a FROM empty");
        assert_eq!(result.columns, vec!["a".to_string()]);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn limit_offset_slicing() {
        let mut world = city_world();
        let result = exec(&mut world, "SELECT id FROM city ORDER BY id LIMIT 2 OFFSET 1");
        assert_eq!(result.rows, vec![row(&["2"]), row(&["3"])]);
        let result = exec(&mut world, "SELECT id FROM city LIMIT 0");
        assert!(result.rows.is_empty());
        let result = exec(&mut world, "SELECT id FROM city OFFSET 99");
        assert!(result.rows.is_empty());
    }

    #[test]
    fn session_default_limit_applies() {
        let mut world = city_world();
        let result = exec(&mut world, "SET LIMIT 2");
        assert_eq!(result.columns, vec!["limit".to_string()]);
        assert_eq!(result.rows, vec![row(&["2"])]);
        assert_eq!(exec(&mut world, "SELECT id FROM city").rows.len(), 2);
        // an explicit LIMIT wins over the session default
        assert_eq!(exec(&mut world, "SELECT id FROM city LIMIT 3").rows.len(), 3);
        let result = exec(&mut world, "SET LIMIT OFF");
        assert_eq!(result.rows, vec![row(&["-1"])]);
        assert_eq!(exec(&mut world, "SELECT id FROM city").rows.len(), 3);
    }

    #[test]
    fn set_errors() {
        let mut world = city_world();
        assert_eq!(exec_err(&mut world, "SET LIMIT abc"), "SET LIMIT: ungueltiger Wert.");
        assert_eq!(exec_err(&mut world, "SET LIMIT"), "SET LIMIT: Wert fehlt.");
        assert_eq!(exec_err(&mut world, "SET COLOR red"), "SET: nur LIMIT unterstuetzt.");
        assert_eq!(exec_err(&mut world, "settle down"), "SET: ungueltig.");
    }

    #[test]
    fn dml_defaults_error_and_overrides_delegate() {
        let mut world = city_world();
        assert_eq!(exec_err(&mut world, "INSERT INTO city VALUES (4)"), "INSERT: nicht implementiert.");
        assert_eq!(exec_err(&mut world, "UPDATE city SET pop = 1"), "UPDATE: nicht implementiert.");
        assert_eq!(exec_err(&mut world, "DELETE FROM city"), "DELETE: nicht implementiert.");

        struct DmlWorld(MemoryWorld);
        impl World for DmlWorld {
            fn table_names(&self) -> &[String] {
                self.0.table_names()
            }
            fn find_table(&self, name: &str) -> Option<u32> {
                self.0.find_table(name)
            }
            fn payloads(&self) -> &[Payload] {
                self.0.payloads()
            }
            fn is_tombstoned(&self, key: PayloadKey) -> bool {
                self.0.is_tombstoned(key)
            }
            fn has_delta(&self, key: PayloadKey) -> bool {
                self.0.has_delta(key)
            }
            fn default_limit(&self) -> i64 {
                self.0.default_limit()
            }
            fn set_default_limit(&mut self, limit: i64) {
                self.0.set_default_limit(limit)
            }
            fn apply_insert_sql(&mut self, _sql: &str) -> Result<usize, String> {
                Ok(1)
            }
        }
        let mut world = DmlWorld(city_world());
        let result = execute_sql(&mut world, "INSERT INTO city VALUES (4)", None).unwrap();
        assert_eq!(result.columns, vec!["rows_affected".to_string()]);
        assert_eq!(result.rows, vec![row(&["1"])]);
    }

    #[test]
    fn distinct_dedups_and_is_idempotent() {
        let mut world = MemoryWorld::new();
        let t = world.add_table("t");
        for (id, grp) in [(1, "x"), (2, "x"), (3, "y")] {
            world.insert(Payload::new(t, id, &[("id", &id.to_string()), ("grp", grp)]));
        }
        let result = exec(&mut world, "SELECT DISTINCT grp FROM t ORDER BY grp");
        assert_eq!(result.rows, vec![row(&["x"]), row(&["y"])]);
        let again = exec(&mut world, "SELECT DISTINCT grp FROM t ORDER BY grp");
        assert_eq!(result, again);
    }

    #[test]
    fn distinct_on_keeps_first_per_key_after_order() {
        let mut world = MemoryWorld::new();
        let t = world.add_table("t");
        for (id, grp, pop) in [(1, "x", "10"), (2, "x", "30"), (3, "y", "20")] {
            world.insert(Payload::new(
                t,
                id,
                &[("id", &id.to_string()), ("grp", grp), ("pop", pop)],
            ));
        }
        let result = exec(
            &mut world,
            "SELECT DISTINCT ON (grp) id FROM t ORDER BY grp, pop DESC",
        );
        assert_eq!(result.rows, vec![row(&["2"]), row(&["3"])]);
    }

    #[test]
    fn union_dedup_and_all() {
        let mut world = city_world();
        let result = exec(
            &mut world,
            "SELECT name FROM city WHERE pop = 100 UNION SELECT name FROM city ORDER BY name",
        );
        assert_eq!(result.rows.len(), 3);
        let result = exec(
            &mut world,
            "SELECT name FROM city WHERE pop = 100 UNION ALL SELECT name FROM city",
        );
        assert_eq!(result.rows.len(), 4);
        assert_eq!(
            exec_err(&mut world, "SELECT name FROM city UNION SELECT id, name FROM city"),
            "UNION: Spaltenanzahl passt nicht."
        );
    }

    #[test]
    fn union_dedup_follows_preceding_flag() {
        let mut world = city_world();
        // ALL first: the plain UNION at the end deduplicates everything
        let result = exec(
            &mut world,
            "SELECT name FROM city UNION ALL SELECT name FROM city UNION SELECT name FROM city",
        );
        assert_eq!(result.rows.len(), 3);
        // plain first: dedup happens mid-way, the trailing ALL concatenates
        let result = exec(
            &mut world,
            "SELECT name FROM city UNION SELECT name FROM city UNION ALL SELECT name FROM city",
        );
        assert_eq!(result.rows.len(), 6);
    }

    #[test]
    fn focus_filters_base_rows_only() {
        let mut world = MemoryWorld::new();
        let bot = world.add_table("bot");
        world.insert(Payload::new(bot, 1, &[("name", "near")]).placed_at(1, 1));
        world.insert(Payload::new(bot, 2, &[("name", "far")]).placed_at(50, 50));
        world.insert(Payload::new(bot, 3, &[("name", "unplaced")]));
        world.insert(Payload::new(bot, 4, &[("name", "delta-far")]).placed_at(60, 60).delta());
        let focus = Some(Focus {
            x: 0,
            y: 0,
            radius: 5,
        });
        let result = execute_sql(&mut world, "SELECT name FROM bot ORDER BY name", focus).unwrap();
        assert_eq!(result.rows, vec![row(&["delta-far"]), row(&["near"])]);
        // without focus every row is visible
        let result = exec(&mut world, "SELECT COUNT(*) FROM bot");
        assert_eq!(result.rows, vec![row(&["4"])]);
    }

    #[test]
    fn deltas_shadow_bases_and_tombstones_hide() {
        let mut world = MemoryWorld::new();
        let bot = world.add_table("bot");
        world.insert(Payload::new(bot, 1, &[("name", "base")]));
        world.insert(Payload::new(bot, 1, &[("name", "delta")]).delta());
        world.insert(Payload::new(bot, 2, &[("name", "doomed")]));
        world.tombstone(bot, 2);
        let result = exec(&mut world, "SELECT name FROM bot");
        assert_eq!(result.rows, vec![row(&["delta"])]);
    }

    #[test]
    fn select_star_exposes_unqualified_columns() {
        let mut world = city_world();
        let result = exec(&mut world, "SELECT * FROM city WHERE id = 1");
        let mut columns = result.columns.clone();
        columns.sort();
        assert_eq!(columns, vec!["id".to_string(), "name".to_string(), "pop".to_string()]);
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn semantic_errors() {
        let mut world = city_world();
        assert_eq!(
            exec_err(&mut world, "SELECT * FROM city GROUP BY name"),
            "SELECT * ist mit GROUP BY nicht erlaubt."
        );
        assert_eq!(
            exec_err(&mut world, "SELECT name, COUNT(*) FROM city"),
            "Aggregates ohne GROUP BY nicht erlaubt."
        );
        assert_eq!(
            exec_err(&mut world, "SELECT name FROM city WHERE name REGEXP '['"),
            "REGEXP-Pattern ungueltig."
        );
        assert_eq!(
            exec_err(&mut world, "SELEKT name FROM city"),
            "SQL-Parser: ungueltige Query."
        );
    }

    #[test]
    fn cte_errors() {
        let mut world = city_world();
        assert_eq!(
            exec_err(&mut world, "WITH big SELECT 1"),
            "CTE-Parser: AS fehlt."
        );
        assert_eq!(
            exec_err(&mut world, "WITH big AS SELECT 1"),
            "CTE-Parser: Klammer fehlt."
        );
        assert_eq!(exec_err(&mut world, "WITH"), "CTE-Parser: Name fehlt.");
    }

    #[test]
    fn order_by_positional_and_nulls_last() {
        let mut world = MemoryWorld::new();
        let t = world.add_table("t");
        world.insert(Payload::new(t, 1, &[("a", "2"), ("b", "")]));
        world.insert(Payload::new(t, 2, &[("a", "1"), ("b", "y")]));
        world.insert(Payload::new(t, 3, &[("a", "3"), ("b", "x")]));
        let result = exec(&mut world, "SELECT a FROM t ORDER BY 1 DESC");
        assert_eq!(result.rows, vec![row(&["3"]), row(&["2"]), row(&["1"])]);
        // the empty-string cell is not null, so NULLS LAST keeps plain
        // text order here; a missing column is null and sorts last
        let result = exec(&mut world, "SELECT a FROM t ORDER BY missing NULLS LAST, a");
        assert_eq!(result.rows.len(), 3);
    }

    #[test]
    fn order_reversal_round_trip() {
        let mut world = city_world();
        let asc = exec(&mut world, "SELECT pop FROM city ORDER BY pop");
        let desc = exec(&mut world, "SELECT pop FROM city ORDER BY pop DESC");
        let mut reversed = asc.rows.clone();
        reversed.reverse();
        assert_eq!(desc.rows, reversed);
    }

    #[test]
    fn having_resolves_aggregate_alias() {
        let mut world = join_world();
        let result = exec(
            &mut world,
            "SELECT a.grp, SUM(b.val) AS total FROM a LEFT JOIN b ON a.id = b.id \
             GROUP BY a.grp HAVING total > 10 ORDER BY a.grp",
        );
        assert_eq!(result.columns, vec!["a.grp".to_string(), "total".to_string()]);
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn group_by_accepts_select_alias() {
        let mut world = join_world();
        let result = exec(
            &mut world,
            "SELECT grp AS g, COUNT(*) FROM a GROUP BY g ORDER BY g",
        );
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0], row(&["x", "2"]));
    }

    #[test]
    fn from_subquery_with_alias() {
        let mut world = city_world();
        let result = exec(
            &mut world,
            "SELECT t.name FROM (SELECT name FROM city WHERE pop >= 100) t ORDER BY t.name",
        );
        assert_eq!(result.rows, vec![row(&["A"]), row(&["C"])]);
    }

    #[test]
    fn case_projection() {
        let mut world = city_world();
        let result = exec(
            &mut world,
            "SELECT name, CASE WHEN pop >= 100 THEN 'big' ELSE 'small' END AS size \
             FROM city ORDER BY name",
        );
        assert_eq!(
            result.rows,
            vec![row(&["A", "big"]), row(&["B", "small"]), row(&["C", "big"])]
        );
    }

    #[test]
    fn is_null_matches_missing_and_empty_fields() {
        let mut world = MemoryWorld::new();
        let t = world.add_table("t");
        world.insert(Payload::new(t, 1, &[("id", "1"), ("tag", "")]));
        world.insert(Payload::new(t, 2, &[("id", "2"), ("tag", "set")]));
        world.insert(Payload::new(t, 3, &[("id", "3")]));
        let result = exec(&mut world, "SELECT id FROM t WHERE tag IS NULL ORDER BY id");
        assert_eq!(result.rows, vec![row(&["1"]), row(&["3"])]);
        let result = exec(&mut world, "SELECT id FROM t WHERE tag IS NOT NULL");
        assert_eq!(result.rows, vec![row(&["2"])]);
    }

    #[test]
    fn cross_and_right_joins() {
        let mut world = MemoryWorld::new();
        let l = world.add_table("l");
        let r = world.add_table("r");
        world.insert(Payload::new(l, 1, &[("id", "1")]));
        world.insert(Payload::new(l, 2, &[("id", "2")]));
        world.insert(Payload::new(r, 1, &[("rid", "1"), ("tag", "t1")]));
        world.insert(Payload::new(r, 2, &[("rid", "9"), ("tag", "t9")]));
        let result = exec(&mut world, "SELECT id FROM l CROSS JOIN r");
        assert_eq!(result.rows.len(), 4);
        // unmatched right rows survive a RIGHT JOIN on their own
        let result = exec(
            &mut world,
            "SELECT tag FROM l RIGHT JOIN r ON id = rid ORDER BY tag",
        );
        assert_eq!(result.rows, vec![row(&["t1"]), row(&["t9"])]);
    }

    #[test]
    fn queries_are_deterministic() {
        let mut world = city_world();
        let sql = "SELECT name, pop FROM city WHERE pop > 10 ORDER BY pop DESC LIMIT 2";
        let first = exec(&mut world, sql);
        let second = exec(&mut world, sql);
        assert_eq!(first, second);
    }
}
