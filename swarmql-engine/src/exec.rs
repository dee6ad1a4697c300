use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::trace;
use swarmql_ast::{FromSource, JoinKind, OrderBy, SelectItem, SqlQuery};
use swarmql_core::CompareOp;
use swarmql_parser::parse_query;

use crate::{
    aggregate::{collect_agg_specs, AggSpec, AggState},
    cell::{compare_cells, Cell},
    error::EngineError,
    eval::eval_expr,
    result::SqlResult,
    row::Row,
    scalar::{eval_case, eval_function},
    world::{Focus, World},
};

/// Named CTE results visible to one composed query.
pub(crate) type CteMap = HashMap<String, SqlResult>;

/// Read-only query context: the store plus the optional focus disc.
pub(crate) struct QueryEnv<'a, W: World> {
    pub world: &'a W,
    pub focus: Option<Focus>,
}

/// One projected row paired with the metadata row that `ORDER BY` and
/// `DISTINCT ON` resolve non-output keys against.
type Projected = (Vec<String>, Row);

/// Executes one plain SELECT (no CTE prelude, no UNION) and returns the
/// result set together with the per-row metadata rows.
pub(crate) fn execute_single<W: World>(
    env: &QueryEnv<'_, W>,
    sql: &str,
    cte_map: &CteMap,
    outer: Option<&Row>,
) -> Result<(SqlResult, Vec<Row>), EngineError> {
    let q = parse_query(sql)
        .map_err(|_| EngineError::Parse("SQL-Parser: ungueltige Query.".into()))?;

    // Scan: CTE, inline subquery, or table.
    let from_alias = match (&q.from_alias, &q.from) {
        (Some(alias), _) => alias.clone(),
        (None, FromSource::Table(name)) => name.clone(),
        (None, FromSource::Subquery(_)) => String::new(),
    };
    let mut rows = match &q.from {
        FromSource::Subquery(sub) => {
            let (sub_result, _) = execute_single(env, sub, cte_map, outer)?;
            let alias = (!from_alias.is_empty()).then_some(from_alias.as_str());
            sub_result
                .rows
                .iter()
                .map(|r| Row::from_result_row(&sub_result.columns, r, alias))
                .collect()
        }
        FromSource::Table(table) => rows_for_table(env, table, &from_alias, cte_map),
    };

    // Joins, left to right.
    for join in &q.joins {
        let alias = join.alias.clone().unwrap_or_else(|| join.table.clone());
        let right_rows = rows_for_table(env, &join.table, &alias, cte_map);
        let mut next = vec![];
        match join.kind {
            JoinKind::Cross => {
                for lrow in &rows {
                    for rrow in &right_rows {
                        let mut combined = lrow.clone();
                        combined.merge_preserving(rrow);
                        next.push(combined);
                    }
                }
            }
            JoinKind::Right => {
                let on = join.on.as_ref();
                for rrow in &right_rows {
                    let rv = on
                        .map(|on| rrow.lookup(outer, &on.right_col))
                        .unwrap_or_else(Cell::null);
                    let mut matched = false;
                    for lrow in &rows {
                        let lv = on
                            .map(|on| lrow.lookup(outer, &on.left_col))
                            .unwrap_or_else(Cell::null);
                        if compare_cells(&lv, &rv, CompareOp::Eq) {
                            let mut combined = lrow.clone();
                            combined.merge_preserving(rrow);
                            next.push(combined);
                            matched = true;
                        }
                    }
                    if !matched {
                        next.push(rrow.clone());
                    }
                }
            }
            JoinKind::Inner | JoinKind::Left => {
                let on = join.on.as_ref();
                for lrow in &rows {
                    let lv = on
                        .map(|on| lrow.lookup(outer, &on.left_col))
                        .unwrap_or_else(Cell::null);
                    let mut matched = false;
                    for rrow in &right_rows {
                        let rv = on
                            .map(|on| rrow.lookup(outer, &on.right_col))
                            .unwrap_or_else(Cell::null);
                        if compare_cells(&lv, &rv, CompareOp::Eq) {
                            let mut combined = lrow.clone();
                            combined.merge_preserving(rrow);
                            next.push(combined);
                            matched = true;
                        }
                    }
                    if !matched && join.kind == JoinKind::Left {
                        next.push(lrow.clone());
                    }
                }
            }
        }
        rows = next;
    }

    // Filter.
    if let Some(where_expr) = &q.where_expr {
        let mut filtered = Vec::with_capacity(rows.len());
        for row in rows {
            if eval_expr(env, where_expr, &row, outer)? {
                filtered.push(row);
            }
        }
        rows = filtered;
    }
    trace!("pipeline input: {} rows", rows.len());

    // Group + project.
    let (output_columns, mut output) = project(env, &q, rows, outer)?;

    // DISTINCT.
    if q.distinct {
        let mut seen = HashSet::new();
        output.retain(|(values, _)| seen.insert(joined_key(values)));
    }

    // Stable order.
    if !q.order_by.is_empty() {
        output.sort_by(|a, b| order_cmp(&q.order_by, &output_columns, a, b, outer));
    }

    // DISTINCT ON keeps the first row per key tuple, post-order.
    if !q.distinct_on.is_empty() {
        let mut seen = HashSet::new();
        output.retain(|(values, meta)| {
            let mut key = String::new();
            for col in &q.distinct_on {
                let cell = resolve_order_cell(&output_columns, values, meta, outer, col);
                key.push_str(if cell.is_null { "NULL" } else { &cell.text });
                key.push('|');
            }
            seen.insert(key)
        });
    }

    // Slice against the query limit, falling back to the session default.
    let start = q.offset.max(0) as usize;
    let mut effective_limit = q.limit;
    if effective_limit < 0 && env.world.default_limit() >= 0 {
        effective_limit = env.world.default_limit();
    }
    let end = if effective_limit >= 0 {
        output.len().min(start.saturating_add(effective_limit as usize))
    } else {
        output.len()
    };
    let sliced: Vec<Projected> = if start < end {
        output.drain(start..end).collect()
    } else {
        vec![]
    };

    let (out_rows, meta): (Vec<_>, Vec<_>) = sliced.into_iter().unzip();
    Ok((
        SqlResult {
            columns: output_columns,
            rows: out_rows,
        },
        meta,
    ))
}

/// Materializes the scan rows for a table reference: CTE results first,
/// then the world store. Base payloads are skipped when tombstoned, when a
/// delta shadows them, or when a focused scan places them outside the
/// disc; deltas ignore the focus.
pub(crate) fn rows_for_table<W: World>(
    env: &QueryEnv<'_, W>,
    table_name: &str,
    alias: &str,
    cte_map: &CteMap,
) -> Vec<Row> {
    if let Some(result) = cte_map.get(&table_name.to_ascii_lowercase()) {
        let alias = (!alias.is_empty()).then_some(alias);
        return result
            .rows
            .iter()
            .map(|r| Row::from_result_row(&result.columns, r, alias))
            .collect();
    }
    let table_id = match env.world.find_table(table_name) {
        Some(id) => id,
        None => return vec![],
    };
    let table = &env.world.table_names()[table_id as usize];
    let mut rows = vec![];
    for payload in env.world.payloads() {
        if payload.table_id != table_id {
            continue;
        }
        let key = payload.key();
        if env.world.is_tombstoned(key) {
            continue;
        }
        if !payload.is_delta {
            if env.world.has_delta(key) {
                continue;
            }
            if let Some(focus) = &env.focus {
                if !focus.contains(payload) {
                    continue;
                }
            }
        }
        rows.push(Row::from_payload(table, alias, payload));
    }
    rows
}

/// Grouping and projection: builds groups and folds aggregates when the
/// query groups (or is aggregate-only), else projects row by row.
fn project<W: World>(
    env: &QueryEnv<'_, W>,
    q: &SqlQuery,
    rows: Vec<Row>,
    outer: Option<&Row>,
) -> Result<(Vec<String>, Vec<Projected>), EngineError> {
    let has_group = !q.group_by.is_empty();
    let mut has_aggregate = false;
    let mut has_nonagg = false;
    for item in &q.select_items {
        if matches!(item, SelectItem::Aggregate { .. }) {
            has_aggregate = true;
        } else {
            has_nonagg = true;
        }
    }
    let aggregate_only = !has_group && has_aggregate && !has_nonagg;

    if has_group || aggregate_only {
        return project_grouped(env, q, rows, outer);
    }

    if has_aggregate {
        return Err(EngineError::Semantic(
            "Aggregates ohne GROUP BY nicht erlaubt.".into(),
        ));
    }

    let has_star = q.select_items.iter().any(|item| matches!(item, SelectItem::Star));
    let output_columns: Vec<String> = if has_star {
        rows.first().map(Row::unqualified_keys).unwrap_or_default()
    } else {
        q.select_items
            .iter()
            .map(|item| item.output_name().to_string())
            .collect()
    };

    let mut output = Vec::with_capacity(rows.len());
    for row in rows {
        let mut out_row = Vec::with_capacity(output_columns.len());
        if has_star {
            for col in &output_columns {
                out_row.push(row.lookup(outer, col).output_text());
            }
        } else {
            for item in &q.select_items {
                let cell = project_item_cell(item, &row, outer);
                out_row.push(cell.output_text());
            }
        }
        output.push((out_row, row));
    }
    Ok((output_columns, output))
}

fn project_grouped<W: World>(
    env: &QueryEnv<'_, W>,
    q: &SqlQuery,
    rows: Vec<Row>,
    outer: Option<&Row>,
) -> Result<(Vec<String>, Vec<Projected>), EngineError> {
    if q.select_items.iter().any(|item| matches!(item, SelectItem::Star)) {
        return Err(EngineError::Semantic(
            "SELECT * ist mit GROUP BY nicht erlaubt.".into(),
        ));
    }

    // A GROUP BY key naming a plain column's alias groups by that column.
    let mut group_cols = q.group_by.clone();
    for gb in &mut group_cols {
        for item in &q.select_items {
            if let SelectItem::Column {
                column,
                alias: Some(alias),
            } = item
            {
                if alias.eq_ignore_ascii_case(gb) {
                    *gb = column.clone();
                }
            }
        }
    }

    let aggregate_only = q.group_by.is_empty();
    let mut groups: HashMap<String, Vec<Row>> = HashMap::new();
    for row in rows {
        let key = make_group_key(&row, outer, &group_cols);
        groups.entry(key).or_default().push(row);
    }
    // COUNT(*) over empty input still yields one row.
    if aggregate_only && groups.is_empty() {
        groups.insert(String::new(), vec![]);
    }

    let output_columns: Vec<String> = q
        .select_items
        .iter()
        .map(|item| item.output_name().to_string())
        .collect();

    // Aggregates from the select list and HAVING, deduplicated by raw text.
    let mut agg_specs: Vec<AggSpec> = vec![];
    let mut seen = HashSet::new();
    for item in &q.select_items {
        if let SelectItem::Aggregate { func, arg, raw, .. } = item {
            if seen.insert(raw.to_ascii_lowercase()) {
                agg_specs.push(AggSpec {
                    raw: raw.clone(),
                    func: *func,
                    column: arg.clone(),
                });
            }
        }
    }
    if let Some(having) = &q.having_expr {
        let mut having_specs = vec![];
        collect_agg_specs(having, &mut having_specs);
        for spec in having_specs {
            if seen.insert(spec.raw.to_ascii_lowercase()) {
                agg_specs.push(spec);
            }
        }
    }

    let mut output = vec![];
    for grows in groups.values() {
        let mut states: HashMap<&str, AggState> = agg_specs
            .iter()
            .map(|spec| (spec.raw.as_str(), AggState::default()))
            .collect();
        for row in grows {
            for spec in &agg_specs {
                if let Some(state) = states.get_mut(spec.raw.as_str()) {
                    state.update(spec, row, outer);
                }
            }
        }

        // The synthetic row HAVING sees: group keys, select-item values and
        // every aggregate result, aliases included.
        let mut agg_row = Row::new();
        if let Some(first) = grows.first() {
            for gb in &group_cols {
                agg_row.insert(gb, first.lookup(outer, gb));
            }
        }

        let mut out_row = Vec::with_capacity(q.select_items.len());
        for item in &q.select_items {
            match item {
                SelectItem::Aggregate {
                    func, raw, alias, ..
                } => {
                    let cell = states
                        .get(raw.as_str())
                        .map(|state| state.result_cell(*func))
                        .unwrap_or_else(Cell::null);
                    out_row.push(cell.output_text());
                    agg_row.insert(raw, cell.clone());
                    if let Some(alias) = alias {
                        agg_row.insert(alias, cell);
                    }
                }
                SelectItem::Func { raw, alias } => {
                    let cell = match grows.first() {
                        Some(first) => project_func_cell(raw, first, outer),
                        None => Cell::null(),
                    };
                    out_row.push(cell.output_text());
                    agg_row.insert(raw, cell.clone());
                    if let Some(alias) = alias {
                        agg_row.insert(alias, cell);
                    }
                }
                SelectItem::Column { column, alias } => {
                    let cell = match grows.first() {
                        Some(first) => first.lookup(outer, column),
                        None => Cell::null(),
                    };
                    out_row.push(cell.output_text());
                    agg_row.insert(column, cell.clone());
                    if let Some(alias) = alias {
                        agg_row.insert(alias, cell);
                    }
                }
                SelectItem::Star => unreachable!("rejected above"),
            }
        }
        for spec in &agg_specs {
            if !agg_row.contains(&spec.raw) {
                if let Some(state) = states.get(spec.raw.as_str()) {
                    agg_row.insert(&spec.raw, state.result_cell(spec.func));
                }
            }
        }

        if let Some(having) = &q.having_expr {
            if !eval_expr(env, having, &agg_row, outer)? {
                continue;
            }
        }
        output.push((out_row, agg_row));
    }
    Ok((output_columns, output))
}

/// Projects one non-aggregate select item over a row.
fn project_item_cell(item: &SelectItem, row: &Row, outer: Option<&Row>) -> Cell {
    match item {
        SelectItem::Func { raw, .. } => project_func_cell(raw, row, outer),
        SelectItem::Column { column, .. } => row.lookup(outer, column),
        SelectItem::Star | SelectItem::Aggregate { .. } => Cell::null(),
    }
}

fn project_func_cell(raw: &str, row: &Row, outer: Option<&Row>) -> Cell {
    if raw.to_ascii_lowercase().starts_with("case") {
        eval_case(raw, row, outer)
    } else {
        eval_function(raw, row, outer)
    }
}

/// The group key: per key column, `NULL` or the cell text, `|`-separated.
fn make_group_key(row: &Row, outer: Option<&Row>, cols: &[String]) -> String {
    let mut key = String::new();
    for (i, col) in cols.iter().enumerate() {
        if i > 0 {
            key.push('|');
        }
        let cell = row.lookup(outer, col);
        key.push_str(if cell.is_null { "NULL" } else { &cell.text });
    }
    key
}

/// The dedup key for DISTINCT and UNION: every value followed by `|`.
pub(crate) fn joined_key(values: &[String]) -> String {
    let mut key = String::new();
    for value in values {
        key.push_str(value);
        key.push('|');
    }
    key
}

/// Resolves an `ORDER BY`/`DISTINCT ON` key against a projected row:
/// 1-based position when the key is all digits, else a matching output
/// column, else the metadata row (with outer fallback).
fn resolve_order_cell(
    columns: &[String],
    values: &[String],
    meta: &Row,
    outer: Option<&Row>,
    key: &str,
) -> Cell {
    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(idx) = key.parse::<usize>() {
            if idx >= 1 && idx <= values.len() {
                return Cell::new(values[idx - 1].clone(), false);
            }
        }
    }
    if let Some(pos) = columns
        .iter()
        .position(|col| col.eq_ignore_ascii_case(key))
    {
        if pos < values.len() {
            return Cell::new(values[pos].clone(), false);
        }
    }
    meta.lookup(outer, key)
}

/// Stable multi-key comparison for `ORDER BY`. Numeric when both sides
/// read as numbers, byte-wise on text otherwise; `NULLS LAST` pushes null
/// cells behind non-null ones.
fn order_cmp(
    order_by: &[OrderBy],
    columns: &[String],
    a: &Projected,
    b: &Projected,
    outer: Option<&Row>,
) -> Ordering {
    for ob in order_by {
        let ca = resolve_order_cell(columns, &a.0, &a.1, outer, &ob.key);
        let cb = resolve_order_cell(columns, &b.0, &b.1, outer, &ob.key);
        if ob.nulls_last && ca.is_null != cb.is_null {
            return if ca.is_null {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        if ca.is_null && cb.is_null {
            continue;
        }
        if let (Some(na), Some(nb)) = (ca.numeric(), cb.numeric()) {
            if na == nb {
                continue;
            }
            let less = if ob.asc { na < nb } else { na > nb };
            return if less { Ordering::Less } else { Ordering::Greater };
        }
        if ca.text == cb.text {
            continue;
        }
        let ord = ca.text.cmp(&cb.text);
        return if ob.asc { ord } else { ord.reverse() };
    }
    Ordering::Equal
}
