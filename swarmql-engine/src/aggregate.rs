use swarmql_ast::{AggFunc, Expr};

use crate::{
    cell::{format_double, Cell},
    row::Row,
    scalar::split_args,
};

/// One aggregate call to fold, keyed by its raw `func(args)` text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AggSpec {
    pub raw: String,
    pub func: AggFunc,
    pub column: String,
}

/// Parses a raw value text as an aggregate call; `HAVING` predicates carry
/// their aggregates this way.
pub(crate) fn parse_agg_spec(raw: &str) -> Option<AggSpec> {
    let open = raw.find('(')?;
    let close = raw.rfind(')')?;
    if close <= open {
        return None;
    }
    let func = AggFunc::from_name(&raw[..open])?;
    let args = split_args(&raw[open + 1..close]);
    let column = args
        .into_iter()
        .next()
        .unwrap_or_else(|| "*".to_string());
    Some(AggSpec {
        raw: raw.to_string(),
        func,
        column,
    })
}

/// Collects every aggregate call mentioned in a predicate tree.
pub(crate) fn collect_agg_specs(expr: &Expr, out: &mut Vec<AggSpec>) {
    match expr {
        Expr::Value(raw) => {
            if let Some(spec) = parse_agg_spec(raw) {
                out.push(spec);
            }
        }
        Expr::Compare { lhs, rhs, .. } => {
            collect_agg_specs(lhs, out);
            collect_agg_specs(rhs, out);
        }
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
            collect_agg_specs(lhs, out);
            collect_agg_specs(rhs, out);
        }
        Expr::Not(inner) => collect_agg_specs(inner, out),
        Expr::InList { expr, .. }
        | Expr::InSubquery { expr, .. }
        | Expr::Between { expr, .. }
        | Expr::Like { expr, .. }
        | Expr::Regexp { expr, .. }
        | Expr::IsNull { expr, .. } => collect_agg_specs(expr, out),
        Expr::Exists { .. } => {}
    }
}

/// Folding state of one aggregate over one group.
#[derive(Clone, Debug, Default)]
pub(crate) struct AggState {
    count: i64,
    sum: f64,
    count_num: i64,
    min_val: Cell,
    max_val: Cell,
}

impl AggState {
    /// Folds one row into the state.
    ///
    /// `COUNT(*)` counts every row, `COUNT(col)` non-null cells only.
    /// `SUM`/`AVG` coerce unparseable cells to 0 silently.
    pub(crate) fn update(&mut self, spec: &AggSpec, row: &Row, outer: Option<&Row>) {
        match spec.func {
            AggFunc::Count => {
                if spec.column == "*" || !row.lookup(outer, &spec.column).is_null {
                    self.count += 1;
                }
            }
            AggFunc::Sum | AggFunc::Avg => {
                let cell = row.lookup(outer, &spec.column);
                self.sum += cell.numeric().unwrap_or(0.0);
                self.count_num += 1;
            }
            AggFunc::Min => {
                let cell = row.lookup(outer, &spec.column);
                update_minmax(&mut self.min_val, &cell, true);
            }
            AggFunc::Max => {
                let cell = row.lookup(outer, &spec.column);
                update_minmax(&mut self.max_val, &cell, false);
            }
        }
    }

    /// The folded result as a cell.
    pub(crate) fn result_cell(&self, func: AggFunc) -> Cell {
        match func {
            AggFunc::Count => Cell::new(self.count.to_string(), false),
            AggFunc::Sum => Cell::new(format_double(self.sum), false),
            AggFunc::Avg => {
                let avg = if self.count_num > 0 {
                    self.sum / self.count_num as f64
                } else {
                    0.0
                };
                Cell::new(format_double(avg), false)
            }
            AggFunc::Min => self.min_val.clone(),
            AggFunc::Max => self.max_val.clone(),
        }
    }
}

/// Folds a candidate into a running MIN/MAX: numeric comparison while both
/// sides carry numbers, lexicographic otherwise.
fn update_minmax(best: &mut Cell, candidate: &Cell, is_min: bool) {
    if candidate.is_null {
        return;
    }
    if !best.is_null && best.number.is_some() && candidate.number.is_some() {
        let (b, c) = (best.number.unwrap_or(0.0), candidate.number.unwrap_or(0.0));
        if (is_min && c < b) || (!is_min && c > b) {
            *best = candidate.clone();
        }
        return;
    }
    let replace = if is_min {
        best.is_null || candidate.text < best.text
    } else {
        best.is_null || candidate.text > best.text
    };
    if replace {
        *best = candidate.clone();
    }
}
