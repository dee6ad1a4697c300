use std::collections::HashMap;

use crate::{cell::Cell, world::Payload};

/// One in-flight row: a lowercased key → cell map.
///
/// Payload fields are inserted under three keys — bare column, `table.col`
/// and `alias.col` — so qualified and unqualified references resolve
/// without a schema. Lookup falls back to the outer row, which is how
/// correlated subqueries see the enclosing query's row.
#[derive(Clone, Debug, Default)]
pub struct Row {
    values: HashMap<String, Cell>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Row {
        Row::default()
    }

    /// Materializes a payload under its table name and alias.
    pub fn from_payload(table: &str, alias: &str, payload: &Payload) -> Row {
        let mut row = Row::new();
        let table_key = table.to_ascii_lowercase();
        let alias_key = if alias.is_empty() {
            table_key.clone()
        } else {
            alias.to_ascii_lowercase()
        };
        for field in &payload.fields {
            let col = field.name.to_ascii_lowercase();
            let cell = Cell::new(field.value.clone(), false);
            row.values
                .insert(format!("{}.{}", table_key, col), cell.clone());
            row.values
                .insert(format!("{}.{}", alias_key, col), cell.clone());
            row.values.insert(col, cell);
        }
        row
    }

    /// Materializes one row of a CTE or subquery result set. Cells land
    /// under the bare column name, plus `alias.col` when an alias is given.
    pub fn from_result_row(columns: &[String], values: &[String], alias: Option<&str>) -> Row {
        let mut row = Row::new();
        let alias_key = alias
            .filter(|alias| !alias.is_empty())
            .map(str::to_ascii_lowercase);
        for (col, value) in columns.iter().zip(values.iter()) {
            let col = col.to_ascii_lowercase();
            let cell = Cell::new(value.clone(), false);
            if let Some(alias_key) = &alias_key {
                row.values
                    .insert(format!("{}.{}", alias_key, col), cell.clone());
            }
            row.values.insert(col, cell);
        }
        row
    }

    /// Looks up a cell by name, falling back to the outer row; unknown
    /// names resolve to the null cell.
    pub fn lookup(&self, outer: Option<&Row>, name: &str) -> Cell {
        let key = name.to_ascii_lowercase();
        if let Some(cell) = self.values.get(&key) {
            return cell.clone();
        }
        if let Some(cell) = outer.and_then(|outer| outer.values.get(&key)) {
            return cell.clone();
        }
        Cell::null()
    }

    /// Inserts a cell under a lowercased key.
    pub fn insert(&mut self, key: &str, cell: Cell) {
        self.values.insert(key.to_ascii_lowercase(), cell);
    }

    /// True when the lowercased key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_ascii_lowercase())
    }

    /// Merges another row's cells in; keys already present win. Join
    /// combination relies on this so left-hand fields shadow right-hand
    /// ones.
    pub fn merge_preserving(&mut self, other: &Row) {
        for (key, cell) in &other.values {
            self.values
                .entry(key.clone())
                .or_insert_with(|| cell.clone());
        }
    }

    /// The row's unqualified keys (those without a `.`), in map order.
    pub fn unqualified_keys(&self) -> Vec<String> {
        self.values
            .keys()
            .filter(|key| !key.contains('.'))
            .cloned()
            .collect()
    }
}
