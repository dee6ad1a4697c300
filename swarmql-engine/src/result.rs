/// A query result: output column names plus rows of display strings.
///
/// This is the only value handed back to the caller; everything else the
/// executor materializes is scoped to the call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SqlResult {
    /// Output column names, in select-list order (map order for `SELECT *`).
    pub columns: Vec<String>,
    /// Output rows; null cells render as empty strings.
    pub rows: Vec<Vec<String>>,
}
