use swarmql_core::CompareOp;

/// Absolute tolerance for numeric equality. Not scale-invariant; sized for
/// coordinate-scale data.
const EPSILON: f64 = 1e-9;

/// A typed value: display text, null flag, and a cached numeric
/// interpretation when a prefix of the text reads as a number.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Display text; empty for null cells.
    pub text: String,
    /// Null flag. An empty non-null text still counts as null for
    /// `IS NULL` and in boolean context.
    pub is_null: bool,
    /// Cached numeric interpretation of `text`.
    pub number: Option<f64>,
}

impl Default for Cell {
    /// Defaults to the null cell.
    fn default() -> Cell {
        Cell::null()
    }
}

impl Cell {
    /// The null cell.
    pub fn null() -> Cell {
        Cell {
            text: String::new(),
            is_null: true,
            number: None,
        }
    }

    /// Creates a cell, caching a numeric interpretation of non-null text.
    pub fn new(text: impl Into<String>, is_null: bool) -> Cell {
        let text = text.into();
        let number = if is_null { None } else { parse_number(&text) };
        Cell {
            text,
            is_null,
            number,
        }
    }

    /// The numeric reading used by comparisons: the cached number, or a
    /// fresh prefix parse of the text.
    pub fn numeric(&self) -> Option<f64> {
        self.number.or_else(|| parse_number(&self.text))
    }

    /// The text this cell contributes to an output row; null renders
    /// empty.
    pub fn output_text(&self) -> String {
        if self.is_null {
            String::new()
        } else {
            self.text.clone()
        }
    }
}

/// Parses the longest numeric prefix of `s` as a double, `strtod`-style:
/// optional leading whitespace and sign, digits with an optional fraction,
/// an optional exponent; trailing junk is ignored. Fails only when no
/// digits were consumed.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut digits = int_digits;
    if bytes.get(end) == Some(&b'.') {
        let frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        digits += frac_digits;
        if digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    t[..end].parse::<f64>().ok()
}

/// Formats a double the way aggregate and cast results are rendered, with
/// six fractional digits.
pub(crate) fn format_double(value: f64) -> String {
    format!("{:.6}", value)
}

/// Removes one layer of matching quotes, if present.
pub(crate) fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' && last == b'\'') || (first == b'"' && last == b'"') {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Polymorphic comparison: any null operand is false; when both sides read
/// as numbers the comparison is numeric (equality within [`EPSILON`]); text
/// falls back to byte order, except `=`/`!=` which fold ASCII case.
pub(crate) fn compare_cells(a: &Cell, b: &Cell, op: CompareOp) -> bool {
    if a.is_null || b.is_null {
        return false;
    }
    if let (Some(na), Some(nb)) = (a.numeric(), b.numeric()) {
        return match op {
            CompareOp::Eq => (na - nb).abs() < EPSILON,
            CompareOp::NotEq => (na - nb).abs() > EPSILON,
            CompareOp::Lt => na < nb,
            CompareOp::LtEq => na <= nb,
            CompareOp::Gt => na > nb,
            CompareOp::GtEq => na >= nb,
        };
    }
    match op {
        CompareOp::Eq => a.text.eq_ignore_ascii_case(&b.text),
        CompareOp::NotEq => !a.text.eq_ignore_ascii_case(&b.text),
        CompareOp::Lt => a.text < b.text,
        CompareOp::LtEq => a.text <= b.text,
        CompareOp::Gt => a.text > b.text,
        CompareOp::GtEq => a.text >= b.text,
    }
}

/// Case-insensitive `LIKE`: `%` matches any run, `_` exactly one byte.
/// Greedy walk with a single backtrack point on the last `%`.
pub(crate) fn like_match(text: &str, pattern: &str) -> bool {
    let t = text.to_ascii_lowercase().into_bytes();
    let p = pattern.to_ascii_lowercase().into_bytes();
    let (mut ti, mut pi) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut restart = 0usize;
    while ti < t.len() {
        if pi < p.len() && (p[pi] == b'_' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == b'%' {
            star = Some(pi);
            pi += 1;
            restart = ti;
        } else if let Some(star_pos) = star {
            pi = star_pos + 1;
            restart += 1;
            ti = restart;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == b'%' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_takes_prefixes() {
        assert_eq!(parse_number("100"), Some(100.0));
        assert_eq!(parse_number("  -3.5xyz"), Some(-3.5));
        assert_eq!(parse_number("12.5"), Some(12.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("5."), Some(5.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("1e"), Some(1.0));
        assert_eq!(parse_number("2.5e-1k"), Some(0.25));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("."), None);
    }

    #[test]
    fn cells_cache_numbers() {
        assert_eq!(Cell::new("42", false).number, Some(42.0));
        assert_eq!(Cell::new("x", false).number, None);
        assert_eq!(Cell::new("42", true).number, None);
        assert!(Cell::null().is_null);
    }

    #[test]
    fn compare_rejects_nulls() {
        let a = Cell::null();
        let b = Cell::new("1", false);
        assert!(!compare_cells(&a, &b, CompareOp::Eq));
        assert!(!compare_cells(&a, &b, CompareOp::NotEq));
        assert!(!compare_cells(&b, &a, CompareOp::Lt));
    }

    #[test]
    fn compare_is_numeric_when_both_sides_parse() {
        let a = Cell::new("100", false);
        let b = Cell::new("100.0000000001", false);
        assert!(compare_cells(&a, &b, CompareOp::Eq));
        assert!(!compare_cells(&a, &b, CompareOp::NotEq));
        assert!(compare_cells(&Cell::new("9", false), &Cell::new("10", false), CompareOp::Lt));
    }

    #[test]
    fn compare_text_fallback() {
        // "10" < "9" lexicographically, but 10 > 9 numerically
        assert!(compare_cells(&Cell::new("10", false), &Cell::new("9", false), CompareOp::Gt));
        // equality on text ignores ASCII case
        assert!(compare_cells(&Cell::new("Ab", false), &Cell::new("aB", false), CompareOp::Eq));
        // ordering on text is byte-wise
        assert!(compare_cells(&Cell::new("a", false), &Cell::new("b", false), CompareOp::Lt));
    }

    #[test]
    fn like_wildcards() {
        assert!(like_match("Alpha", "a%"));
        assert!(like_match("Alpha", "%PHA"));
        assert!(like_match("Alpha", "_lph_"));
        assert!(like_match("Alpha", "%l%a"));
        assert!(!like_match("Alpha", "a"));
        assert!(!like_match("Alpha", "_pha"));
        assert!(like_match("", "%"));
        assert!(!like_match("", "_"));
        assert!(like_match("abc", "abc"));
    }

    #[test]
    fn strip_quotes_variants() {
        assert_eq!(strip_quotes("'abc'"), "abc");
        assert_eq!(strip_quotes("\"abc\""), "abc");
        assert_eq!(strip_quotes("'abc\""), "'abc\"");
        assert_eq!(strip_quotes("abc"), "abc");
        assert_eq!(strip_quotes("'"), "'");
    }

    #[test]
    fn format_double_is_six_digits() {
        assert_eq!(format_double(350.0), "350.000000");
        assert_eq!(format_double(-1.5), "-1.500000");
    }
}
