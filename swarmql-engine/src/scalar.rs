use swarmql_core::{CompareOp, Keyword, Token};
use swarmql_lexer::tokenize;

use crate::{
    cell::{format_double, like_match, parse_number, strip_quotes, Cell},
    row::Row,
};

/// Splits a function argument string on top-level commas, respecting
/// quotes, and trims whitespace around each argument. A trailing empty
/// argument is dropped.
pub(crate) fn split_args(s: &str) -> Vec<String> {
    let mut args = vec![];
    let mut cur = String::new();
    let mut in_string = false;
    let mut quote = '\0';
    for ch in s.chars() {
        if (ch == '\'' || ch == '"') && (!in_string || ch == quote) {
            if in_string {
                in_string = false;
            } else {
                in_string = true;
                quote = ch;
            }
        }
        if !in_string && ch == ',' {
            args.push(std::mem::take(&mut cur));
            continue;
        }
        cur.push(ch);
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args.iter().map(|arg| arg.trim().to_string()).collect()
}

/// Resolves one function argument: a quoted literal, a numeric literal, a
/// nested call, or a row lookup.
fn eval_arg(arg: &str, row: &Row, outer: Option<&Row>) -> Cell {
    if arg.starts_with('\'') || arg.starts_with('"') {
        return Cell::new(strip_quotes(arg), false);
    }
    if parse_number(arg).is_some() {
        return Cell::new(arg, false);
    }
    if arg.contains('(') && arg.ends_with(')') {
        return eval_function(arg, row, outer);
    }
    row.lookup(outer, arg)
}

/// Evaluates a scalar builtin from its raw `name(args)` text. Unknown
/// names and malformed calls yield the null cell.
pub(crate) fn eval_function(raw: &str, row: &Row, outer: Option<&Row>) -> Cell {
    let (open, close) = match (raw.find('('), raw.rfind(')')) {
        (Some(open), Some(close)) if close > open => (open, close),
        _ => return Cell::null(),
    };
    // raw fragments are token-joined, so a nested call reads
    // "lower ( name )"; the name needs trimming before dispatch
    let fname = raw[..open].trim().to_ascii_lowercase();
    let args_str = &raw[open + 1..close];
    let args = split_args(args_str);

    match fname.as_str() {
        "coalesce" => {
            for arg in &args {
                let cell = eval_arg(arg, row, outer);
                if !cell.is_null && !cell.text.is_empty() {
                    return cell;
                }
            }
            Cell::null()
        }
        "ifnull" => {
            if args.len() < 2 {
                return Cell::null();
            }
            let cell = eval_arg(&args[0], row, outer);
            if !cell.is_null && !cell.text.is_empty() {
                cell
            } else {
                eval_arg(&args[1], row, outer)
            }
        }
        "nullif" => {
            if args.len() < 2 {
                return Cell::null();
            }
            let a = eval_arg(&args[0], row, outer);
            let b = eval_arg(&args[1], row, outer);
            if a.text == b.text {
                Cell::null()
            } else {
                a
            }
        }
        "to_int" => {
            let cell = match args.first() {
                Some(arg) => eval_arg(arg, row, outer),
                None => return Cell::null(),
            };
            match parse_number(&cell.text) {
                Some(num) => Cell::new((num as i64).to_string(), false),
                None => Cell::null(),
            }
        }
        "to_float" => {
            let cell = match args.first() {
                Some(arg) => eval_arg(arg, row, outer),
                None => return Cell::null(),
            };
            match parse_number(&cell.text) {
                Some(num) => Cell::new(format_double(num), false),
                None => Cell::null(),
            }
        }
        "cast" => eval_cast(args_str, row, outer),
        "lower" => match args.first() {
            Some(arg) => Cell::new(eval_arg(arg, row, outer).text.to_ascii_lowercase(), false),
            None => Cell::null(),
        },
        "upper" => match args.first() {
            Some(arg) => Cell::new(eval_arg(arg, row, outer).text.to_ascii_uppercase(), false),
            None => Cell::null(),
        },
        "length" => match args.first() {
            Some(arg) => Cell::new(eval_arg(arg, row, outer).text.len().to_string(), false),
            None => Cell::null(),
        },
        "concat" => {
            let mut out = String::new();
            for arg in &args {
                out.push_str(&eval_arg(arg, row, outer).text);
            }
            Cell::new(out, false)
        }
        "substring" | "substr" => eval_substring(&args, row, outer),
        _ => Cell::null(),
    }
}

/// `cast(x AS type)` — parsed on the raw argument text because the type
/// name is not a value.
fn eval_cast(args_str: &str, row: &Row, outer: Option<&Row>) -> Cell {
    let args_lower = args_str.to_ascii_lowercase();
    let as_pos = match args_lower.find(" as ") {
        Some(pos) => pos,
        None => return Cell::null(),
    };
    let value = args_str[..as_pos].trim();
    let target = args_lower[as_pos + 4..].trim();
    let cell = eval_arg(value, row, outer);
    match target {
        "int" | "integer" => match parse_number(&cell.text) {
            Some(num) => Cell::new((num as i64).to_string(), false),
            None => Cell::null(),
        },
        "float" | "real" | "double" => match parse_number(&cell.text) {
            Some(num) => Cell::new(format_double(num), false),
            None => Cell::null(),
        },
        _ => Cell::new(cell.text, cell.is_null),
    }
}

/// `substring(s, start [, len])` — 1-based start clamped to ≥ 1, negative
/// or missing length means "to end", out-of-range start yields the empty
/// string. Offsets are byte offsets.
fn eval_substring(args: &[String], row: &Row, outer: Option<&Row>) -> Cell {
    if args.len() < 2 {
        return Cell::null();
    }
    let base = eval_arg(&args[0], row, outer);
    let start = parse_number(&args[1]).map(|n| n as i64).unwrap_or(1).max(1);
    let len = args
        .get(2)
        .and_then(|arg| parse_number(arg))
        .map(|n| n as i64)
        .unwrap_or(-1);
    let bytes = base.text.as_bytes();
    let pos = (start - 1) as usize;
    if pos >= bytes.len() {
        return Cell::new("", false);
    }
    let end = if len < 0 {
        bytes.len()
    } else {
        bytes.len().min(pos + len as usize)
    };
    Cell::new(String::from_utf8_lossy(&bytes[pos..end]).into_owned(), false)
}

/// Evaluates a raw `CASE … END` expression by re-tokenizing it and walking
/// the `WHEN cond THEN value` arms. Missing `ELSE` yields null.
pub(crate) fn eval_case(raw: &str, row: &Row, outer: Option<&Row>) -> Cell {
    let tokens = tokenize(raw);
    let mut pos = 0;
    if !tokens
        .first()
        .map(|token| token.is_keyword(Keyword::CASE))
        .unwrap_or(false)
    {
        return Cell::null();
    }
    pos += 1;
    while pos < tokens.len() {
        if tokens[pos].is_keyword(Keyword::WHEN) {
            pos += 1;
            let cond_start = pos;
            while pos < tokens.len() && !tokens[pos].is_keyword(Keyword::THEN) {
                pos += 1;
            }
            let cond_end = pos;
            if pos >= tokens.len() {
                return Cell::null();
            }
            pos += 1; // THEN
            let val_start = pos;
            while pos < tokens.len()
                && !tokens[pos].is_keyword(Keyword::WHEN)
                && !tokens[pos].is_keyword(Keyword::ELSE)
                && !tokens[pos].is_keyword(Keyword::END)
            {
                pos += 1;
            }
            if eval_case_condition(&tokens[cond_start..cond_end], row, outer) {
                return resolve_case_value(&tokens[val_start..pos], row, outer);
            }
            continue;
        }
        if tokens[pos].is_keyword(Keyword::ELSE) {
            pos += 1;
            let start = pos;
            while pos < tokens.len() && !tokens[pos].is_keyword(Keyword::END) {
                pos += 1;
            }
            return resolve_case_value(&tokens[start..pos], row, outer);
        }
        if tokens[pos].is_keyword(Keyword::END) {
            break;
        }
        pos += 1;
    }
    Cell::null()
}

/// A `WHEN` condition: `lhs IS [NOT] NULL`, or a three-token comparison.
///
/// Unlike the general cell comparison, `=`/`!=` here compare texts
/// case-sensitively, `IS NULL` checks only the null flag, and a bad REGEXP
/// pattern is simply false.
fn eval_case_condition(parts: &[Token], row: &Row, outer: Option<&Row>) -> bool {
    if parts.len() >= 3 && parts[1].is_keyword(Keyword::IS) {
        let mut idx = 2;
        let is_not = parts[idx].is_keyword(Keyword::NOT);
        if is_not {
            idx += 1;
        }
        if idx < parts.len() && parts[idx].is_keyword(Keyword::NULL) {
            let cell = row.lookup(outer, &parts[0].to_string());
            return is_not != cell.is_null;
        }
    }
    if parts.len() < 3 {
        return false;
    }
    let a = row.lookup(outer, &parts[0].to_string());
    let b = match &parts[2] {
        Token::String { value, .. } => Cell::new(value.clone(), false),
        token => {
            let cell = row.lookup(outer, &token.to_string());
            if cell.is_null {
                Cell::new(token.to_string(), false)
            } else {
                cell
            }
        }
    };
    match &parts[1] {
        Token::Op(CompareOp::Eq) => a.text == b.text,
        Token::Op(CompareOp::NotEq) => a.text != b.text,
        token if token.is_keyword(Keyword::LIKE) => like_match(&a.text, &b.text),
        token if token.is_keyword(Keyword::REGEXP) => {
            match regex::RegexBuilder::new(&b.text).case_insensitive(true).build() {
                Ok(re) => re.is_match(&a.text),
                Err(_) => false,
            }
        }
        Token::Op(op) => {
            let ordered = match (a.numeric(), b.numeric()) {
                (Some(na), Some(nb)) => match op {
                    CompareOp::Lt => na < nb,
                    CompareOp::LtEq => na <= nb,
                    CompareOp::Gt => na > nb,
                    CompareOp::GtEq => na >= nb,
                    _ => false,
                },
                _ => match op {
                    CompareOp::Lt => a.text < b.text,
                    CompareOp::LtEq => a.text <= b.text,
                    CompareOp::Gt => a.text > b.text,
                    CompareOp::GtEq => a.text >= b.text,
                    _ => false,
                },
            };
            ordered
        }
        _ => false,
    }
}

/// Resolves a `THEN`/`ELSE` value: quoted literal, nested call, row
/// lookup, else the literal text itself.
fn resolve_case_value(parts: &[Token], row: &Row, outer: Option<&Row>) -> Cell {
    let mut val = String::new();
    for token in parts {
        if !val.is_empty() {
            val.push(' ');
        }
        val.push_str(&token.to_string());
    }
    if val.is_empty() {
        return Cell::null();
    }
    if val.starts_with('\'') || val.starts_with('"') {
        return Cell::new(strip_quotes(&val), false);
    }
    if val.contains('(') && val.ends_with(')') {
        return eval_function(&val, row, outer);
    }
    let cell = row.lookup(outer, &val);
    if !cell.is_null {
        return cell;
    }
    Cell::new(val, false)
}
