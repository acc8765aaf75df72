//! Value coercion
//!
//! Conversions between numbers, text and logicals used by operators and
//! functions. Errors are never converted: every coercion of an `Error` value
//! returns that error.

use crate::functions::date::serial_from_ymd;
use cellcalc_core::{Culture, ErrorKind, Value};
use lazy_regex::regex_captures;
use std::cmp::Ordering;

/// Result of a calculation step; `Err` is an in-cell error value
pub type CalcResult<T = Value> = Result<T, ErrorKind>;

/// Reduce an array to its top-left element
pub fn scalar(value: Value) -> Value {
    match value {
        Value::Array(rows) => rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .map_or(Value::Blank, scalar),
        other => other,
    }
}

/// Coerce to a number: logicals become 1/0, blank becomes 0, text is parsed
pub fn to_number(value: &Value, culture: &Culture) -> CalcResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Logical(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Blank => Ok(0.0),
        Value::Text(s) => parse_number(s, culture).ok_or(ErrorKind::CellValue),
        Value::Error(e) => Err(*e),
        Value::Array(rows) => match rows.first().and_then(|row| row.first()) {
            Some(first) => to_number(first, culture),
            None => Ok(0.0),
        },
    }
}

/// Coerce to display text
pub fn to_text(value: &Value, culture: &Culture) -> CalcResult<String> {
    match value {
        Value::Error(e) => Err(*e),
        other => Ok(other.to_text(culture)),
    }
}

/// Coerce to a logical; text other than TRUE/FALSE is `#VALUE!`
pub fn to_bool(value: &Value) -> CalcResult<bool> {
    match value {
        Value::Error(e) => Err(*e),
        Value::Array(rows) => match rows.first().and_then(|row| row.first()) {
            Some(first) => to_bool(first),
            None => Ok(false),
        },
        other => other.as_bool().ok_or(ErrorKind::CellValue),
    }
}

/// Parse text as a number the way a cell entry would be read
///
/// Accepts the culture's decimal separator, a leading sign, an exponent, a
/// trailing `%`, and ISO dates (`2024-03-15`) which become date serials.
pub fn parse_number(text: &str, culture: &Culture) -> Option<f64> {
    let text = text.trim();

    if let Some((_, year, month, day)) = regex_captures!(r"^(\d{4})-(\d{1,2})-(\d{1,2})$", text)
    {
        let month: u32 = month.parse().ok()?;
        let day: u32 = day.parse().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        chrono::NaiveDate::from_ymd_opt(year.parse().ok()?, month, day)?;
        return serial_from_ymd(year.parse().ok()?, month as i32, day as i32, culture.date_system);
    }

    let (body, scale) = match text.strip_suffix('%') {
        Some(body) => (body.trim_end(), 0.01),
        None => (text, 1.0),
    };

    let mut normalized = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '0'..='9' | '+' | '-' | 'e' | 'E' => normalized.push(c),
            c if c == culture.decimal_separator => normalized.push('.'),
            _ => return None,
        }
    }

    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    normalized
        .parse::<f64>()
        .ok()
        .map(|n| n * scale)
        .filter(|n| n.is_finite())
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Blank | Value::Number(_) => 0,
        Value::Text(_) => 1,
        Value::Logical(_) => 2,
        Value::Error(_) => 3,
        Value::Array(_) => 4,
    }
}

/// Order two values for comparison operators and lookups
///
/// Values of different types order Number < Text < Logical. Blank compares as
/// the zero value of the other side's type. Text compares case-insensitively.
pub fn compare(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Blank, Value::Blank) => Ordering::Equal,
        (Value::Blank, other) => compare(&blank_like(other), other),
        (other, Value::Blank) => compare(other, &blank_like(other)),
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r).unwrap_or(Ordering::Equal),
        (Value::Text(l), Value::Text(r)) => l.to_lowercase().cmp(&r.to_lowercase()),
        (Value::Logical(l), Value::Logical(r)) => l.cmp(r),
        (Value::Error(l), Value::Error(r)) => l.type_code().cmp(&r.type_code()),
        (l, r) => type_rank(l).cmp(&type_rank(r)),
    }
}

fn blank_like(other: &Value) -> Value {
    match other {
        Value::Text(_) => Value::Text(String::new()),
        Value::Logical(_) => Value::Logical(false),
        _ => Value::Number(0.0),
    }
}
