//! Text functions
//!
//! Positions and lengths count characters, not bytes.

use crate::coerce::{parse_number, to_number, to_text, CalcResult};
use crate::context::EvaluationContext;
use cellcalc_core::{ErrorKind, Value};

/// Longest text a cell can hold
const MAX_TEXT_LEN: usize = 32_767;

fn text(args: &[Value], index: usize, ctx: &EvaluationContext) -> CalcResult<String> {
    to_text(&args[index], ctx.culture())
}

/// Optional character count, defaulting to 1; negative counts are `#VALUE!`
fn count(args: &[Value], index: usize, ctx: &EvaluationContext) -> CalcResult<usize> {
    let n = match args.get(index) {
        Some(arg) => to_number(arg, ctx.culture())?.trunc(),
        None => 1.0,
    };
    if n < 0.0 {
        return Err(ErrorKind::CellValue);
    }
    Ok(n.min(usize::MAX as f64) as usize)
}

/// CHAR(number) - character for a code in 1..=255
pub fn fn_char(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let code = to_number(&args[0], ctx.culture())?.trunc();
    if !(1.0..=255.0).contains(&code) {
        return Err(ErrorKind::CellValue);
    }

    char::from_u32(code as u32)
        .map(|c| Value::Text(c.to_string()))
        .ok_or(ErrorKind::CellValue)
}

/// CODE(text) - code of the first character
pub fn fn_code(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let s = text(args, 0, ctx)?;
    s.chars()
        .next()
        .map(|c| Value::Number(f64::from(u32::from(c))))
        .ok_or(ErrorKind::CellValue)
}

/// LEN(text)
pub fn fn_len(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Number(text(args, 0, ctx)?.chars().count() as f64))
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let s = text(args, 0, ctx)?;
    let n = count(args, 1, ctx)?;
    Ok(Value::Text(s.chars().take(n).collect()))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let s = text(args, 0, ctx)?;
    let n = count(args, 1, ctx)?;
    let skip = s.chars().count().saturating_sub(n);
    Ok(Value::Text(s.chars().skip(skip).collect()))
}

/// MID(text, start_num, num_chars)
pub fn fn_mid(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let s = text(args, 0, ctx)?;
    let start = to_number(&args[1], ctx.culture())?.trunc();
    let n = count(args, 2, ctx)?;
    if start < 1.0 {
        return Err(ErrorKind::CellValue);
    }

    let skip = (start - 1.0).min(usize::MAX as f64) as usize;
    Ok(Value::Text(s.chars().skip(skip).take(n).collect()))
}

/// UPPER(text)
pub fn fn_upper(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Text(text(args, 0, ctx)?.to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Text(text(args, 0, ctx)?.to_lowercase()))
}

/// TRIM(text) - strip outer spaces and collapse inner runs to one space
pub fn fn_trim(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let s = text(args, 0, ctx)?;
    let words: Vec<&str> = s.split(' ').filter(|w| !w.is_empty()).collect();
    Ok(Value::Text(words.join(" ")))
}

/// REPT(text, number_times)
pub fn fn_rept(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let s = text(args, 0, ctx)?;
    let times = to_number(&args[1], ctx.culture())?.trunc();
    if times < 0.0 || times * s.chars().count() as f64 > MAX_TEXT_LEN as f64 {
        return Err(ErrorKind::CellValue);
    }
    Ok(Value::Text(s.repeat(times as usize)))
}

/// EXACT(text1, text2) - case-sensitive comparison
pub fn fn_exact(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(text(args, 0, ctx)? == text(args, 1, ctx)?))
}

/// CONCAT(text1, ...) - ranges contribute every cell in row order
pub fn fn_concat(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let mut result = String::new();
    for arg in args {
        match arg {
            Value::Array(rows) => {
                for cell in rows.iter().flatten() {
                    result.push_str(&to_text(cell, ctx.culture())?);
                }
            }
            other => result.push_str(&to_text(other, ctx.culture())?),
        }
    }
    Ok(Value::Text(result))
}

/// CONCATENATE(text1, ...)
pub fn fn_concatenate(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let mut result = String::new();
    for index in 0..args.len() {
        result.push_str(&text(args, index, ctx)?);
    }
    Ok(Value::Text(result))
}

/// VALUE(text) - convert text that looks like a number
pub fn fn_value(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Blank => Ok(Value::Number(0.0)),
        Value::Text(s) => parse_number(s, ctx.culture())
            .map(Value::Number)
            .ok_or(ErrorKind::CellValue),
        Value::Error(e) => Err(*e),
        _ => Err(ErrorKind::CellValue),
    }
}

/// T(value) - the value if it is text, else empty text
pub fn fn_t(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    match &args[0] {
        Value::Text(s) => Ok(Value::Text(s.clone())),
        Value::Error(e) => Err(*e),
        _ => Ok(Value::Text(String::new())),
    }
}
