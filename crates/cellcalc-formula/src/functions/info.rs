//! Information functions
//!
//! Apart from NA these receive error values as ordinary arguments.

use crate::coerce::CalcResult;
use crate::context::EvaluationContext;
use cellcalc_core::{ErrorKind, Value};

/// ISBLANK(value)
pub fn fn_isblank(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(matches!(args[0], Value::Blank)))
}

/// ISNUMBER(value)
pub fn fn_isnumber(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(matches!(args[0], Value::Number(_))))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(matches!(args[0], Value::Text(_))))
}

/// ISLOGICAL(value)
pub fn fn_islogical(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(matches!(args[0], Value::Logical(_))))
}

/// ISERROR(value)
pub fn fn_iserror(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(args[0].is_error()))
}

/// ISERR(value) - any error except #N/A
pub fn fn_iserr(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    let is_err = matches!(args[0].error(), Some(e) if e != ErrorKind::NoValueAvailable);
    Ok(Value::Logical(is_err))
}

/// ISNA(value)
pub fn fn_isna(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(
        args[0].error() == Some(ErrorKind::NoValueAvailable),
    ))
}

/// NA()
pub fn fn_na(_args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Err(ErrorKind::NoValueAvailable)
}

/// ERROR.TYPE(error_val) - 1 for #NULL! through 7 for #N/A
pub fn fn_error_type(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    args[0]
        .error()
        .and_then(|e| e.type_code())
        .map(|code| Value::Number(f64::from(code)))
        .ok_or(ErrorKind::NoValueAvailable)
}

/// N(value) - numbers pass through, TRUE is 1, anything else is 0
pub fn fn_n(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Logical(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::Error(e) => Err(*e),
        _ => Ok(Value::Number(0.0)),
    }
}
