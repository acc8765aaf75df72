//! Math functions

use crate::coerce::{to_number, CalcResult};
use crate::context::EvaluationContext;
use cellcalc_core::{ErrorKind, Value};
use rand::Rng;

fn number(args: &[Value], index: usize, ctx: &EvaluationContext) -> CalcResult<f64> {
    to_number(&args[index], ctx.culture())
}

fn finite(n: f64) -> CalcResult {
    if n.is_finite() {
        Ok(Value::Number(n))
    } else {
        Err(ErrorKind::NumberInvalid)
    }
}

/// Digit count argument of the rounding functions
fn digits(args: &[Value], index: usize, ctx: &EvaluationContext) -> CalcResult<i32> {
    match args.get(index) {
        Some(arg) => Ok(to_number(arg, ctx.culture())?.trunc().clamp(-308.0, 308.0) as i32),
        None => Ok(0),
    }
}

/// Numbers an aggregate sees
///
/// Inside ranges only numbers count; text, logicals and blanks are skipped.
/// Direct arguments are coerced. Errors propagate either way.
fn numbers(args: &[Value], ctx: &EvaluationContext) -> CalcResult<Vec<f64>> {
    let mut result = Vec::new();
    for arg in args {
        match arg {
            Value::Array(rows) => {
                for cell in rows.iter().flatten() {
                    match cell {
                        Value::Number(n) => result.push(*n),
                        Value::Error(e) => return Err(*e),
                        _ => {}
                    }
                }
            }
            other => result.push(to_number(other, ctx.culture())?),
        }
    }
    Ok(result)
}

/// `base ^ exponent` with spreadsheet error rules
pub(crate) fn power(base: f64, exponent: f64) -> CalcResult<f64> {
    if base == 0.0 && exponent == 0.0 {
        return Err(ErrorKind::NumberInvalid);
    }
    if base == 0.0 && exponent < 0.0 {
        return Err(ErrorKind::DivisionByZero);
    }

    let result = base.powf(exponent);
    if result.is_finite() {
        Ok(result)
    } else {
        Err(ErrorKind::NumberInvalid)
    }
}

/// SUM function
pub fn fn_sum(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    finite(numbers(args, ctx)?.iter().sum())
}

/// PRODUCT function; no numbers at all gives 0
pub fn fn_product(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let values = numbers(args, ctx)?;
    if values.is_empty() {
        return Ok(Value::Number(0.0));
    }
    finite(values.iter().product())
}

/// AVERAGE function
pub fn fn_average(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let values = numbers(args, ctx)?;
    if values.is_empty() {
        return Err(ErrorKind::DivisionByZero);
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// MIN function
pub fn fn_min(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let min = numbers(args, ctx)?.into_iter().reduce(f64::min);
    Ok(Value::Number(min.unwrap_or(0.0)))
}

/// MAX function
pub fn fn_max(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let max = numbers(args, ctx)?.into_iter().reduce(f64::max);
    Ok(Value::Number(max.unwrap_or(0.0)))
}

/// COUNT function
///
/// Counts numbers in ranges; direct arguments count when they read as a
/// number. Errors are never counted.
pub fn fn_count(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let mut count = 0;
    for arg in args {
        match arg {
            Value::Array(rows) => {
                count += rows
                    .iter()
                    .flatten()
                    .filter(|v| matches!(v, Value::Number(_)))
                    .count();
            }
            Value::Blank | Value::Error(_) => {}
            other => {
                if to_number(other, ctx.culture()).is_ok() {
                    count += 1;
                }
            }
        }
    }
    Ok(Value::Number(count as f64))
}

/// COUNTA function: every non-blank value, errors included
pub fn fn_counta(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    let mut count = 0;
    for arg in args {
        match arg {
            Value::Array(rows) => {
                count += rows
                    .iter()
                    .flatten()
                    .filter(|v| !matches!(v, Value::Blank))
                    .count();
            }
            Value::Blank => {}
            _ => count += 1,
        }
    }
    Ok(Value::Number(count as f64))
}

/// COUNTBLANK function: blank cells and empty text
pub fn fn_countblank(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    let is_blank = |v: &Value| match v {
        Value::Blank => true,
        Value::Text(s) => s.is_empty(),
        _ => false,
    };

    let count = match &args[0] {
        Value::Array(rows) => rows.iter().flatten().filter(|v| is_blank(v)).count(),
        other => usize::from(is_blank(other)),
    };
    Ok(Value::Number(count as f64))
}

/// ABS function
pub fn fn_abs(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Number(number(args, 0, ctx)?.abs()))
}

/// SIGN function
pub fn fn_sign(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let n = number(args, 0, ctx)?;
    let sign = if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    };
    Ok(Value::Number(sign))
}

/// INT function: round down to the nearest integer
pub fn fn_int(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Number(number(args, 0, ctx)?.floor()))
}

/// Apply `round` at the given number of decimal digits
///
/// Negative digits round to the left of the decimal point.
fn round_at(n: f64, digits: i32, round: fn(f64) -> f64) -> CalcResult {
    let result = if digits >= 0 {
        let multiplier = 10_f64.powi(digits);
        round(n * multiplier) / multiplier
    } else {
        let divisor = 10_f64.powi(-digits);
        round(n / divisor) * divisor
    };
    finite(result)
}

fn half_away_from_zero(n: f64) -> f64 {
    if n >= 0.0 {
        (n + 0.5).floor()
    } else {
        (n - 0.5).ceil()
    }
}

fn away_from_zero(n: f64) -> f64 {
    if n >= 0.0 {
        n.ceil()
    } else {
        n.floor()
    }
}

/// TRUNC function
pub fn fn_trunc(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    round_at(number(args, 0, ctx)?, digits(args, 1, ctx)?, f64::trunc)
}

/// ROUND function; halves round away from zero
pub fn fn_round(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    round_at(number(args, 0, ctx)?, digits(args, 1, ctx)?, half_away_from_zero)
}

/// ROUNDUP function: away from zero
pub fn fn_roundup(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    round_at(number(args, 0, ctx)?, digits(args, 1, ctx)?, away_from_zero)
}

/// ROUNDDOWN function: toward zero
pub fn fn_rounddown(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    fn_trunc(args, ctx)
}

/// MOD function; the result takes the sign of the divisor
pub fn fn_mod(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let n = number(args, 0, ctx)?;
    let d = number(args, 1, ctx)?;
    if d == 0.0 {
        return Err(ErrorKind::DivisionByZero);
    }
    finite(n - d * (n / d).floor())
}

/// SQRT function
pub fn fn_sqrt(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let n = number(args, 0, ctx)?;
    if n < 0.0 {
        return Err(ErrorKind::NumberInvalid);
    }
    Ok(Value::Number(n.sqrt()))
}

/// POWER function
pub fn fn_power(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    power(number(args, 0, ctx)?, number(args, 1, ctx)?).map(Value::Number)
}

/// EXP function
pub fn fn_exp(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    finite(number(args, 0, ctx)?.exp())
}

/// LN function
pub fn fn_ln(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let n = number(args, 0, ctx)?;
    if n <= 0.0 {
        return Err(ErrorKind::NumberInvalid);
    }
    Ok(Value::Number(n.ln()))
}

/// LOG(number, [base]); base defaults to 10
pub fn fn_log(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let n = number(args, 0, ctx)?;
    let base = match args.get(1) {
        Some(arg) => to_number(arg, ctx.culture())?,
        None => 10.0,
    };

    if n <= 0.0 || base <= 0.0 {
        return Err(ErrorKind::NumberInvalid);
    }
    if base == 1.0 {
        return Err(ErrorKind::DivisionByZero);
    }
    finite(n.ln() / base.ln())
}

/// LOG10 function
pub fn fn_log10(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let n = number(args, 0, ctx)?;
    if n <= 0.0 {
        return Err(ErrorKind::NumberInvalid);
    }
    Ok(Value::Number(n.log10()))
}

/// PI function
pub fn fn_pi(_args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Number(std::f64::consts::PI))
}

/// RAND function
pub fn fn_rand(_args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    let mut rng = rand::thread_rng();
    Ok(Value::Number(rng.gen::<f64>()))
}

/// RANDBETWEEN(bottom, top) - a random integer between bottom and top (inclusive)
pub fn fn_randbetween(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let bottom = number(args, 0, ctx)?.ceil();
    let top = number(args, 1, ctx)?.floor();
    if bottom > top || bottom < i64::MIN as f64 || top > i64::MAX as f64 {
        return Err(ErrorKind::NumberInvalid);
    }

    let mut rng = rand::thread_rng();
    let result = rng.gen_range(bottom as i64..=top as i64);
    Ok(Value::Number(result as f64))
}
