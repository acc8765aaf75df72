//! Logical functions
//!
//! IF, IFERROR, IFNA, AND and OR evaluate their own arguments so that
//! branches not taken are never computed.

use crate::ast::Expr;
use crate::coerce::{scalar, to_bool, CalcResult};
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::evaluator::Evaluator;
use cellcalc_core::{ErrorKind, Value};

/// IF(condition, then, [else])
pub fn fn_if(args: &[Expr], ev: &Evaluator) -> FormulaResult<Value> {
    let condition = scalar(ev.evaluate(&args[0])?);

    match to_bool(&condition) {
        Ok(true) => ev.evaluate(&args[1]),
        Ok(false) => match args.get(2) {
            Some(otherwise) => ev.evaluate(otherwise),
            None => Ok(Value::Logical(false)),
        },
        Err(e) => Ok(Value::Error(e)),
    }
}

/// IFERROR(value, fallback)
pub fn fn_iferror(args: &[Expr], ev: &Evaluator) -> FormulaResult<Value> {
    let value = ev.evaluate_trapping(&args[0])?;
    if scalar(value.clone()).is_error() {
        ev.evaluate(&args[1])
    } else {
        Ok(value)
    }
}

/// IFNA(value, fallback)
pub fn fn_ifna(args: &[Expr], ev: &Evaluator) -> FormulaResult<Value> {
    let value = ev.evaluate_trapping(&args[0])?;
    if scalar(value.clone()).error() == Some(ErrorKind::NoValueAvailable) {
        ev.evaluate(&args[1])
    } else {
        Ok(value)
    }
}

/// Logical values an argument contributes
///
/// Inside ranges, text and blanks are skipped. A direct text argument must
/// read as TRUE or FALSE.
fn logicals(value: &Value) -> CalcResult<Vec<bool>> {
    match value {
        Value::Array(rows) => {
            let mut result = Vec::new();
            for cell in rows.iter().flatten() {
                match cell {
                    Value::Error(e) => return Err(*e),
                    Value::Logical(b) => result.push(*b),
                    Value::Number(n) => result.push(*n != 0.0),
                    _ => {}
                }
            }
            Ok(result)
        }
        other => to_bool(other).map(|b| vec![b]),
    }
}

/// Shared body of AND and OR: stop at the first `decisive` value
fn short_circuit(args: &[Expr], ev: &Evaluator, decisive: bool) -> FormulaResult<Value> {
    let mut seen = false;

    for arg in args {
        let value = ev.evaluate_range(arg)?;
        match logicals(&value) {
            Ok(values) => {
                seen |= !values.is_empty();
                if values.contains(&decisive) {
                    return Ok(Value::Logical(decisive));
                }
            }
            Err(e) => return Ok(Value::Error(e)),
        }
    }

    if seen {
        Ok(Value::Logical(!decisive))
    } else {
        Ok(Value::Error(ErrorKind::CellValue))
    }
}

/// AND(logical1, ...)
pub fn fn_and(args: &[Expr], ev: &Evaluator) -> FormulaResult<Value> {
    short_circuit(args, ev, false)
}

/// OR(logical1, ...)
pub fn fn_or(args: &[Expr], ev: &Evaluator) -> FormulaResult<Value> {
    short_circuit(args, ev, true)
}

/// NOT(logical)
pub fn fn_not(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    to_bool(&args[0]).map(|b| Value::Logical(!b))
}

/// XOR(logical1, ...)
pub fn fn_xor(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    let mut seen = false;
    let mut odd = false;
    for arg in args {
        for b in logicals(arg)? {
            seen = true;
            odd ^= b;
        }
    }

    if seen {
        Ok(Value::Logical(odd))
    } else {
        Err(ErrorKind::CellValue)
    }
}

/// TRUE()
pub fn fn_true(_args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(true))
}

/// FALSE()
pub fn fn_false(_args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Logical(false))
}

#[cfg(test)]
mod tests {
    use crate::context::EvaluationContext;
    use crate::error::FormulaError;
    use crate::evaluator::evaluate_formula;
    use cellcalc_core::{ErrorKind, Value};
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> Value {
        evaluate_formula(formula, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_if() {
        assert_eq!(eval("=IF(TRUE,1,2)"), Value::Number(1.0));
        assert_eq!(eval("=IF(0,1,2)"), Value::Number(2.0));
        assert_eq!(eval("=IF(1>2,1)"), Value::Logical(false));
        assert_eq!(eval("=IF(\"true\",\"y\",\"n\")"), Value::from("y"));
        assert_eq!(eval("=IF(\"maybe\",1,2)"), Value::Error(ErrorKind::CellValue));
        assert_eq!(eval("=IF(NA(),1,2)"), Value::Error(ErrorKind::NoValueAvailable));
    }

    #[test]
    fn test_if_skips_untaken_branch() {
        assert_eq!(eval("=IF(TRUE,1,1/0)"), Value::Number(1.0));
        assert_eq!(eval("=IF(FALSE,XXX,2)"), Value::Number(2.0));
        assert_eq!(
            evaluate_formula("=IF(TRUE,XXX,2)", &EvaluationContext::simple()),
            Err(FormulaError::NameNotRecognized("XXX".to_string()))
        );
    }

    #[test]
    fn test_iferror() {
        assert_eq!(eval("=IFERROR(1/0,\"oops\")"), Value::from("oops"));
        assert_eq!(eval("=IFERROR(5,\"oops\")"), Value::Number(5.0));
        assert_eq!(eval("=IFERROR(NA(),0)"), Value::Number(0.0));
        assert_eq!(eval("=IFERROR(IFERROR(XXX,1/0),\"Success\")"), Value::from("Success"));
    }

    #[test]
    fn test_ifna() {
        assert_eq!(eval("=IFNA(NA(),\"missing\")"), Value::from("missing"));
        assert_eq!(eval("=IFNA(1/0,\"missing\")"), Value::Error(ErrorKind::DivisionByZero));
        assert_eq!(eval("=IFNA(3,\"missing\")"), Value::Number(3.0));
    }

    #[test]
    fn test_and_or() {
        assert_eq!(eval("=AND(TRUE,1,\"TRUE\")"), Value::Logical(true));
        assert_eq!(eval("=AND(TRUE,0)"), Value::Logical(false));
        assert_eq!(eval("=OR(FALSE,0,2)"), Value::Logical(true));
        assert_eq!(eval("=OR(FALSE,0)"), Value::Logical(false));
        assert_eq!(eval("=AND(\"abc\")"), Value::Error(ErrorKind::CellValue));
        assert_eq!(eval("=AND({1,\"x\",TRUE})"), Value::Logical(true));
        assert_eq!(eval("=OR({\"x\",\"y\"})"), Value::Error(ErrorKind::CellValue));
        assert_eq!(eval("=AND(TRUE,1/0)"), Value::Error(ErrorKind::DivisionByZero));
    }

    #[test]
    fn test_and_or_short_circuit() {
        assert_eq!(eval("=AND(FALSE,1/0)"), Value::Logical(false));
        assert_eq!(eval("=OR(TRUE,XXX)"), Value::Logical(true));
    }

    #[test]
    fn test_not_xor() {
        assert_eq!(eval("=NOT(TRUE)"), Value::Logical(false));
        assert_eq!(eval("=NOT(0)"), Value::Logical(true));
        assert_eq!(eval("=NOT(\"x\")"), Value::Error(ErrorKind::CellValue));
        assert_eq!(eval("=XOR(TRUE,TRUE,TRUE)"), Value::Logical(true));
        assert_eq!(eval("=XOR({TRUE,TRUE},FALSE)"), Value::Logical(false));
        assert_eq!(eval("=TRUE()"), Value::Logical(true));
        assert_eq!(eval("=FALSE()"), Value::Logical(false));
    }
}
