//! # cellcalc
//!
//! A spreadsheet formula calculation engine.
//!
//! Formulas are written the way a spreadsheet user writes them, with the
//! culture's decimal and list separators, and produce the same values and
//! in-cell errors (`#DIV/0!`, `#VALUE!`, ...) a spreadsheet would.
//!
//! ## Features
//!
//! - Arithmetic, comparison, concatenation and reference operators
//! - Logical, math, text, information, date and lookup functions
//! - An in-memory [`Workbook`] with multiple sheets and defined names
//! - Circular reference and runaway nesting detection
//!
//! ## Example
//!
//! ```rust
//! use cellcalc::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 42.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1*2").unwrap();
//!
//! assert_eq!(workbook.cell_value(0, "B1").unwrap(), Value::Number(84.0));
//! assert_eq!(
//!     evaluate_expr("=1/0").unwrap(),
//!     Value::Error(ErrorKind::DivisionByZero)
//! );
//! ```

pub mod error;
pub mod prelude;
pub mod workbook;

pub use error::{Error, Result};
pub use workbook::{CellContent, NameScope, Workbook, Worksheet};

// Re-export core types
pub use cellcalc_core::{CellAddress, Culture, DateSystem, ErrorKind, Value, ValueType};

// Re-export formula types
pub use cellcalc_formula::{
    evaluate, evaluate_formula, parse_formula, parse_formula_with, CalcResult, EvaluationContext,
    EvaluationOptions, Expr, FormulaError, FormulaResult, FunctionDef, FunctionRegistry,
};

/// Evaluate a formula that refers to no cells, e.g. `=CHAR(65)`
///
/// References read as blank cells on a single sheet.
pub fn evaluate_expr(formula: &str) -> FormulaResult<Value> {
    evaluate_formula(formula, &EvaluationContext::simple()).map(formula_result)
}

/// A formula whose result is an empty cell shows as zero
pub(crate) fn formula_result(value: Value) -> Value {
    match value {
        Value::Blank => Value::Number(0.0),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_evaluate_expr() {
        assert_eq!(evaluate_expr("=1+2").unwrap(), Value::Number(3.0));
        assert_eq!(evaluate_expr("=A1").unwrap(), Value::Number(0.0));
        assert_eq!(
            evaluate_expr("=CHAR(270)").unwrap(),
            Value::Error(ErrorKind::CellValue)
        );
        assert!(matches!(
            evaluate_expr("=XXX(1)"),
            Err(FormulaError::NameNotRecognized(_))
        ));
    }

    #[test]
    fn test_error_display_is_transparent() {
        let err = Error::from(FormulaError::NameNotRecognized("XXX".into()));
        assert_eq!(err.to_string(), "The identifier 'XXX' was not recognised.");
    }
}
