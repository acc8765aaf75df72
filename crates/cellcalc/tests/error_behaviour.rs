//! Tests for how calculation errors and unusable formulas surface

use cellcalc::prelude::*;
use pretty_assertions::assert_eq;

const UNKNOWN_XXX: &str = "The identifier 'XXX' was not recognised.";

#[test]
fn test_char_out_of_range() {
    assert_eq!(
        evaluate_expr("CHAR(-2)").unwrap(),
        Value::Error(ErrorKind::CellValue)
    );
    assert_eq!(
        evaluate_expr("CHAR(270)").unwrap(),
        Value::Error(ErrorKind::CellValue)
    );
}

#[test]
fn test_division_by_zero_free_and_in_cell() {
    assert_eq!(
        evaluate_expr("0/0").unwrap(),
        Value::Error(ErrorKind::DivisionByZero)
    );

    let mut wb = Workbook::new();
    wb.set_formula(0, "A1", "=0/0").unwrap();
    assert_eq!(
        wb.cell_value(0, "A1").unwrap(),
        Value::Error(ErrorKind::DivisionByZero)
    );
    assert_eq!(
        wb.evaluate(0, "0/0").unwrap(),
        Value::Error(ErrorKind::DivisionByZero)
    );
}

#[test]
fn test_unknown_function_free_expression() {
    let err = evaluate_expr("XXX(A1:A2)").unwrap_err();
    assert_eq!(err, FormulaError::NameNotRecognized("XXX".into()));
    assert_eq!(err.to_string(), UNKNOWN_XXX);
}

#[test]
fn test_unknown_function_in_cell() {
    let mut wb = Workbook::new();
    wb.set_formula(0, "B1", "=XXX(A1:A2)").unwrap();

    let err = wb.cell_value(0, "B1").unwrap_err();
    assert!(matches!(
        err,
        Error::Formula(FormulaError::NameNotRecognized(_))
    ));
    assert_eq!(err.to_string(), UNKNOWN_XXX);

    let err = wb.evaluate(0, "=XXX(A1:A2)").unwrap_err();
    assert_eq!(err.to_string(), UNKNOWN_XXX);
}

#[test]
fn test_nested_unknown_name_is_trapped() {
    let mut wb = Workbook::new();
    wb.set_formula(0, "A1", "XXX").unwrap();
    wb.set_formula(0, "A2", "=IFERROR(A1, \"Success\")").unwrap();

    assert_eq!(wb.cell_value(0, "A2").unwrap(), Value::from("Success"));

    // Read directly the cell still cannot be evaluated
    assert!(matches!(
        wb.cell_value(0, "A1"),
        Err(Error::Formula(FormulaError::NameNotRecognized(_)))
    ));
}

#[test]
fn test_nested_unknown_name_reads_as_name_error() {
    let mut wb = Workbook::new();
    wb.set_formula(0, "A1", "=XXX(1)").unwrap();
    wb.set_formula(0, "A2", "=A1+1").unwrap();
    wb.set_formula(0, "A3", "=ISERROR(A1)").unwrap();
    wb.set_formula(0, "A4", "=IFERROR(XXX(1),\"trapped\")").unwrap();

    assert_eq!(
        wb.cell_value(0, "A2").unwrap(),
        Value::Error(ErrorKind::NameNotRecognized)
    );
    assert_eq!(wb.cell_value(0, "A3").unwrap(), Value::Logical(true));
    assert_eq!(wb.cell_value(0, "A4").unwrap(), Value::from("trapped"));
}

#[test]
fn test_wrong_argument_count_is_value_error() {
    for formula in ["=CHAR()", "=CHAR(1,2)", "=IF()", "=NOT(TRUE,FALSE)", "=PI(1)", "=IFERROR(1)"] {
        assert_eq!(
            evaluate_expr(formula).unwrap(),
            Value::Error(ErrorKind::CellValue),
            "{}",
            formula
        );
    }
}

#[test]
fn test_every_builtin_rejects_too_many_arguments() {
    let registry = FunctionRegistry::builtin();
    for name in registry.names() {
        let def = registry.get(name).unwrap();
        let Some(max) = def.max_args else { continue };
        let args = vec!["1"; max + 1].join(",");
        let formula = format!("={}({})", name, args);
        assert_eq!(
            evaluate_expr(&formula).unwrap(),
            Value::Error(ErrorKind::CellValue),
            "{}",
            formula
        );
    }
}

#[test]
fn test_errors_propagate_unchanged() {
    let errors = [
        "#NULL!", "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#N/A",
    ];
    for error in errors {
        for template in ["={}+1", "=2*{}", "=-{}", "={}%", "=\"a\"&{}", "={}^2", "=1={}"] {
            let formula = template.replace("{}", error);
            assert_eq!(
                evaluate_expr(&formula).unwrap().to_string(),
                error,
                "{}",
                formula
            );
        }
    }
}

#[test]
fn test_syntax_errors_are_not_values() {
    assert!(matches!(
        evaluate_expr("=1+"),
        Err(FormulaError::Syntax { .. })
    ));
    assert!(matches!(
        evaluate_expr("=SUM(1,2"),
        Err(FormulaError::Syntax { .. })
    ));

    let mut wb = Workbook::new();
    assert!(matches!(
        wb.set_formula(0, "A1", "=(1"),
        Err(Error::Formula(FormulaError::Syntax { .. }))
    ));
}

#[test]
fn test_circular_reference() {
    let mut wb = Workbook::new();
    wb.set_formula(0, "A1", "=B1+1").unwrap();
    wb.set_formula(0, "B1", "=A1*2").unwrap();
    wb.set_formula(0, "C1", "=C1").unwrap();

    assert_eq!(
        wb.cell_value(0, "A1").unwrap_err(),
        Error::Formula(FormulaError::CircularReference("Sheet1!A1".into()))
    );
    assert_eq!(
        wb.cell_value(0, "C1").unwrap_err(),
        Error::Formula(FormulaError::CircularReference("Sheet1!C1".into()))
    );

    // Not trappable: the cycle has no value at all
    wb.set_formula(0, "D1", "=IFERROR(C1,0)").unwrap();
    assert!(matches!(
        wb.cell_value(0, "D1"),
        Err(Error::Formula(FormulaError::CircularReference(_)))
    ));
}

#[test]
fn test_long_cell_chain_hits_depth_ceiling() {
    let mut wb = Workbook::new();
    wb.set_max_depth(12);
    wb.set_value(0, "A1", 1.0).unwrap();
    for row in 2..=12 {
        wb.set_formula(0, &format!("A{}", row), &format!("=A{}+1", row - 1))
            .unwrap();
    }

    // Each cell costs one level for the hop and one for the `+`
    assert_eq!(wb.cell_value(0, "A6").unwrap(), Value::Number(6.0));
    assert_eq!(wb.cell_value(0, "A7").unwrap(), Value::Number(7.0));
    assert_eq!(
        wb.cell_value(0, "A8").unwrap_err(),
        Error::Formula(FormulaError::NestingTooDeep { limit: 12 })
    );
    assert_eq!(
        wb.cell_value(0, "A12").unwrap_err(),
        Error::Formula(FormulaError::NestingTooDeep { limit: 12 })
    );
}

#[test]
fn test_cell_chain_and_formula_nesting_share_one_budget() {
    let mut wb = Workbook::new();
    wb.set_value(0, "A1", 1.0).unwrap();
    for row in 2..=250 {
        wb.set_formula(
            0,
            &format!("A{}", row),
            &format!("=IF(TRUE,ABS(A{}+1),0)", row - 1),
        )
        .unwrap();
    }

    assert_eq!(wb.cell_value(0, "A20").unwrap(), Value::Number(20.0));
    assert_eq!(
        wb.cell_value(0, "A250").unwrap_err(),
        Error::Formula(FormulaError::NestingTooDeep { limit: 256 })
    );
    // A failed read leaves nothing behind for the next one
    assert_eq!(wb.cell_value(0, "A30").unwrap(), Value::Number(30.0));
}

#[test]
fn test_plain_cell_chain_within_default_budget() {
    let mut wb = Workbook::new();
    wb.set_value(0, "A1", 1.0).unwrap();
    for row in 2..=200 {
        wb.set_formula(0, &format!("A{}", row), &format!("=A{}+1", row - 1))
            .unwrap();
    }

    assert_eq!(wb.cell_value(0, "A120").unwrap(), Value::Number(120.0));
    assert_eq!(
        wb.cell_value(0, "A200").unwrap_err(),
        Error::Formula(FormulaError::NestingTooDeep { limit: 256 })
    );
}

#[test]
fn test_formula_at_length_limit() {
    // About 8000 characters, under the 8192 a cell can hold
    let chain = format!("=1{}", "+1".repeat(4_000));
    assert_eq!(
        evaluate_expr(&chain),
        Err(FormulaError::NestingTooDeep { limit: 256 })
    );

    let mut wb = Workbook::new();
    assert_eq!(
        wb.set_formula(0, "A1", &chain).unwrap_err(),
        Error::Formula(FormulaError::NestingTooDeep { limit: 256 })
    );

    let chain = format!("=1{}", "+1".repeat(99));
    assert_eq!(evaluate_expr(&chain).unwrap(), Value::Number(100.0));
}

#[test]
fn test_oversized_ranges() {
    let mut wb = Workbook::new();
    wb.set_value(0, "A1", 10.0).unwrap();
    wb.set_value(0, "A1048576", 5.0).unwrap();
    wb.set_formula(0, "B1", "=SUM(A1:A1048576)").unwrap();
    wb.set_formula(0, "B2", "=SUM(A1:XFD1048576)").unwrap();
    wb.set_formula(0, "B3", "=ROWS(A1:A1048576)").unwrap();

    assert_eq!(wb.cell_value(0, "B1").unwrap(), Value::Number(15.0));
    assert_eq!(
        wb.cell_value(0, "B2").unwrap(),
        Value::Error(ErrorKind::NumberInvalid)
    );
    assert_eq!(wb.cell_value(0, "B3").unwrap(), Value::Number(1_048_576.0));

    wb.set_max_range_cells(1_000);
    assert_eq!(
        wb.cell_value(0, "B1").unwrap(),
        Value::Error(ErrorKind::NumberInvalid)
    );
}
