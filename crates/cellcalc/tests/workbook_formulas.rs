//! Tests for formula evaluation against workbook cells

use cellcalc::prelude::*;
use cellcalc::{CalcResult, EvaluationContext, FunctionDef};
use pretty_assertions::assert_eq;

fn sales_workbook() -> Workbook {
    let mut wb = Workbook::new();
    let data = wb.add_worksheet("Data").unwrap();
    wb.add_worksheet("My Data").unwrap();

    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 10.0).unwrap();
    sheet.set_cell_value("A2", 20.0).unwrap();
    sheet.set_cell_value("A3", 30.0).unwrap();
    sheet.set_cell_value("A4", "n/a").unwrap();
    sheet.set_cell_value("B1", 5.0).unwrap();

    let sheet = wb.worksheet_mut(data).unwrap();
    sheet.set_cell_value("A1", "apple").unwrap();
    sheet.set_cell_value("A2", "banana").unwrap();
    sheet.set_cell_value("A3", "cherry").unwrap();
    sheet.set_cell_value("B1", 1.25).unwrap();
    sheet.set_cell_value("B2", 0.5).unwrap();
    sheet.set_cell_value("B3", 3.0).unwrap();

    wb.set_value(2, "B1", 7.0).unwrap();
    wb
}

#[test]
fn test_cell_references() {
    let mut wb = sales_workbook();
    wb.set_formula(0, "C1", "=A1+B1").unwrap();
    wb.set_formula(0, "C2", "=C1*2").unwrap();
    wb.set_formula(0, "C3", "=SUM(A1:A4)").unwrap();
    wb.set_formula(0, "C4", "=AVERAGE(A1:A3)").unwrap();
    wb.set_formula(0, "C5", "=Z99+1").unwrap();

    assert_eq!(wb.cell_value(0, "C1").unwrap(), Value::Number(15.0));
    assert_eq!(wb.cell_value(0, "C2").unwrap(), Value::Number(30.0));
    assert_eq!(wb.cell_value(0, "C3").unwrap(), Value::Number(60.0));
    assert_eq!(wb.cell_value(0, "C4").unwrap(), Value::Number(20.0));
    assert_eq!(wb.cell_value(0, "C5").unwrap(), Value::Number(1.0));
    assert_eq!(wb.cell_value(0, "Z99").unwrap(), Value::Blank);
}

#[test]
fn test_formula_referring_to_empty_cell_shows_zero() {
    let mut wb = Workbook::new();
    wb.set_formula(0, "A1", "=B1").unwrap();
    assert_eq!(wb.cell_value(0, "A1").unwrap(), Value::Number(0.0));
}

#[test]
fn test_text_cells_in_arithmetic() {
    let mut wb = sales_workbook();
    wb.set_formula(0, "C1", "=A4+1").unwrap();
    wb.set_formula(0, "C2", "=A4&\"!\"").unwrap();
    assert_eq!(
        wb.cell_value(0, "C1").unwrap(),
        Value::Error(ErrorKind::CellValue)
    );
    assert_eq!(wb.cell_value(0, "C2").unwrap(), Value::from("n/a!"));
}

#[test]
fn test_cross_sheet_references() {
    let mut wb = sales_workbook();
    wb.set_formula(0, "D1", "=SUM(Data!B1:B3)").unwrap();
    wb.set_formula(0, "D2", "='My Data'!B1*2").unwrap();
    wb.set_formula(0, "D3", "=data!A2").unwrap();
    wb.set_formula(0, "D4", "=Missing!A1").unwrap();

    assert_eq!(wb.cell_value(0, "D1").unwrap(), Value::Number(4.75));
    assert_eq!(wb.cell_value(0, "D2").unwrap(), Value::Number(14.0));
    assert_eq!(wb.cell_value(0, "D3").unwrap(), Value::from("banana"));
    assert_eq!(
        wb.cell_value(0, "D4").unwrap(),
        Value::Error(ErrorKind::CellReference)
    );
}

#[test]
fn test_implicit_intersection_in_cells() {
    let mut wb = sales_workbook();
    wb.set_formula(0, "B2", "=A1:A3*2").unwrap();
    wb.set_formula(0, "B9", "=A1:A3*2").unwrap();

    assert_eq!(wb.cell_value(0, "B2").unwrap(), Value::Number(40.0));
    assert_eq!(
        wb.cell_value(0, "B9").unwrap(),
        Value::Error(ErrorKind::CellValue)
    );
}

#[test]
fn test_lookups_over_cells() {
    let mut wb = sales_workbook();
    wb.set_formula(0, "E1", "=VLOOKUP(\"banana\",Data!A1:B3,2,FALSE)")
        .unwrap();
    wb.set_formula(0, "E2", "=MATCH(\"cherry\",Data!A1:A3,0)").unwrap();
    wb.set_formula(0, "E3", "=INDEX(Data!A1:B3,E2,2)").unwrap();
    wb.set_formula(0, "E4", "=ROWS(Data!A1:B3)*COLUMNS(Data!A1:B3)")
        .unwrap();

    assert_eq!(wb.cell_value(0, "E1").unwrap(), Value::Number(0.5));
    assert_eq!(wb.cell_value(0, "E2").unwrap(), Value::Number(3.0));
    assert_eq!(wb.cell_value(0, "E3").unwrap(), Value::Number(3.0));
    assert_eq!(wb.cell_value(0, "E4").unwrap(), Value::Number(6.0));
}

#[test]
fn test_defined_names() {
    let mut wb = sales_workbook();
    wb.define_name("Rate", "0.25", NameScope::Workbook).unwrap();
    wb.define_name("Rate", "0.5", NameScope::Sheet(1)).unwrap();
    wb.define_name("Prices", "Data!$B$1:$B$3", NameScope::Workbook)
        .unwrap();
    wb.define_name("Total", "=SUM(Prices)*Rate", NameScope::Workbook)
        .unwrap();

    assert_eq!(wb.evaluate(0, "=Rate*100").unwrap(), Value::Number(25.0));
    assert_eq!(wb.evaluate(1, "=rate*100").unwrap(), Value::Number(50.0));
    assert_eq!(wb.evaluate(0, "=SUM(Prices)").unwrap(), Value::Number(4.75));
    assert_eq!(wb.evaluate(1, "=Total").unwrap(), Value::Number(2.375));

    assert!(wb.remove_name("rate", NameScope::Sheet(1)));
    assert_eq!(wb.evaluate(1, "=Rate*100").unwrap(), Value::Number(25.0));
}

#[test]
fn test_invalid_defined_names() {
    let mut wb = Workbook::new();
    for name in ["", "A1", "TRUE", "2x", "has space"] {
        assert!(
            matches!(
                wb.define_name(name, "1", NameScope::Workbook),
                Err(Error::Core(_))
            ),
            "{}",
            name
        );
    }
    assert!(wb.define_name("Ok", "1", NameScope::Sheet(5)).is_err());
    assert!(matches!(
        wb.define_name("Broken", "=1+", NameScope::Workbook),
        Err(Error::Formula(FormulaError::Syntax { .. }))
    ));
}

#[test]
fn test_culture_separators() {
    let mut wb = Workbook::with_culture(Culture::with_separators(',', ';'));
    wb.set_value(0, "A1", 1.5).unwrap();
    wb.set_formula(0, "B1", "=SUM(A1;2,5)").unwrap();
    wb.set_formula(0, "B2", "=A1&\"\"").unwrap();

    assert_eq!(wb.cell_value(0, "B1").unwrap(), Value::Number(4.0));
    assert_eq!(wb.cell_value(0, "B2").unwrap(), Value::from("1,5"));
    assert_eq!(wb.formula_text(0, "B1").unwrap().as_deref(), Some("=SUM(A1,2.5)"));

    // A comma is only a decimal mark under this culture
    assert!(matches!(
        wb.set_formula(0, "B3", "=SUM(A1,B1)"),
        Err(Error::Formula(FormulaError::Syntax { .. }))
    ));
}

#[test]
fn test_copy_cell_shifts_relative_references() {
    let mut wb = sales_workbook();
    wb.set_formula(0, "C1", "=A1*$B$1").unwrap();
    wb.copy_cell(0, "C1", "C3").unwrap();

    assert_eq!(
        wb.formula_text(0, "C3").unwrap().as_deref(),
        Some("=A3*$B$1")
    );
    assert_eq!(wb.cell_value(0, "C3").unwrap(), Value::Number(150.0));
    assert_eq!(wb.formula_text(0, "A1").unwrap(), None);
}

#[test]
fn test_volatile_cells() {
    let mut wb = Workbook::new();
    wb.set_formula(0, "A1", "=RAND()").unwrap();
    wb.set_formula(0, "A2", "=1+ROUND(NOW(),0)").unwrap();
    wb.set_formula(0, "A3", "=SUM(1,2)").unwrap();

    assert!(wb.is_volatile(0, "A1").unwrap());
    assert!(wb.is_volatile(0, "A2").unwrap());
    assert!(!wb.is_volatile(0, "A3").unwrap());

    match wb.cell_value(0, "A1").unwrap() {
        Value::Number(n) => assert!((0.0..1.0).contains(&n)),
        other => panic!("Expected a number, got {:?}", other),
    }
}

fn fn_double(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(n * 2.0)),
        _ => Err(ErrorKind::CellValue),
    }
}

#[test]
fn test_custom_functions() {
    let mut wb = sales_workbook();
    wb.registry_mut()
        .register(FunctionDef::eager("DOUBLE", 1, Some(1), fn_double));
    wb.set_formula(0, "C1", "=double(A2)+1").unwrap();

    assert_eq!(wb.cell_value(0, "C1").unwrap(), Value::Number(41.0));
    assert_eq!(
        wb.evaluate(0, "=DOUBLE(\"x\")").unwrap(),
        Value::Error(ErrorKind::CellValue)
    );

    // Other workbooks keep the built-in set
    assert!(matches!(
        Workbook::new().evaluate(0, "=DOUBLE(1)"),
        Err(Error::Formula(FormulaError::NameNotRecognized(_)))
    ));
}

#[test]
fn test_dates_in_cells() {
    let mut wb = Workbook::new();
    wb.set_formula(0, "A1", "=DATE(2024,2,29)").unwrap();
    wb.set_formula(0, "A2", "=YEAR(A1)*10000+MONTH(A1)*100+DAY(A1)")
        .unwrap();
    wb.set_formula(0, "A3", "=A1+1").unwrap();

    assert_eq!(wb.cell_value(0, "A1").unwrap(), Value::Number(45351.0));
    assert_eq!(wb.cell_value(0, "A2").unwrap(), Value::Number(20240229.0));
    assert_eq!(wb.evaluate(0, "=MONTH(A3)").unwrap(), Value::Number(3.0));
}

#[test]
fn test_evaluate_at_origin() {
    let wb = sales_workbook();
    assert_eq!(
        wb.evaluate_at(0, "C3", "=A1:A3+1").unwrap(),
        Value::Number(31.0)
    );
    assert!(matches!(
        wb.evaluate(9, "=1"),
        Err(Error::Core(_))
    ));
}
