//! Lookup and reference functions

use crate::ast::Expr;
use crate::coerce::{compare, scalar, to_bool, to_number, CalcResult};
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::evaluator::Evaluator;
use cellcalc_core::{ErrorKind, Value};
use std::cmp::Ordering;

/// View any value as a grid; a scalar is a 1x1 grid
///
/// Rows of differing lengths are `#VALUE!`.
fn grid(value: &Value) -> CalcResult<Vec<Vec<&Value>>> {
    match value {
        Value::Array(rows) => {
            let width = rows.first().map_or(0, |row| row.len());
            if rows.iter().any(|row| row.len() != width) {
                return Err(ErrorKind::CellValue);
            }
            Ok(rows.iter().map(|row| row.iter().collect()).collect())
        }
        other => Ok(vec![vec![other]]),
    }
}

fn dims(grid: &[Vec<&Value>]) -> (usize, usize) {
    (grid.len(), grid.first().map_or(0, |row| row.len()))
}

/// A 1-based position argument; 0 is allowed, negatives are `#VALUE!`
fn position(value: &Value, ctx: &EvaluationContext) -> CalcResult<usize> {
    let n = to_number(value, ctx.culture())?.trunc();
    if n < 0.0 {
        return Err(ErrorKind::CellValue);
    }
    Ok(n.min(usize::MAX as f64) as usize)
}

/// Values of the same kind can be ordered against each other by a lookup
fn same_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Number(_), Value::Number(_))
            | (Value::Text(_), Value::Text(_))
            | (Value::Logical(_), Value::Logical(_))
    )
}

fn exact_position(values: &[&Value], lookup: &Value) -> Option<usize> {
    values
        .iter()
        .position(|v| same_kind(v, lookup) && compare(v, lookup) == Ordering::Equal)
}

/// Position of the last value not past `lookup` in a sorted vector
///
/// Ascending order finds the largest value <= lookup; descending order finds
/// the smallest value >= lookup. Values of another kind are skipped.
fn sorted_position(values: &[&Value], lookup: &Value, descending: bool) -> Option<usize> {
    let past = if descending {
        Ordering::Less
    } else {
        Ordering::Greater
    };

    let mut found = None;
    for (index, value) in values.iter().enumerate() {
        if !same_kind(value, lookup) {
            continue;
        }
        if compare(value, lookup) == past {
            break;
        }
        found = Some(index);
    }
    found
}

/// INDEX(array, row_num, [column_num])
///
/// A zero row or column selects the whole column or row.
pub fn fn_index(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let table = grid(&args[0])?;
    let (rows, cols) = dims(&table);

    let (row, col) = match args.get(2) {
        Some(col) => (position(&args[1], ctx)?, position(col, ctx)?),
        // A single row is indexed by column
        None if rows == 1 => (1, position(&args[1], ctx)?),
        None => (position(&args[1], ctx)?, 1),
    };
    if row > rows || col > cols {
        return Err(ErrorKind::CellReference);
    }

    let pick = |r: usize, c: usize| table[r][c].clone();
    match (row, col) {
        (0, 0) => Ok(args[0].clone()),
        (0, c) => Ok(Value::Array((0..rows).map(|r| vec![pick(r, c - 1)]).collect())),
        (r, 0) => Ok(Value::Array(vec![(0..cols).map(|c| pick(r - 1, c)).collect()])),
        (r, c) => Ok(pick(r - 1, c - 1)),
    }
}

/// MATCH(lookup_value, lookup_array, [match_type])
///
/// match_type 1 (default) expects ascending order, -1 descending, 0 exact.
pub fn fn_match(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let lookup = &args[0];
    let table = grid(&args[1])?;
    let match_type = match args.get(2) {
        Some(v) => to_number(v, ctx.culture())?.trunc(),
        None => 1.0,
    };

    let values: Vec<&Value> = match dims(&table) {
        (1, _) => table[0].clone(),
        (_, 1) => table.iter().map(|row| row[0]).collect(),
        _ => return Err(ErrorKind::NoValueAvailable),
    };

    let found = if match_type == 0.0 {
        exact_position(&values, lookup)
    } else {
        sorted_position(&values, lookup, match_type < 0.0)
    };
    found
        .map(|index| Value::Number((index + 1) as f64))
        .ok_or(ErrorKind::NoValueAvailable)
}

/// VLOOKUP(lookup_value, table_array, col_index_num, [range_lookup])
pub fn fn_vlookup(args: &[Value], ctx: &EvaluationContext) -> CalcResult {
    let lookup = &args[0];
    let table = grid(&args[1])?;
    let col = position(&args[2], ctx)?;
    let approximate = match args.get(3) {
        Some(v) => to_bool(v)?,
        None => true,
    };

    if col < 1 {
        return Err(ErrorKind::CellValue);
    }
    if col > dims(&table).1 {
        return Err(ErrorKind::CellReference);
    }

    let first_column: Vec<&Value> = table.iter().map(|row| row[0]).collect();
    let found = if approximate {
        sorted_position(&first_column, lookup, false)
    } else {
        exact_position(&first_column, lookup)
    };

    match found {
        Some(row) => Ok(table[row][col - 1].clone()),
        None => Err(ErrorKind::NoValueAvailable),
    }
}

/// ROWS(array)
pub fn fn_rows(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Number(dims(&grid(&args[0])?).0 as f64))
}

/// COLUMNS(array)
pub fn fn_columns(args: &[Value], _ctx: &EvaluationContext) -> CalcResult {
    Ok(Value::Number(dims(&grid(&args[0])?).1 as f64))
}

/// CHOOSE(index_num, value1, ...) - only the chosen value is evaluated
pub fn fn_choose(args: &[Expr], ev: &Evaluator) -> FormulaResult<Value> {
    let index = scalar(ev.evaluate(&args[0])?);
    let index = match to_number(&index, ev.context().culture()) {
        Ok(n) => n.trunc(),
        Err(e) => return Ok(Value::Error(e)),
    };

    if index < 1.0 || index >= args.len() as f64 {
        return Ok(Value::Error(ErrorKind::CellValue));
    }
    ev.evaluate(&args[index as usize])
}
