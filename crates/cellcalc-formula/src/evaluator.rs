//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. Calculation errors come back as
//! `Value::Error`; only authoring failures (unresolved names, runaway nesting)
//! come back as `Err`.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::coerce::{compare, scalar, to_number, CalcResult};
use crate::context::{EvaluationContext, NameDefinition};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{math, ArgMode, FunctionImpl};
use crate::parser::parse_formula_with;
use crate::reference::{Area, ReferenceResolver};
use cellcalc_core::{ErrorKind, Value};
use log::{debug, trace};
use std::cell::Cell;
use std::cmp::Ordering;

/// Parse and evaluate formula text in the given context
///
/// # Example
/// ```rust
/// use cellcalc_core::{ErrorKind, Value};
/// use cellcalc_formula::{evaluate_formula, EvaluationContext};
///
/// let ctx = EvaluationContext::simple();
/// assert_eq!(evaluate_formula("=1+2", &ctx).unwrap(), Value::Number(3.0));
/// assert_eq!(
///     evaluate_formula("=0/0", &ctx).unwrap(),
///     Value::Error(ErrorKind::DivisionByZero)
/// );
/// ```
pub fn evaluate_formula(text: &str, ctx: &EvaluationContext) -> FormulaResult<Value> {
    let ast = parse_formula_with(text, ctx.culture())?;
    evaluate(&ast, ctx)
}

/// Evaluate a formula expression
pub fn evaluate(expr: &Expr, ctx: &EvaluationContext) -> FormulaResult<Value> {
    trace!("evaluating {} at {:?}", expr, ctx.origin);
    Evaluator::new(ctx).evaluate(expr)
}

/// An operand that may still be a reference
enum Operand {
    Areas(Vec<Area>),
    Value(Value),
}

impl Operand {
    fn into_areas(self) -> Result<Vec<Area>, ErrorKind> {
        match self {
            Operand::Areas(areas) => Ok(areas),
            Operand::Value(Value::Error(e)) => Err(e),
            Operand::Value(_) => Err(ErrorKind::CellValue),
        }
    }

    fn into_area(self) -> Result<Area, ErrorKind> {
        match self.into_areas()?.as_slice() {
            [area] => Ok(*area),
            _ => Err(ErrorKind::CellValue),
        }
    }
}

/// Walks an AST against one evaluation context
///
/// Lazy functions receive the evaluator so they can evaluate their own
/// argument subtrees. Every operator, function call and name expansion is
/// one level of nesting.
pub struct Evaluator<'a> {
    ctx: &'a EvaluationContext<'a>,
    own_depth: Cell<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: &'a EvaluationContext<'a>) -> Self {
        Self {
            ctx,
            own_depth: Cell::new(0),
        }
    }

    pub fn context(&self) -> &EvaluationContext<'a> {
        self.ctx
    }

    fn depth(&self) -> &Cell<usize> {
        self.ctx.depth.unwrap_or(&self.own_depth)
    }

    fn nested<T>(&self, f: impl FnOnce() -> FormulaResult<T>) -> FormulaResult<T> {
        let limit = self.ctx.options.max_depth;
        let counter = self.depth();
        let depth = counter.get();
        if depth >= limit {
            return Err(FormulaError::NestingTooDeep { limit });
        }
        counter.set(depth + 1);
        let result = f();
        counter.set(depth);
        result
    }

    /// Evaluate to a single value
    ///
    /// References collapse to one cell by implicit intersection with the
    /// formula's origin. Array constants stay arrays.
    pub fn evaluate(&self, expr: &Expr) -> FormulaResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::UnaryOp { op, operand } => self.nested(|| self.evaluate_unary(*op, operand)),
            Expr::BinaryOp { op, left, right } if !op.is_reference_operator() => {
                self.nested(|| self.evaluate_binary(*op, left, right))
            }
            Expr::FunctionCall { name, args } => self.call_function(name, args),
            Expr::Array(rows) => {
                let mut result_rows = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut result_row = Vec::with_capacity(row.len());
                    for expr in row {
                        result_row.push(scalar(self.evaluate(expr)?));
                    }
                    result_rows.push(result_row);
                }
                Ok(Value::Array(result_rows))
            }
            _ => {
                let operand = self.evaluate_operand(expr)?;
                self.collapse(operand)
            }
        }
    }

    /// Evaluate keeping ranges whole, as a `Value::Array` grid
    ///
    /// Several areas load as one row, in area order. Non-reference
    /// expressions evaluate as in [`Evaluator::evaluate`].
    pub fn evaluate_range(&self, expr: &Expr) -> FormulaResult<Value> {
        match self.evaluate_operand(expr)? {
            Operand::Value(value) => Ok(value),
            Operand::Areas(areas) => self.load(&areas),
        }
    }

    /// Evaluate a table argument, which must be one block of cells or an array
    ///
    /// A multi-area reference has no row and column layout and is `#REF!`.
    pub fn evaluate_table(&self, expr: &Expr) -> FormulaResult<Value> {
        match self.evaluate_operand(expr)? {
            Operand::Value(value) => Ok(value),
            Operand::Areas(areas) if areas.len() > 1 => {
                debug!("{} areas given where a table was expected", areas.len());
                Ok(Value::Error(ErrorKind::CellReference))
            }
            Operand::Areas(areas) => self.load(&areas),
        }
    }

    fn load(&self, areas: &[Area]) -> FormulaResult<Value> {
        let size: u64 = areas
            .iter()
            .map(|area| u64::from(area.rows()) * u64::from(area.cols()))
            .sum();
        let limit = self.ctx.options.max_range_cells;
        if size > limit {
            debug!("range of {} cells is over the {} cell limit", size, limit);
            return Ok(Value::Error(ErrorKind::NumberInvalid));
        }

        match areas {
            [area] => Ok(Value::Array(self.area_rows(area)?)),
            _ => {
                let mut row = Vec::with_capacity(size as usize);
                for area in areas {
                    for values in self.area_rows(area)? {
                        row.extend(values);
                    }
                }
                Ok(Value::Array(vec![row]))
            }
        }
    }

    fn area_rows(&self, area: &Area) -> FormulaResult<Vec<Vec<Value>>> {
        let cells = self.ctx.cells;
        let mut rows = Vec::with_capacity(area.rows() as usize);
        for row in area.top..=area.bottom {
            let mut values = Vec::with_capacity(area.cols() as usize);
            for col in area.left..=area.right {
                values.push(cells.cell_value(area.sheet, row, col)?);
            }
            rows.push(values);
        }
        Ok(rows)
    }

    /// Evaluate, turning an unresolved name into a `#NAME?` value
    ///
    /// Error-aware functions evaluate their guarded arguments this way.
    pub fn evaluate_trapping(&self, expr: &Expr) -> FormulaResult<Value> {
        trap(self.evaluate(expr))
    }

    fn evaluate_operand(&self, expr: &Expr) -> FormulaResult<Operand> {
        let resolver = ReferenceResolver::new(self.ctx.cells);
        let origin = self.ctx.origin;

        let operand = match expr {
            Expr::Reference(addr) => match resolver.resolve_cell(addr, origin) {
                Ok(cell) => Operand::Areas(vec![Area::single(cell)]),
                Err(e) => Operand::Value(Value::Error(e)),
            },
            Expr::RangeReference(start, end) => match resolver.resolve_range(start, end, origin) {
                Ok(area) => Operand::Areas(vec![area]),
                Err(e) => Operand::Value(Value::Error(e)),
            },
            Expr::NameRef(name) => return self.resolve_name(name),
            Expr::BinaryOp { op, left, right } if op.is_reference_operator() => {
                let combined = self.nested(|| {
                    let left = self.evaluate_operand(left)?;
                    let right = self.evaluate_operand(right)?;
                    Ok(combine_areas(*op, left, right))
                })?;
                match combined {
                    Ok(areas) => Operand::Areas(areas),
                    Err(e) => Operand::Value(Value::Error(e)),
                }
            }
            _ => Operand::Value(self.evaluate(expr)?),
        };
        Ok(operand)
    }

    fn resolve_name(&self, name: &str) -> FormulaResult<Operand> {
        match self.ctx.names.resolve_name(name, self.ctx.origin.sheet) {
            Some(NameDefinition::Area(area)) => Ok(Operand::Areas(vec![area])),
            Some(NameDefinition::Expr(expr)) => self.nested(|| self.evaluate_operand(&expr)),
            // A function name used without parentheses
            None if self.ctx.registry.contains(name) => {
                Ok(Operand::Value(Value::Error(ErrorKind::NameNotRecognized)))
            }
            None => {
                debug!("identifier '{}' was not recognised", name);
                Err(FormulaError::NameNotRecognized(name.to_string()))
            }
        }
    }

    fn collapse(&self, operand: Operand) -> FormulaResult<Value> {
        let areas = match operand {
            Operand::Value(value) => return Ok(value),
            Operand::Areas(areas) => areas,
        };

        let cell = match areas.as_slice() {
            [area] => area.collapse(self.ctx.origin),
            _ => None,
        };
        match cell {
            Some(cell) => self.ctx.cells.cell_value(cell.sheet, cell.row, cell.col),
            None => Ok(Value::Error(ErrorKind::CellValue)),
        }
    }

    fn evaluate_unary(&self, op: UnaryOperator, operand: &Expr) -> FormulaResult<Value> {
        let value = scalar(self.evaluate(operand)?);

        let result = to_number(&value, self.ctx.culture()).map(|n| match op {
            UnaryOperator::Negate => -n,
            UnaryOperator::Percent => n / 100.0,
        });
        Ok(result.map_or_else(Value::Error, Value::Number))
    }

    fn evaluate_binary(
        &self,
        op: BinaryOperator,
        left: &Expr,
        right: &Expr,
    ) -> FormulaResult<Value> {
        // Evaluate operands first
        let left = scalar(self.evaluate(left)?);
        let right = scalar(self.evaluate(right)?);

        // Propagate errors
        if let Value::Error(e) = left {
            return Ok(Value::Error(e));
        }
        if let Value::Error(e) = right {
            return Ok(Value::Error(e));
        }

        let culture = self.ctx.culture();
        let result = match op {
            BinaryOperator::Equal => Ok(Value::Logical(compare(&left, &right).is_eq())),
            BinaryOperator::NotEqual => Ok(Value::Logical(compare(&left, &right).is_ne())),
            BinaryOperator::LessThan => Ok(Value::Logical(compare(&left, &right).is_lt())),
            BinaryOperator::LessEqual => Ok(Value::Logical(compare(&left, &right).is_le())),
            BinaryOperator::GreaterThan => Ok(Value::Logical(compare(&left, &right).is_gt())),
            BinaryOperator::GreaterEqual => Ok(Value::Logical(
                compare(&left, &right) != Ordering::Less,
            )),
            BinaryOperator::Concat => Ok(Value::Text(
                left.to_text(culture) + &right.to_text(culture),
            )),
            _ => {
                let l = to_number(&left, culture);
                let r = to_number(&right, culture);
                l.and_then(|l| r.and_then(|r| arithmetic(op, l, r)))
                    .map(Value::Number)
            }
        };
        Ok(result.unwrap_or_else(Value::Error))
    }

    fn call_function(&self, name: &str, args: &[Expr]) -> FormulaResult<Value> {
        let def = match self.ctx.registry.get(name) {
            Some(def) => def,
            None => {
                debug!("function '{}' was not recognised", name);
                return Err(FormulaError::NameNotRecognized(name.to_string()));
            }
        };

        if !def.accepts(args.len()) {
            debug!("{} called with {} arguments", def.name, args.len());
            return Ok(Value::Error(ErrorKind::CellValue));
        }

        self.nested(|| match def.implementation {
            FunctionImpl::Lazy(body) => body(args, self),
            FunctionImpl::Eager(body) => {
                let mut values = Vec::with_capacity(args.len());
                for (index, arg) in args.iter().enumerate() {
                    let evaluated = match def.mode(index) {
                        ArgMode::Range => self.evaluate_range(arg),
                        ArgMode::Table => self.evaluate_table(arg),
                        ArgMode::Scalar | ArgMode::Lazy => self.evaluate(arg).map(scalar),
                    };
                    let value = if def.traps_errors {
                        trap(evaluated)?
                    } else {
                        evaluated?
                    };

                    if !def.traps_errors {
                        if let Value::Error(e) = value {
                            return Ok(Value::Error(e));
                        }
                    }
                    values.push(value);
                }
                Ok(body(&values, self.ctx).unwrap_or_else(Value::Error))
            }
        })
    }
}

fn trap(result: FormulaResult<Value>) -> FormulaResult<Value> {
    match result {
        Err(FormulaError::NameNotRecognized(name)) => {
            debug!("trapped unrecognised identifier '{}'", name);
            Ok(Value::Error(ErrorKind::NameNotRecognized))
        }
        other => other,
    }
}

fn arithmetic(op: BinaryOperator, l: f64, r: f64) -> CalcResult<f64> {
    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(ErrorKind::DivisionByZero);
            }
            l / r
        }
        BinaryOperator::Power => return math::power(l, r),
        _ => return Err(ErrorKind::CellValue),
    };

    if result.is_finite() {
        Ok(result)
    } else {
        Err(ErrorKind::NumberInvalid)
    }
}

fn combine_areas(op: BinaryOperator, left: Operand, right: Operand) -> Result<Vec<Area>, ErrorKind> {
    match op {
        BinaryOperator::Range => {
            let left = left.into_area()?;
            let right = right.into_area()?;
            left.bounding(&right)
                .map(|area| vec![area])
                .ok_or(ErrorKind::CellReference)
        }
        BinaryOperator::Intersect => {
            let left = left.into_areas()?;
            let right = right.into_areas()?;
            let overlaps: Vec<Area> = left
                .iter()
                .flat_map(|a| right.iter().filter_map(move |b| a.intersect(b)))
                .collect();
            if overlaps.is_empty() {
                Err(ErrorKind::NullValue)
            } else {
                Ok(overlaps)
            }
        }
        BinaryOperator::Union => {
            let mut areas = left.into_areas()?;
            areas.extend(right.into_areas()?);
            Ok(areas)
        }
        _ => Err(ErrorKind::CellValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CellProvider, EvaluationOptions, NameResolver, DEFAULT_MAX_DEPTH};
    use crate::parser::parse_formula;
    use crate::reference::{Origin, SheetLookup};
    use ahash::AHashMap;
    use cellcalc_core::{CellAddress, Culture};
    use pretty_assertions::assert_eq;

    /// Two sheets of literal values plus a few defined names
    #[derive(Default)]
    struct TestGrid {
        cells: AHashMap<(usize, u32, u32), Value>,
        names: AHashMap<String, NameDefinition>,
    }

    impl TestGrid {
        fn with(mut self, sheet: usize, a1: &str, value: impl Into<Value>) -> Self {
            let addr = CellAddress::parse(a1).unwrap();
            self.cells
                .insert((sheet, addr.row, u32::from(addr.col)), value.into());
            self
        }

        fn with_name(mut self, name: &str, definition: NameDefinition) -> Self {
            self.names.insert(name.to_ascii_uppercase(), definition);
            self
        }
    }

    impl SheetLookup for TestGrid {
        fn sheet_index(&self, name: &str) -> Option<usize> {
            ["Sheet1", "Data"]
                .iter()
                .position(|s| s.eq_ignore_ascii_case(name))
        }
    }

    impl CellProvider for TestGrid {
        fn cell_value(&self, sheet: usize, row: u32, col: u32) -> FormulaResult<Value> {
            Ok(self
                .cells
                .get(&(sheet, row, col))
                .cloned()
                .unwrap_or_default())
        }
    }

    impl NameResolver for TestGrid {
        fn resolve_name(&self, name: &str, _sheet: usize) -> Option<NameDefinition> {
            self.names.get(&name.to_ascii_uppercase()).cloned()
        }
    }

    fn grid() -> TestGrid {
        TestGrid::default()
            .with(0, "A1", 10.0)
            .with(0, "A2", 20.0)
            .with(0, "A3", "text")
            .with(0, "A4", true)
            .with(0, "B1", 1.0)
            .with(0, "B2", 2.0)
            .with(0, "C1", ErrorKind::NoValueAvailable)
            .with(1, "A1", 100.0)
            .with(1, "A2", 200.0)
            .with_name("Rate", NameDefinition::Expr(Expr::number(0.25)))
            .with_name("Block", NameDefinition::Area(Area::new(0, 0, 0, 1, 1)))
            .with_name("Loop", NameDefinition::Expr(parse_formula("Loop+1").unwrap()))
    }

    fn eval_at(grid: &TestGrid, formula: &str, row: u32, col: u32) -> FormulaResult<Value> {
        let ctx = EvaluationContext::new(grid, grid, Origin::new(0, row, col));
        evaluate_formula(formula, &ctx)
    }

    fn eval(formula: &str) -> FormulaResult<Value> {
        eval_at(&grid(), formula, 10, 10)
    }

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn err(kind: ErrorKind) -> Value {
        Value::Error(kind)
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2").unwrap(), num(3.0));
        assert_eq!(eval("=10-3").unwrap(), num(7.0));
        assert_eq!(eval("=4*5").unwrap(), num(20.0));
        assert_eq!(eval("=20/4").unwrap(), num(5.0));
        assert_eq!(eval("=2^10").unwrap(), num(1024.0));
        assert_eq!(eval("=2+3*4-5").unwrap(), num(9.0));
        assert_eq!(eval("=-2^2").unwrap(), num(-4.0));
        assert_eq!(eval("=(-2)^2").unwrap(), num(4.0));
        assert_eq!(eval("=2^-1").unwrap(), num(0.5));
        assert_eq!(eval("=50%").unwrap(), num(0.5));
        assert_eq!(eval("=--5").unwrap(), num(5.0));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("=0/0").unwrap(), err(ErrorKind::DivisionByZero));
        assert_eq!(eval("=\"0\"/0").unwrap(), err(ErrorKind::DivisionByZero));
        assert_eq!(eval("=TRUE/0").unwrap(), err(ErrorKind::DivisionByZero));
        assert_eq!(eval("=1/Z99").unwrap(), err(ErrorKind::DivisionByZero));
        assert_eq!(eval("=\"x\"/0").unwrap(), err(ErrorKind::CellValue));
    }

    #[test]
    fn test_power_edge_cases() {
        assert_eq!(eval("=0^0").unwrap(), err(ErrorKind::NumberInvalid));
        assert_eq!(eval("=0^-1").unwrap(), err(ErrorKind::DivisionByZero));
        assert_eq!(eval("=(-8)^0.5").unwrap(), err(ErrorKind::NumberInvalid));
        assert_eq!(eval("=10^400").unwrap(), err(ErrorKind::NumberInvalid));
    }

    #[test]
    fn test_coercion() {
        assert_eq!(eval("=\"3\"+TRUE").unwrap(), num(4.0));
        assert_eq!(eval("=A4+1").unwrap(), num(2.0));
        assert_eq!(eval("=Z99+1").unwrap(), num(1.0));
        assert_eq!(eval("=A3+1").unwrap(), err(ErrorKind::CellValue));
        assert_eq!(eval("=1&TRUE&\"x\"").unwrap(), Value::from("1TRUEx"));
        assert_eq!(eval("=0.1+0.2&\"\"").unwrap(), Value::from("0.3"));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(eval("=1<2").unwrap(), Value::Logical(true));
        assert_eq!(eval("=\"abc\"=\"ABC\"").unwrap(), Value::Logical(true));
        assert_eq!(eval("=99<\"a\"").unwrap(), Value::Logical(true));
        assert_eq!(eval("=\"z\"<FALSE").unwrap(), Value::Logical(true));
        assert_eq!(eval("=Z99=0").unwrap(), Value::Logical(true));
        assert_eq!(eval("=A1>=10").unwrap(), Value::Logical(true));
    }

    #[test]
    fn test_error_propagation() {
        for formula in ["=C1+1", "=1-C1", "=-C1", "=C1%", "=C1&\"x\"", "=C1<1", "=ABS(C1)"] {
            assert_eq!(
                eval(formula).unwrap(),
                err(ErrorKind::NoValueAvailable),
                "{}",
                formula
            );
        }
        // The left operand's error wins
        assert_eq!(eval("=(1/0)+C1").unwrap(), err(ErrorKind::DivisionByZero));
    }

    #[test]
    fn test_unknown_function_is_an_authoring_error() {
        let result = eval("=XXX(A1:A2)");
        assert_eq!(
            result,
            Err(FormulaError::NameNotRecognized("XXX".to_string()))
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "The identifier 'XXX' was not recognised."
        );
        assert_eq!(
            eval("=1+unknownName"),
            Err(FormulaError::NameNotRecognized("unknownName".to_string()))
        );
    }

    #[test]
    fn test_trapped_unknown_names() {
        assert_eq!(eval("=IFERROR(XXX,\"Success\")").unwrap(), Value::from("Success"));
        assert_eq!(eval("=IFERROR(XXX(1),2)").unwrap(), num(2.0));
        assert_eq!(
            eval("=IFNA(XXX,1)").unwrap(),
            err(ErrorKind::NameNotRecognized)
        );
        assert_eq!(eval("=ISERROR(XXX)").unwrap(), Value::Logical(true));
        assert_eq!(eval("=ERROR.TYPE(XXX)").unwrap(), num(5.0));
        // Trapping reaches through nested eager calls
        assert_eq!(eval("=IFERROR(ABS(XXX),0)").unwrap(), num(0.0));
    }

    #[test]
    fn test_arity_mismatch_is_value_error() {
        assert_eq!(eval("=CHAR()").unwrap(), err(ErrorKind::CellValue));
        assert_eq!(eval("=CHAR(65,66)").unwrap(), err(ErrorKind::CellValue));
        assert_eq!(eval("=IF(TRUE)").unwrap(), err(ErrorKind::CellValue));
        assert_eq!(eval("=PI(1)").unwrap(), err(ErrorKind::CellValue));
    }

    #[test]
    fn test_function_name_without_call() {
        assert_eq!(eval("=SUM").unwrap(), err(ErrorKind::NameNotRecognized));
    }

    #[test]
    fn test_implicit_intersection() {
        let grid = grid();
        // A1:A3 seen from row 2 is A2
        assert_eq!(eval_at(&grid, "=A1:A3", 1, 5).unwrap(), num(20.0));
        // Seen from a row the range misses
        assert_eq!(
            eval_at(&grid, "=A1:A3", 9, 5).unwrap(),
            err(ErrorKind::CellValue)
        );
        // A row range picks the origin's column
        assert_eq!(eval_at(&grid, "=A1:B1+0", 7, 1).unwrap(), num(1.0));
        // A block never collapses
        assert_eq!(
            eval_at(&grid, "=A1:B2", 0, 0).unwrap(),
            err(ErrorKind::CellValue)
        );
    }

    #[test]
    fn test_ranges_in_aggregates() {
        assert_eq!(eval("=SUM(A1:A4)").unwrap(), num(30.0));
        assert_eq!(eval("=SUM(A1:B2)").unwrap(), num(33.0));
        assert_eq!(eval("=SUM((A1,B2))").unwrap(), num(12.0));
        assert_eq!(eval("=SUM(A1:B2 B1:B9)").unwrap(), num(3.0));
        assert_eq!(eval("=SUM(Data!A1:A2)").unwrap(), num(300.0));
        assert_eq!(eval("=SUM(A1:C1)").unwrap(), err(ErrorKind::NoValueAvailable));
    }

    #[test]
    fn test_reference_errors() {
        assert_eq!(eval("=Nowhere!A1").unwrap(), err(ErrorKind::CellReference));
        assert_eq!(eval("=XFE1").unwrap(), err(ErrorKind::CellReference));
        assert_eq!(eval("=SUM(A1 B2)").unwrap(), err(ErrorKind::NullValue));
        assert_eq!(
            eval("=SUM(Sheet1!A1:Data!A2)").unwrap(),
            err(ErrorKind::CellReference)
        );
    }

    #[test]
    fn test_defined_names() {
        assert_eq!(eval("=A1*Rate").unwrap(), num(2.5));
        assert_eq!(eval("=SUM(Block)").unwrap(), num(33.0));
        assert_eq!(eval("=ROWS(Block)").unwrap(), num(2.0));
        assert_eq!(
            eval("=Loop"),
            Err(FormulaError::NestingTooDeep { limit: 256 })
        );
    }

    #[test]
    fn test_depth_limit_is_configurable() {
        let grid = grid();
        let options = EvaluationOptions {
            max_depth: 3,
            ..EvaluationOptions::default()
        };
        let ctx = EvaluationContext::new(&grid, &grid, Origin::default()).with_options(options);
        assert_eq!(evaluate_formula("=ABS(ABS(1))", &ctx).unwrap(), num(1.0));
        assert_eq!(
            evaluate_formula("=ABS(ABS(ABS(ABS(1))))", &ctx),
            Err(FormulaError::NestingTooDeep { limit: 3 })
        );
    }

    #[test]
    fn test_operators_count_toward_depth() {
        let grid = grid();
        let options = EvaluationOptions {
            max_depth: 3,
            ..EvaluationOptions::default()
        };
        let ctx = EvaluationContext::new(&grid, &grid, Origin::default()).with_options(options);
        assert_eq!(evaluate_formula("=1+1+1", &ctx).unwrap(), num(3.0));
        assert_eq!(
            evaluate_formula("=1+1+1+1+1", &ctx),
            Err(FormulaError::NestingTooDeep { limit: 3 })
        );
        assert_eq!(
            evaluate_formula("=-(-(-(-1)))", &ctx),
            Err(FormulaError::NestingTooDeep { limit: 3 })
        );
        assert_eq!(
            evaluate_formula("=ABS(ABS(1+1))", &ctx).unwrap(),
            num(2.0)
        );
        assert_eq!(
            evaluate_formula("=ABS(ABS(1+1+1))", &ctx),
            Err(FormulaError::NestingTooDeep { limit: 3 })
        );
    }

    #[test]
    fn test_shared_depth_counter() {
        let grid = grid();
        let depth = Cell::new(DEFAULT_MAX_DEPTH - 2);
        let ctx = EvaluationContext::new(&grid, &grid, Origin::default()).with_depth(&depth);
        assert_eq!(evaluate_formula("=1+1", &ctx).unwrap(), num(2.0));
        assert_eq!(
            evaluate_formula("=ABS(1+1)", &ctx).unwrap(),
            num(2.0)
        );
        assert_eq!(
            evaluate_formula("=1+1+1+1", &ctx),
            Err(FormulaError::NestingTooDeep {
                limit: DEFAULT_MAX_DEPTH
            })
        );
        // The counter is back where it started
        assert_eq!(depth.get(), DEFAULT_MAX_DEPTH - 2);
    }

    #[test]
    fn test_range_cell_limit() {
        let grid = grid();
        let options = EvaluationOptions {
            max_range_cells: 4,
            ..EvaluationOptions::default()
        };
        let ctx = EvaluationContext::new(&grid, &grid, Origin::default()).with_options(options);
        assert_eq!(evaluate_formula("=SUM(A1:B2)", &ctx).unwrap(), num(33.0));
        assert_eq!(
            evaluate_formula("=SUM(A1:B3)", &ctx).unwrap(),
            err(ErrorKind::NumberInvalid)
        );
        assert_eq!(
            evaluate_formula("=SUM((A1:B2,B9))", &ctx).unwrap(),
            err(ErrorKind::NumberInvalid)
        );
        // Implicit intersection reads a single cell
        assert_eq!(evaluate_formula("=A1:A9", &ctx).unwrap(), num(10.0));

        assert_eq!(
            eval("=SUM(A1:XFD1048576)").unwrap(),
            err(ErrorKind::NumberInvalid)
        );
        assert_eq!(
            eval("=COUNTBLANK(Data!A1:C1048576)").unwrap(),
            err(ErrorKind::NumberInvalid)
        );
    }

    #[test]
    fn test_union_in_table_position() {
        assert_eq!(eval("=SUM((A1:B2,C1))").unwrap(), err(ErrorKind::NoValueAvailable));
        assert_eq!(eval("=SUM((A1:B2,A1))").unwrap(), num(43.0));
        assert_eq!(
            eval("=INDEX((A1:B2,A1),3,2)").unwrap(),
            err(ErrorKind::CellReference)
        );
        assert_eq!(
            eval("=VLOOKUP(10,(A1:B2,A1),2,FALSE)").unwrap(),
            err(ErrorKind::CellReference)
        );
        assert_eq!(eval("=INDEX(A1:B2,2,2)").unwrap(), num(2.0));
    }

    #[test]
    fn test_culture() {
        let grid = grid();
        let options = EvaluationOptions {
            culture: Culture::with_separators(',', ';'),
            ..EvaluationOptions::default()
        };
        let ctx = EvaluationContext::new(&grid, &grid, Origin::default()).with_options(options);
        assert_eq!(
            evaluate_formula("=ROUND(2,5;0)", &ctx).unwrap(),
            num(3.0)
        );
        assert_eq!(
            evaluate_formula("=\"1,5\"*2", &ctx).unwrap(),
            num(3.0)
        );
        assert_eq!(
            evaluate_formula("=1,5&\"\"", &ctx).unwrap(),
            Value::from("1,5")
        );
    }

    #[test]
    fn test_array_constants() {
        assert_eq!(
            eval("={1,2;3,4}").unwrap(),
            Value::Array(vec![vec![num(1.0), num(2.0)], vec![num(3.0), num(4.0)]])
        );
        assert_eq!(eval("={5,6}+1").unwrap(), num(6.0));
        assert_eq!(eval("=SUM({1,2;3,4})").unwrap(), num(10.0));
    }

    #[test]
    fn test_evaluate_parsed_ast() {
        let grid = grid();
        let ctx = EvaluationContext::new(&grid, &grid, Origin::default());
        let ast = parse_formula("=A1+A2").unwrap();
        assert_eq!(evaluate(&ast, &ctx).unwrap(), num(30.0));
    }
}
