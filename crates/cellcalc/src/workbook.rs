//! In-memory workbook host
//!
//! A [`Workbook`] holds sheets of values and formulas plus defined names, and
//! computes formula cells on demand when they are read.

use crate::error::{Error, Result};
use crate::formula_result;
use ahash::AHashMap;
use cellcalc_core::{
    CellAddress, Culture, Error as CoreError, ErrorKind, Value, MAX_SHEET_NAME_LEN,
};
use cellcalc_formula::reference::quote_sheet_name;
use cellcalc_formula::{
    evaluate, parse_formula, parse_formula_with, AddressExpr, Area, CellProvider, EvaluationContext,
    EvaluationOptions, Expr, FormulaError, FormulaResult, FunctionRegistry, NameDefinition,
    NameResolver, Origin, ReferenceResolver, SheetLookup,
};
use log::debug;
use std::cell::{Cell, RefCell};

/// Contents of a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    /// A constant
    Value(Value),
    /// A parsed formula
    Formula(Expr),
}

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Non-empty cells keyed by (row, col)
    cells: AHashMap<(u32, u16), CellContent>,
}

impl Worksheet {
    /// Create a new empty worksheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: AHashMap::new(),
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set a constant by address string (e.g., "A1"); `Blank` clears the cell
    pub fn set_cell_value(&mut self, address: &str, value: impl Into<Value>) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_value_at(addr.row, addr.col, value.into());
        Ok(())
    }

    pub fn set_value_at(&mut self, row: u32, col: u16, value: Value) {
        if value == Value::Blank {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), CellContent::Value(value));
        }
    }

    /// Set a formula written with the invariant culture
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        let expr = parse_formula(formula)?;
        self.set_formula_at(addr.row, addr.col, expr);
        Ok(())
    }

    pub fn set_formula_at(&mut self, row: u32, col: u16, expr: Expr) {
        self.cells.insert((row, col), CellContent::Formula(expr));
    }

    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cells.remove(&(addr.row, addr.col));
        Ok(())
    }

    /// Get a cell by address string
    pub fn cell(&self, address: &str) -> Result<Option<&CellContent>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellContent> {
        self.cells.get(&(row, col))
    }

    /// Iterate over formula cells as (row, col, formula)
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u16, &Expr)> {
        self.cells.iter().filter_map(|(&(row, col), content)| match content {
            CellContent::Formula(expr) => Some((row, col, expr)),
            CellContent::Value(_) => None,
        })
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Scope of a defined name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Visible from every sheet
    Workbook,
    /// Visible only from formulas on one sheet, shadowing a workbook name
    Sheet(usize),
}

/// A workbook: sheets, defined names, functions and calculation settings
#[derive(Clone)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    /// Keyed by uppercase name and scope
    names: AHashMap<(String, NameScope), NameDefinition>,
    registry: FunctionRegistry,
    options: EvaluationOptions,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// Create a workbook with one empty sheet named "Sheet1"
    pub fn new() -> Self {
        Self {
            sheets: vec![Worksheet::new("Sheet1")],
            names: AHashMap::new(),
            registry: FunctionRegistry::builtin().clone(),
            options: EvaluationOptions::default(),
        }
    }

    /// Create a workbook using the given culture for formula text and coercion
    pub fn with_culture(culture: Culture) -> Self {
        let mut workbook = Self::new();
        workbook.options.culture = culture;
        workbook
    }

    pub fn culture(&self) -> &Culture {
        &self.options.culture
    }

    pub fn set_culture(&mut self, culture: Culture) {
        self.options.culture = culture;
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Set the nesting ceiling shared by formulas and chains of formula cells
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.options.max_depth = max_depth;
    }

    /// Set the largest range, in cells, a function argument may load
    pub fn set_max_range_cells(&mut self, max_range_cells: u64) {
        self.options.max_range_cells = max_range_cells;
    }

    /// Functions available to this workbook's formulas
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Register custom functions here
    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    // === Sheets ===

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.sheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.sheets.get_mut(index)
    }

    /// Get a sheet's index by name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets
            .iter()
            .position(|ws| ws.name().eq_ignore_ascii_case(name))
    }

    /// Add a new worksheet with the given name
    pub fn add_worksheet(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;
        self.sheets.push(Worksheet::new(name));
        Ok(self.sheets.len() - 1)
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CoreError::InvalidSheetName("Sheet name cannot be empty".into()).into());
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(CoreError::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            ))
            .into());
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(
                CoreError::InvalidSheetName(format!("Sheet name cannot contain '{}'", c)).into(),
            );
        }

        if self.sheet_index(name).is_some() {
            return Err(CoreError::DuplicateSheetName(name.into()).into());
        }
        Ok(())
    }

    fn sheet(&self, index: usize) -> Result<&Worksheet> {
        self.sheets
            .get(index)
            .ok_or(Error::Core(CoreError::SheetOutOfBounds(index, self.sheets.len())))
    }

    fn sheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        let count = self.sheets.len();
        self.sheets
            .get_mut(index)
            .ok_or(Error::Core(CoreError::SheetOutOfBounds(index, count)))
    }

    // === Cells ===

    /// Set a constant
    pub fn set_value(&mut self, sheet: usize, address: &str, value: impl Into<Value>) -> Result<()> {
        self.sheet_mut(sheet)?.set_cell_value(address, value)
    }

    /// Set a formula written in this workbook's culture
    pub fn set_formula(&mut self, sheet: usize, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        let expr = parse_formula_with(formula, &self.options.culture)?;
        self.sheet_mut(sheet)?.set_formula_at(addr.row, addr.col, expr);
        Ok(())
    }

    /// Canonical text of a formula cell, with a leading `=`
    pub fn formula_text(&self, sheet: usize, address: &str) -> Result<Option<String>> {
        match self.sheet(sheet)?.cell(address)? {
            Some(CellContent::Formula(expr)) => Ok(Some(format!("={}", expr))),
            _ => Ok(None),
        }
    }

    /// Copy a cell, shifting the relative references of a formula
    pub fn copy_cell(&mut self, sheet: usize, from: &str, to: &str) -> Result<()> {
        let from = CellAddress::parse(from)?;
        let to = CellAddress::parse(to)?;
        let worksheet = self.sheet_mut(sheet)?;

        match worksheet.cell_at(from.row, from.col).cloned() {
            Some(CellContent::Formula(expr)) => {
                worksheet.set_formula_at(to.row, to.col, expr.relocate(from, to));
            }
            Some(CellContent::Value(value)) => worksheet.set_value_at(to.row, to.col, value),
            None => worksheet.set_value_at(to.row, to.col, Value::Blank),
        }
        Ok(())
    }

    /// Whether a cell's formula calls a volatile function such as RAND or NOW
    pub fn is_volatile(&self, sheet: usize, address: &str) -> Result<bool> {
        match self.sheet(sheet)?.cell(address)? {
            Some(CellContent::Formula(expr)) => Ok(calls_volatile(expr, &self.registry)),
            _ => Ok(false),
        }
    }

    // === Defined names ===

    /// Define a name referring to a reference, constant or formula
    ///
    /// `refers_to` is formula text in this workbook's culture, e.g.
    /// `Sheet1!$B$1`, `0.0725` or `=SUM(Sales)`.
    pub fn define_name(&mut self, name: &str, refers_to: &str, scope: NameScope) -> Result<()> {
        validate_name(name)?;
        if let NameScope::Sheet(index) = scope {
            self.sheet(index)?;
        }

        let expr = parse_formula_with(refers_to, &self.options.culture)?;
        let definition = self.bind_name(expr);
        self.names
            .insert((name.to_ascii_uppercase(), scope), definition);
        Ok(())
    }

    /// Sheet-qualified references bind to a fixed area up front
    fn bind_name(&self, expr: Expr) -> NameDefinition {
        let resolver = ReferenceResolver::new(self);
        let origin = Origin::default();
        let area = match &expr {
            Expr::Reference(addr) if addr.sheet.is_some() => resolver
                .resolve_cell(addr, origin)
                .ok()
                .map(Area::single),
            Expr::RangeReference(start, end) if start.sheet.is_some() => {
                resolver.resolve_range(start, end, origin).ok()
            }
            _ => None,
        };

        match area {
            Some(area) => NameDefinition::Area(area),
            None => NameDefinition::Expr(expr),
        }
    }

    pub fn remove_name(&mut self, name: &str, scope: NameScope) -> bool {
        self.names
            .remove(&(name.to_ascii_uppercase(), scope))
            .is_some()
    }

    fn lookup_name(&self, name: &str, sheet: usize) -> Option<&NameDefinition> {
        let key = name.to_ascii_uppercase();
        self.names
            .get(&(key.clone(), NameScope::Sheet(sheet)))
            .or_else(|| self.names.get(&(key, NameScope::Workbook)))
    }

    // === Evaluation ===

    /// Evaluate free-standing formula text as if entered in A1 of `sheet`
    pub fn evaluate(&self, sheet: usize, formula: &str) -> Result<Value> {
        self.evaluate_at(sheet, "A1", formula)
    }

    /// Evaluate free-standing formula text as if entered in the given cell
    pub fn evaluate_at(&self, sheet: usize, address: &str, formula: &str) -> Result<Value> {
        self.sheet(sheet)?;
        let addr = CellAddress::parse(address)?;
        let expr = parse_formula_with(formula, &self.options.culture)?;
        let origin = Origin::new(sheet, addr.row, u32::from(addr.col));
        Ok(Session::new(self).evaluate(&expr, origin)?)
    }

    /// Current value of a cell, computing its formula if it has one
    ///
    /// A formula naming something unknown fails here with
    /// [`FormulaError::NameNotRecognized`]; read from another formula the same
    /// cell is `#NAME?`.
    pub fn cell_value(&self, sheet: usize, address: &str) -> Result<Value> {
        self.sheet(sheet)?;
        let addr = CellAddress::parse(address)?;
        Ok(Session::new(self).compute(sheet, addr.row, u32::from(addr.col))?)
    }

    fn cell_name(&self, sheet: usize, row: u32, col: u32) -> String {
        let sheet_name = self.sheets.get(sheet).map_or("", |ws| ws.name());
        format!(
            "{}!{}{}",
            quote_sheet_name(sheet_name),
            CellAddress::column_to_letters(col),
            row + 1
        )
    }
}

impl SheetLookup for Workbook {
    fn sheet_index(&self, name: &str) -> Option<usize> {
        Workbook::sheet_index(self, name)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let invalid = || Error::Core(CoreError::InvalidName(name.to_string()));

    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .map_or(false, |c| c.is_alphabetic() || c == '_' || c == '\\');
    let rest_ok = chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '\\'));
    if !first_ok || !rest_ok {
        return Err(invalid());
    }

    // Names must not read as booleans or cell references
    if name.eq_ignore_ascii_case("TRUE")
        || name.eq_ignore_ascii_case("FALSE")
        || AddressExpr::parse(name, None).is_some()
    {
        return Err(invalid());
    }
    Ok(())
}

fn calls_volatile(expr: &Expr, registry: &FunctionRegistry) -> bool {
    match expr {
        Expr::FunctionCall { name, args } => {
            registry.get(name).map_or(false, |def| def.volatile)
                || args.iter().any(|arg| calls_volatile(arg, registry))
        }
        Expr::UnaryOp { operand, .. } => calls_volatile(operand, registry),
        Expr::BinaryOp { left, right, .. } => {
            calls_volatile(left, registry) || calls_volatile(right, registry)
        }
        Expr::Array(rows) => rows.iter().flatten().any(|e| calls_volatile(e, registry)),
        _ => false,
    }
}

/// One top-level read of the workbook
///
/// Tracks the formula cells being computed so that a cell depending on itself
/// is reported instead of recursing forever. Every formula evaluated during
/// the read shares one nesting counter, and each hop to a referenced formula
/// cell is one more level on it.
struct Session<'a> {
    workbook: &'a Workbook,
    in_progress: RefCell<Vec<(usize, u32, u32)>>,
    depth: Cell<usize>,
}

impl<'a> Session<'a> {
    fn new(workbook: &'a Workbook) -> Self {
        Self {
            workbook,
            in_progress: RefCell::new(Vec::new()),
            depth: Cell::new(0),
        }
    }

    fn evaluate(&self, expr: &Expr, origin: Origin) -> FormulaResult<Value> {
        let ctx = EvaluationContext::new(self, self, origin)
            .with_registry(&self.workbook.registry)
            .with_options(self.workbook.options)
            .with_depth(&self.depth);
        evaluate(expr, &ctx).map(formula_result)
    }

    fn compute(&self, sheet: usize, row: u32, col: u32) -> FormulaResult<Value> {
        let content = self
            .workbook
            .sheets
            .get(sheet)
            .zip(u16::try_from(col).ok())
            .and_then(|(ws, col)| ws.cell_at(row, col));

        match content {
            None => Ok(Value::Blank),
            Some(CellContent::Value(value)) => Ok(value.clone()),
            Some(CellContent::Formula(expr)) => self.compute_formula(sheet, row, col, expr),
        }
    }

    fn compute_formula(&self, sheet: usize, row: u32, col: u32, expr: &Expr) -> FormulaResult<Value> {
        let key = (sheet, row, col);
        if self.in_progress.borrow().contains(&key) {
            return Err(FormulaError::CircularReference(
                self.workbook.cell_name(sheet, row, col),
            ));
        }

        let limit = self.workbook.options.max_depth;
        let depth = self.depth.get();
        if depth >= limit {
            debug!(
                "{} is {} levels deep",
                self.workbook.cell_name(sheet, row, col),
                depth
            );
            return Err(FormulaError::NestingTooDeep { limit });
        }

        self.in_progress.borrow_mut().push(key);
        self.depth.set(depth + 1);
        let result = self.evaluate(expr, Origin::new(sheet, row, col));
        self.depth.set(depth);
        self.in_progress.borrow_mut().pop();
        result
    }
}

impl SheetLookup for Session<'_> {
    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.workbook.sheet_index(name)
    }
}

impl CellProvider for Session<'_> {
    fn cell_value(&self, sheet: usize, row: u32, col: u32) -> FormulaResult<Value> {
        match self.compute(sheet, row, col) {
            Err(FormulaError::NameNotRecognized(name)) => {
                debug!(
                    "{} refers to unrecognised identifier '{}'",
                    self.workbook.cell_name(sheet, row, col),
                    name
                );
                Ok(Value::Error(ErrorKind::NameNotRecognized))
            }
            other => other,
        }
    }
}

impl NameResolver for Session<'_> {
    fn resolve_name(&self, name: &str, sheet: usize) -> Option<NameDefinition> {
        self.workbook.lookup_name(name, sheet).cloned()
    }
}
