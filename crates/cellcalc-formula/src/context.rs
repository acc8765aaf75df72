//! Evaluation context
//!
//! The engine reads cells, defined names and the culture through the traits
//! in this module. Everything here is borrowed read-only for the duration of
//! one evaluation.

use crate::ast::Expr;
use crate::error::FormulaResult;
use crate::functions::FunctionRegistry;
use crate::reference::{Area, Origin, SheetLookup};
use cellcalc_core::{Culture, Value, ValueType};
use std::cell::Cell;

/// Default recursion ceiling for evaluation
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default ceiling on the cells one range argument may load
///
/// Two whole columns.
pub const DEFAULT_MAX_RANGE_CELLS: u64 = 2 * 1_048_576;

/// Read access to the host's cell grid
pub trait CellProvider: SheetLookup {
    /// Current value of a cell
    ///
    /// A host that evaluates formula cells on demand returns `Err` when the
    /// whole calculation has to stop, such as a circular reference. A cell
    /// whose formula names something unknown reads as `#NAME?`.
    fn cell_value(&self, sheet: usize, row: u32, col: u32) -> FormulaResult<Value>;

    /// Type tag of a cell's current value
    fn cell_type(&self, sheet: usize, row: u32, col: u32) -> ValueType {
        self.cell_value(sheet, row, col)
            .map(|v| v.value_type())
            .unwrap_or(ValueType::Error)
    }
}

/// What a defined name refers to
#[derive(Debug, Clone, PartialEq)]
pub enum NameDefinition {
    /// A formula or constant, evaluated in the referring formula's context
    Expr(Expr),
    /// A block of cells
    Area(Area),
}

/// Defined-name lookup supplied by the host
pub trait NameResolver {
    /// Resolve a name as seen from a formula on the given sheet
    ///
    /// Lookup is case-insensitive; a sheet-scoped name shadows a workbook one.
    fn resolve_name(&self, name: &str, sheet: usize) -> Option<NameDefinition>;
}

/// A single all-blank sheet with no defined names
///
/// Used for evaluating free-standing expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyGrid;

impl SheetLookup for EmptyGrid {
    fn sheet_index(&self, _name: &str) -> Option<usize> {
        None
    }
}

impl CellProvider for EmptyGrid {
    fn cell_value(&self, _sheet: usize, _row: u32, _col: u32) -> FormulaResult<Value> {
        Ok(Value::Blank)
    }
}

impl NameResolver for EmptyGrid {
    fn resolve_name(&self, _name: &str, _sheet: usize) -> Option<NameDefinition> {
        None
    }
}

/// Evaluation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Nesting ceiling; evaluation deeper than this fails with `NestingTooDeep`
    pub max_depth: usize,
    /// Largest range, in cells, a function argument may load; bigger ranges
    /// evaluate to `#NUM!`
    pub max_range_cells: u64,
    /// Separators and date system
    pub culture: Culture,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
            culture: Culture::invariant(),
        }
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Cell values
    pub cells: &'a dyn CellProvider,
    /// Defined names
    pub names: &'a dyn NameResolver,
    /// Callable functions
    pub registry: &'a FunctionRegistry,
    /// The cell the formula belongs to
    pub origin: Origin,
    pub options: EvaluationOptions,
    /// Nesting counter shared with the calculation this evaluation runs in
    ///
    /// A host that evaluates referenced formula cells on demand passes the
    /// same counter to every nested evaluation, so the whole chain draws on
    /// one `max_depth` budget.
    pub depth: Option<&'a Cell<usize>>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context with the built-in functions and default options
    pub fn new(cells: &'a dyn CellProvider, names: &'a dyn NameResolver, origin: Origin) -> Self {
        Self {
            cells,
            names,
            registry: FunctionRegistry::builtin(),
            origin,
            options: EvaluationOptions::default(),
            depth: None,
        }
    }

    /// A context over an empty grid, for free-standing expressions
    pub fn simple() -> EvaluationContext<'static> {
        EvaluationContext::new(&EmptyGrid, &EmptyGrid, Origin::default())
    }

    pub fn with_registry(mut self, registry: &'a FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_depth(mut self, depth: &'a Cell<usize>) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn culture(&self) -> &Culture {
        &self.options.culture
    }
}
