//! Built-in spreadsheet functions
//!
//! Functions are described by [`FunctionDef`] entries in a [`FunctionRegistry`].
//! Each definition carries its arity, how each argument is evaluated, and
//! whether error values reach the body or short-circuit the call.

pub mod date;
pub mod info;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod text;

use crate::ast::Expr;
use crate::coerce::CalcResult;
use crate::context::EvaluationContext;
use crate::error::FormulaResult;
use crate::evaluator::Evaluator;
use ahash::AHashMap;
use cellcalc_core::Value;
use log::debug;
use once_cell::sync::Lazy;

/// Body of a function whose arguments are evaluated before the call
///
/// An `Err` becomes the corresponding in-cell error value.
pub type EagerFn = fn(&[Value], &EvaluationContext) -> CalcResult;

/// Body of a function that evaluates its own argument subtrees
pub type LazyFn = fn(&[Expr], &Evaluator) -> FormulaResult<Value>;

/// How an argument is evaluated before it reaches an eager body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgMode {
    /// A single value; ranges collapse by implicit intersection
    Scalar,
    /// Ranges arrive whole, as `Value::Array` grids
    Range,
    /// Like `Range`, but a multi-area reference is `#REF!`
    Table,
    /// The subtree is handed over unevaluated
    Lazy,
}

/// Function implementation
#[derive(Clone, Copy)]
pub enum FunctionImpl {
    Eager(EagerFn),
    Lazy(LazyFn),
}

/// Function definition
#[derive(Clone)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Per-argument evaluation mode; the last entry repeats
    pub modes: &'static [ArgMode],
    /// Whether error values are passed to the body instead of short-circuiting
    pub traps_errors: bool,
    /// Is volatile (recalculates every time)
    pub volatile: bool,
    pub implementation: FunctionImpl,
}

const SCALAR: &[ArgMode] = &[ArgMode::Scalar];
const RANGE: &[ArgMode] = &[ArgMode::Range];
const LAZY: &[ArgMode] = &[ArgMode::Lazy];

impl FunctionDef {
    /// An eager function taking scalar arguments
    pub fn eager(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: EagerFn,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            modes: SCALAR,
            traps_errors: false,
            volatile: false,
            implementation: FunctionImpl::Eager(implementation),
        }
    }

    /// A function that evaluates its own arguments
    pub fn lazy(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: LazyFn,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            modes: LAZY,
            traps_errors: false,
            volatile: false,
            implementation: FunctionImpl::Lazy(implementation),
        }
    }

    pub fn with_modes(mut self, modes: &'static [ArgMode]) -> Self {
        self.modes = modes;
        self
    }

    /// Take all arguments as whole ranges
    pub fn ranges(self) -> Self {
        self.with_modes(RANGE)
    }

    pub fn trapping(mut self) -> Self {
        self.traps_errors = true;
        self
    }

    pub fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }

    /// Evaluation mode of the argument at `index`
    pub fn mode(&self, index: usize) -> ArgMode {
        self.modes
            .get(index)
            .or_else(|| self.modes.last())
            .copied()
            .unwrap_or(ArgMode::Scalar)
    }

    /// Whether `count` arguments satisfy the arity contract
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }
}

static BUILTINS: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::with_builtins);

/// Function registry
///
/// Lookup is case-insensitive. A registry is immutable while an evaluation
/// borrows it; register custom functions before evaluating.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in function
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_logical_functions();
        registry.register_math_functions();
        registry.register_text_functions();
        registry.register_info_functions();
        registry.register_date_functions();
        registry.register_lookup_functions();

        debug!("built function registry with {} functions", registry.len());
        registry
    }

    /// The shared built-in registry
    pub fn builtin() -> &'static FunctionRegistry {
        &BUILTINS
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function, replacing any previous one of the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_ascii_uppercase(), def);
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.values().map(|def| def.name).collect();
        names.sort_unstable();
        names
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef::lazy("IF", 2, Some(3), logical::fn_if));
        self.register(FunctionDef::lazy("IFERROR", 2, Some(2), logical::fn_iferror).trapping());
        self.register(FunctionDef::lazy("IFNA", 2, Some(2), logical::fn_ifna).trapping());
        self.register(FunctionDef::lazy("AND", 1, None, logical::fn_and));
        self.register(FunctionDef::lazy("OR", 1, None, logical::fn_or));
        self.register(FunctionDef::eager("NOT", 1, Some(1), logical::fn_not));
        self.register(FunctionDef::eager("XOR", 1, None, logical::fn_xor).ranges());
        self.register(FunctionDef::eager("TRUE", 0, Some(0), logical::fn_true));
        self.register(FunctionDef::eager("FALSE", 0, Some(0), logical::fn_false));
    }

    fn register_math_functions(&mut self) {
        // Aggregates see ranges whole
        self.register(FunctionDef::eager("SUM", 1, None, math::fn_sum).ranges());
        self.register(FunctionDef::eager("PRODUCT", 1, None, math::fn_product).ranges());
        self.register(FunctionDef::eager("AVERAGE", 1, None, math::fn_average).ranges());
        self.register(FunctionDef::eager("MIN", 1, None, math::fn_min).ranges());
        self.register(FunctionDef::eager("MAX", 1, None, math::fn_max).ranges());
        self.register(
            FunctionDef::eager("COUNT", 1, None, math::fn_count)
                .ranges()
                .trapping(),
        );
        self.register(
            FunctionDef::eager("COUNTA", 1, None, math::fn_counta)
                .ranges()
                .trapping(),
        );
        self.register(
            FunctionDef::eager("COUNTBLANK", 1, Some(1), math::fn_countblank)
                .ranges()
                .trapping(),
        );

        self.register(FunctionDef::eager("ABS", 1, Some(1), math::fn_abs));
        self.register(FunctionDef::eager("SIGN", 1, Some(1), math::fn_sign));
        self.register(FunctionDef::eager("INT", 1, Some(1), math::fn_int));
        self.register(FunctionDef::eager("TRUNC", 1, Some(2), math::fn_trunc));
        self.register(FunctionDef::eager("ROUND", 2, Some(2), math::fn_round));
        self.register(FunctionDef::eager("ROUNDUP", 2, Some(2), math::fn_roundup));
        self.register(FunctionDef::eager("ROUNDDOWN", 2, Some(2), math::fn_rounddown));
        self.register(FunctionDef::eager("MOD", 2, Some(2), math::fn_mod));
        self.register(FunctionDef::eager("SQRT", 1, Some(1), math::fn_sqrt));
        self.register(FunctionDef::eager("POWER", 2, Some(2), math::fn_power));
        self.register(FunctionDef::eager("EXP", 1, Some(1), math::fn_exp));
        self.register(FunctionDef::eager("LN", 1, Some(1), math::fn_ln));
        self.register(FunctionDef::eager("LOG", 1, Some(2), math::fn_log));
        self.register(FunctionDef::eager("LOG10", 1, Some(1), math::fn_log10));
        self.register(FunctionDef::eager("PI", 0, Some(0), math::fn_pi));
        self.register(FunctionDef::eager("RAND", 0, Some(0), math::fn_rand).volatile());
        self.register(
            FunctionDef::eager("RANDBETWEEN", 2, Some(2), math::fn_randbetween).volatile(),
        );
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef::eager("CHAR", 1, Some(1), text::fn_char));
        self.register(FunctionDef::eager("CODE", 1, Some(1), text::fn_code));
        self.register(FunctionDef::eager("LEN", 1, Some(1), text::fn_len));
        self.register(FunctionDef::eager("LEFT", 1, Some(2), text::fn_left));
        self.register(FunctionDef::eager("RIGHT", 1, Some(2), text::fn_right));
        self.register(FunctionDef::eager("MID", 3, Some(3), text::fn_mid));
        self.register(FunctionDef::eager("UPPER", 1, Some(1), text::fn_upper));
        self.register(FunctionDef::eager("LOWER", 1, Some(1), text::fn_lower));
        self.register(FunctionDef::eager("TRIM", 1, Some(1), text::fn_trim));
        self.register(FunctionDef::eager("REPT", 2, Some(2), text::fn_rept));
        self.register(FunctionDef::eager("EXACT", 2, Some(2), text::fn_exact));
        self.register(FunctionDef::eager("CONCAT", 1, None, text::fn_concat).ranges());
        self.register(FunctionDef::eager("CONCATENATE", 1, None, text::fn_concatenate));
        self.register(FunctionDef::eager("VALUE", 1, Some(1), text::fn_value));
        self.register(FunctionDef::eager("T", 1, Some(1), text::fn_t));
    }

    fn register_info_functions(&mut self) {
        // Inspectors receive errors as ordinary values
        self.register(FunctionDef::eager("ISBLANK", 1, Some(1), info::fn_isblank).trapping());
        self.register(FunctionDef::eager("ISNUMBER", 1, Some(1), info::fn_isnumber).trapping());
        self.register(FunctionDef::eager("ISTEXT", 1, Some(1), info::fn_istext).trapping());
        self.register(
            FunctionDef::eager("ISLOGICAL", 1, Some(1), info::fn_islogical).trapping(),
        );
        self.register(FunctionDef::eager("ISERROR", 1, Some(1), info::fn_iserror).trapping());
        self.register(FunctionDef::eager("ISERR", 1, Some(1), info::fn_iserr).trapping());
        self.register(FunctionDef::eager("ISNA", 1, Some(1), info::fn_isna).trapping());
        self.register(FunctionDef::eager("NA", 0, Some(0), info::fn_na));
        self.register(
            FunctionDef::eager("ERROR.TYPE", 1, Some(1), info::fn_error_type).trapping(),
        );
        self.register(FunctionDef::eager("N", 1, Some(1), info::fn_n).trapping());
    }

    fn register_date_functions(&mut self) {
        self.register(FunctionDef::eager("DATE", 3, Some(3), date::fn_date));
        self.register(FunctionDef::eager("YEAR", 1, Some(1), date::fn_year));
        self.register(FunctionDef::eager("MONTH", 1, Some(1), date::fn_month));
        self.register(FunctionDef::eager("DAY", 1, Some(1), date::fn_day));
        self.register(FunctionDef::eager("TODAY", 0, Some(0), date::fn_today).volatile());
        self.register(FunctionDef::eager("NOW", 0, Some(0), date::fn_now).volatile());
    }

    fn register_lookup_functions(&mut self) {
        const TABLE: &[ArgMode] = &[ArgMode::Table];
        const TABLE_FIRST: &[ArgMode] = &[ArgMode::Table, ArgMode::Scalar];
        const TABLE_SECOND: &[ArgMode] = &[ArgMode::Scalar, ArgMode::Table, ArgMode::Scalar];

        self.register(
            FunctionDef::eager("INDEX", 2, Some(3), lookup::fn_index).with_modes(TABLE_FIRST),
        );
        self.register(
            FunctionDef::eager("MATCH", 2, Some(3), lookup::fn_match).with_modes(TABLE_SECOND),
        );
        self.register(
            FunctionDef::eager("VLOOKUP", 3, Some(4), lookup::fn_vlookup)
                .with_modes(TABLE_SECOND),
        );
        self.register(FunctionDef::eager("ROWS", 1, Some(1), lookup::fn_rows).with_modes(TABLE));
        self.register(
            FunctionDef::eager("COLUMNS", 1, Some(1), lookup::fn_columns).with_modes(TABLE),
        );
        self.register(FunctionDef::lazy("CHOOSE", 2, None, lookup::fn_choose));
    }
}
