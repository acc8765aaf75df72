//! # cellcalc-formula
//!
//! Formula parser and evaluator for cellcalc.
//!
//! This crate provides:
//! - Tokenizing and parsing formula text into an AST, honouring the culture's
//!   separators
//! - Reference resolution against a host-supplied grid
//! - Evaluation with spreadsheet coercion and error propagation rules
//! - A case-insensitive registry of built-in functions
//!
//! Calculation errors such as `#DIV/0!` are values. Only formulas that cannot be
//! evaluated at all (bad syntax, unknown identifiers, runaway nesting) fail with
//! a [`FormulaError`].
//!
//! ## Example
//!
//! ```rust
//! use cellcalc_core::{ErrorKind, Value};
//! use cellcalc_formula::{evaluate_formula, parse_formula, EvaluationContext};
//!
//! let ast = parse_formula("=SUM(A1:A10)*2").unwrap();
//! assert_eq!(ast.to_string(), "SUM(A1:A10)*2");
//!
//! let ctx = EvaluationContext::simple();
//! assert_eq!(
//!     evaluate_formula("=CHAR(270)", &ctx).unwrap(),
//!     Value::Error(ErrorKind::CellValue)
//! );
//! assert_eq!(
//!     evaluate_formula("=XXX(1)", &ctx).unwrap_err().to_string(),
//!     "The identifier 'XXX' was not recognised."
//! );
//! ```

pub mod ast;
pub mod coerce;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod reference;
pub mod token;

pub use ast::{BinaryOperator, Expr, Precedent, UnaryOperator};
pub use coerce::CalcResult;
pub use context::{
    CellProvider, EmptyGrid, EvaluationContext, EvaluationOptions, NameDefinition, NameResolver,
};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_formula, Evaluator};
pub use functions::{ArgMode, FunctionDef, FunctionRegistry};
pub use parser::{parse_formula, parse_formula_with};
pub use reference::{AddressExpr, Area, Origin, ReferenceResolver, SheetLookup};
