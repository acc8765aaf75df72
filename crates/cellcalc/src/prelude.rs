//! Prelude module - common imports for cellcalc users
//!
//! ```rust
//! use cellcalc::prelude::*;
//! ```

pub use crate::{
    evaluate_expr,
    CellAddress,
    CellContent,
    // Settings
    Culture,
    DateSystem,
    // Error types
    Error,
    ErrorKind,
    FormulaError,
    FunctionRegistry,
    NameScope,
    Result,
    // Cell types
    Value,
    // Main types
    Workbook,
    Worksheet,
};
