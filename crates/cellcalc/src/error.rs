//! Error types for cellcalc

use cellcalc_formula::FormulaError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the workbook host
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Bad address, sheet or name
    #[error(transparent)]
    Core(#[from] cellcalc_core::Error),

    /// A formula that could not be parsed or evaluated
    #[error(transparent)]
    Formula(#[from] FormulaError),
}
