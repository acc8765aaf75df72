//! Formula error types
//!
//! These are authoring failures: the formula text itself cannot be evaluated.
//! Runtime calculation errors are values (`Value::Error`), never `FormulaError`.

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that stop a formula from being evaluated at all
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormulaError {
    /// Malformed formula text
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    /// An identifier that is neither a defined name nor a function
    #[error("The identifier '{0}' was not recognised.")]
    NameNotRecognized(String),

    /// Formula nesting exceeded the recursion ceiling
    #[error("Formula nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize },

    /// A cell formula that depends on itself
    #[error("Circular reference detected involving cell {0}")]
    CircularReference(String),
}

impl FormulaError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        FormulaError::Syntax {
            position,
            message: message.into(),
        }
    }
}
