//! Calculation values and error kinds

use crate::culture::Culture;
use std::fmt;

/// Calculation error kinds
///
/// This is the closed set of errors a formula can produce as an in-cell value.
/// `None` is never produced by evaluation; it is what [`Value::error_kind`]
/// reports for values that are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// No error
    None,
    /// #REF! - Invalid cell reference
    CellReference,
    /// #VALUE! - Wrong type of argument or operand
    CellValue,
    /// #DIV/0! - Division by zero
    DivisionByZero,
    /// #NAME? - Unrecognized formula name
    NameNotRecognized,
    /// #N/A - Value not available
    NoValueAvailable,
    /// #NULL! - Empty range intersection
    NullValue,
    /// #NUM! - Invalid numeric value
    NumberInvalid,
}

impl ErrorKind {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::None => "",
            ErrorKind::CellReference => "#REF!",
            ErrorKind::CellValue => "#VALUE!",
            ErrorKind::DivisionByZero => "#DIV/0!",
            ErrorKind::NameNotRecognized => "#NAME?",
            ErrorKind::NoValueAvailable => "#N/A",
            ErrorKind::NullValue => "#NULL!",
            ErrorKind::NumberInvalid => "#NUM!",
        }
    }

    /// Parse an error literal such as `#DIV/0!` (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "#NULL!" => Some(ErrorKind::NullValue),
            "#DIV/0!" => Some(ErrorKind::DivisionByZero),
            "#VALUE!" => Some(ErrorKind::CellValue),
            "#REF!" => Some(ErrorKind::CellReference),
            "#NAME?" => Some(ErrorKind::NameNotRecognized),
            "#NUM!" => Some(ErrorKind::NumberInvalid),
            "#N/A" => Some(ErrorKind::NoValueAvailable),
            _ => None,
        }
    }

    /// The number ERROR.TYPE reports for this error
    pub fn type_code(&self) -> Option<u8> {
        match self {
            ErrorKind::None => None,
            ErrorKind::NullValue => Some(1),
            ErrorKind::DivisionByZero => Some(2),
            ErrorKind::CellValue => Some(3),
            ErrorKind::CellReference => Some(4),
            ErrorKind::NameNotRecognized => Some(5),
            ErrorKind::NumberInvalid => Some(6),
            ErrorKind::NoValueAvailable => Some(7),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Blank,
    Number,
    Text,
    Logical,
    Error,
    Array,
}

/// The universal calculation value
///
/// Dates are numbers (serials) at this level. An `Error` is opaque data: it is
/// never coerced by arithmetic or comparison, only propagated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// An empty cell
    #[default]
    Blank,
    Number(f64),
    Text(String),
    Logical(bool),
    Error(ErrorKind),
    /// Rows of values
    Array(Vec<Vec<Value>>),
}

impl Value {
    /// Get the type tag
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Blank => ValueType::Blank,
            Value::Number(_) => ValueType::Number,
            Value::Text(_) => ValueType::Text,
            Value::Logical(_) => ValueType::Logical,
            Value::Error(_) => ValueType::Error,
            Value::Array(_) => ValueType::Array,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Get the error if this is one
    pub fn error(&self) -> Option<ErrorKind> {
        match self {
            Value::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// The error kind of this value, `ErrorKind::None` when it is not an error
    pub fn error_kind(&self) -> ErrorKind {
        self.error().unwrap_or(ErrorKind::None)
    }

    /// Logical interpretation, where one exists
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Logical(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            Value::Blank => Some(false),
            Value::Text(s) => {
                if s.eq_ignore_ascii_case("TRUE") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("FALSE") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Display text of this value in the given culture
    ///
    /// This is the form used by concatenation and text functions.
    pub fn to_text(&self, culture: &Culture) -> String {
        match self {
            Value::Blank => String::new(),
            Value::Number(n) => format_number(*n, culture.decimal_separator),
            Value::Text(s) => s.clone(),
            Value::Logical(true) => "TRUE".to_string(),
            Value::Logical(false) => "FALSE".to_string(),
            Value::Error(e) => e.as_str().to_string(),
            Value::Array(rows) => rows
                .first()
                .and_then(|row| row.first())
                .map(|v| v.to_text(culture))
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(&Culture::invariant()))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<ErrorKind> for Value {
    fn from(e: ErrorKind) -> Self {
        Value::Error(e)
    }
}

/// Format a number the way the General format shows it in formulas
///
/// Up to 15 significant digits, no trailing zeros, scientific notation for very
/// large or very small magnitudes.
pub fn format_number(n: f64, decimal_separator: char) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }

    // Round to 15 significant digits
    let rounded: f64 = format!("{:.14e}", n).parse().unwrap_or(n);
    let abs = rounded.abs();

    let text = if abs >= 1e15 || abs < 1e-9 {
        let sci = format!("{:E}", rounded);
        match sci.split_once('E') {
            Some((mantissa, exp)) if exp.starts_with('-') => format!("{}E{}", mantissa, exp),
            Some((mantissa, exp)) => format!("{}E+{}", mantissa, exp),
            None => sci,
        }
    } else {
        format!("{}", rounded)
    };

    if decimal_separator == '.' {
        text
    } else {
        text.replace('.', &decimal_separator.to_string())
    }
}
