//! # cellcalc-core
//!
//! Core data model shared by the cellcalc formula engine and its hosts.
//!
//! This crate provides:
//! - [`Value`] and [`ErrorKind`] - the universal calculation result type
//! - [`CellAddress`] - A1-style addressing on the grid
//! - [`Culture`] - decimal/list separators and the date system
//!
//! ## Example
//!
//! ```rust
//! use cellcalc_core::{CellAddress, ErrorKind, Value};
//!
//! let addr = CellAddress::parse("$B$2").unwrap();
//! assert_eq!((addr.row, addr.col), (1, 1));
//!
//! let v = Value::Error(ErrorKind::DivisionByZero);
//! assert_eq!(v.to_string(), "#DIV/0!");
//! ```

pub mod address;
pub mod culture;
pub mod error;
pub mod value;

pub use address::CellAddress;
pub use culture::{Culture, DateSystem};
pub use error::{Error, Result};
pub use value::{format_number, ErrorKind, Value, ValueType};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit: XFD)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a worksheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
