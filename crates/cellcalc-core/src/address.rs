//! A1-style cell addresses

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// One cell on the grid, as written `B7` or `$B$7`
///
/// Both components are stored 0-based; a `$` marker makes a component
/// absolute so it stays put when a formula is copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

impl CellAddress {
    /// A relative address
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Read an address such as `A1` or `$XFD$1048576`
    ///
    /// # Examples
    /// ```
    /// use cellcalc_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A1").unwrap();
    /// assert_eq!((addr.row, addr.col), (0, 0));
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!(addr.row, 1);
    /// assert!(addr.row_absolute && addr.col_absolute);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = |why: &str| Error::InvalidAddress(format!("{} in '{}'", why, text));

        let (col_absolute, rest) = strip_dollar(text);
        let split = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(split);
        if letters.is_empty() {
            return Err(invalid("no column letters"));
        }
        let col = Self::letters_to_column(letters)?;

        let (row_absolute, digits) = strip_dollar(rest);
        if digits.is_empty() {
            return Err(invalid("no row number"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("bad row number"));
        }
        let row = match digits.parse::<u32>() {
            Ok(0) => return Err(invalid("row 0")),
            Ok(n) => n - 1,
            Err(_) => u32::MAX,
        };
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }

        Ok(Self {
            row,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// Column letters for a 0-based index: 0 is `A`, 26 is `AA`
    pub fn column_to_letters(col: u32) -> String {
        let mut letters = Vec::new();
        let mut n = u64::from(col) + 1;
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.iter().rev().map(|&b| char::from(b)).collect()
    }

    /// Column letters to an index on the grid; past `XFD` is an error
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        let col = Self::letters_to_index(letters)?;
        u16::try_from(col)
            .ok()
            .filter(|&col| col < MAX_COLS)
            .ok_or(Error::ColumnOutOfBounds(col, MAX_COLS - 1))
    }

    /// Column letters to an unbounded 0-based index
    ///
    /// Formula text may name columns past XFD; those are only rejected when
    /// the reference is resolved against the grid.
    pub fn letters_to_index(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        letters
            .chars()
            .try_fold(0u32, |acc, c| {
                if !c.is_ascii_alphabetic() {
                    return None;
                }
                let digit = u32::from(c.to_ascii_uppercase()) - u32::from('A') + 1;
                acc.checked_mul(26)?.checked_add(digit)
            })
            .map(|n| n - 1)
            .ok_or_else(|| Error::InvalidAddress(format!("bad column letters '{}'", letters)))
    }
}

fn strip_dollar(text: &str) -> (bool, &str) {
    match text.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollar = |absolute: bool| if absolute { "$" } else { "" };
        write!(
            f,
            "{}{}{}{}",
            dollar(self.col_absolute),
            Self::column_to_letters(u32::from(self.col)),
            dollar(self.row_absolute),
            self.row + 1
        )
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
