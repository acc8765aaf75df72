//! Reference resolution
//!
//! Address expressions keep the coordinates exactly as the formula text wrote
//! them, together with their `$` markers. Binding them to a concrete sheet and
//! checking them against the grid happens here, at evaluation time, so a bad
//! reference becomes a `#REF!` value rather than a parse failure.

use cellcalc_core::{CellAddress, ErrorKind, MAX_COLS, MAX_ROWS};
use lazy_regex::regex_is_match;
use std::fmt;

/// A cell address as written in formula text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressExpr {
    /// Explicit sheet qualifier, if any
    pub sheet: Option<String>,
    /// Row index (0-based), possibly outside the grid
    pub row: u32,
    /// Column index (0-based), possibly outside the grid
    pub col: u32,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

impl AddressExpr {
    /// Create a relative address on the formula's own sheet
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            sheet: None,
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Parse the text of a cell-reference token (`B7`, `$AB$12`)
    ///
    /// Coordinates beyond the grid are kept; rows too large for `u32` saturate.
    pub fn parse(text: &str, sheet: Option<String>) -> Option<Self> {
        let (col_absolute, rest) = match text.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let split = rest.find(|c: char| !c.is_ascii_alphabetic())?;
        let (letters, rest) = rest.split_at(split);
        let (row_absolute, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let col = CellAddress::letters_to_index(letters).ok()?;
        let row = digits.parse::<u32>().unwrap_or(u32::MAX).checked_sub(1)?;

        Some(Self {
            sheet,
            row,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// Whether either component moves when the formula is copied
    pub fn is_relative(&self) -> bool {
        !self.row_absolute || !self.col_absolute
    }

    /// Shift the relative components by the given deltas
    ///
    /// Returns `None` when a shifted component leaves the grid.
    pub fn offset(&self, rows: i64, cols: i64) -> Option<AddressExpr> {
        let row = if self.row_absolute {
            self.row
        } else {
            shift(self.row, rows, MAX_ROWS)?
        };
        let col = if self.col_absolute {
            self.col
        } else {
            shift(self.col, cols, MAX_COLS as u32)?
        };

        Some(AddressExpr {
            row,
            col,
            ..self.clone()
        })
    }

    /// Write the address without its sheet qualifier
    pub(crate) fn fmt_local(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col_absolute {
            f.write_str("$")?;
        }
        f.write_str(&CellAddress::column_to_letters(self.col))?;
        if self.row_absolute {
            f.write_str("$")?;
        }
        write!(f, "{}", u64::from(self.row) + 1)
    }
}

fn shift(value: u32, delta: i64, limit: u32) -> Option<u32> {
    let shifted = i64::from(value) + delta;
    if (0..i64::from(limit)).contains(&shifted) {
        Some(shifted as u32)
    } else {
        None
    }
}

impl fmt::Display for AddressExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", quote_sheet_name(sheet))?;
        }
        self.fmt_local(f)
    }
}

/// Quote a sheet name for formula text when it is not a plain identifier
pub fn quote_sheet_name(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .map_or(false, |c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !regex_is_match!(r"^[A-Za-z]{1,3}[0-9]+$", name)
        && !name.eq_ignore_ascii_case("TRUE")
        && !name.eq_ignore_ascii_case("FALSE");

    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// The cell a formula is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Origin {
    /// Sheet index in the host's sheet order
    pub sheet: usize,
    pub row: u32,
    pub col: u32,
}

impl Origin {
    pub fn new(sheet: usize, row: u32, col: u32) -> Self {
        Self { sheet, row, col }
    }
}

/// Sheet name lookup supplied by the host
pub trait SheetLookup {
    /// Index of the sheet with this name (case-insensitive), if it exists
    fn sheet_index(&self, name: &str) -> Option<usize>;
}

/// A bound single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedCell {
    pub sheet: usize,
    pub row: u32,
    pub col: u32,
}

/// A bound rectangular block of cells on one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Area {
    pub sheet: usize,
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Area {
    /// Create an area from two corners in any order
    pub fn new(sheet: usize, row1: u32, col1: u32, row2: u32, col2: u32) -> Self {
        Self {
            sheet,
            top: row1.min(row2),
            left: col1.min(col2),
            bottom: row1.max(row2),
            right: col1.max(col2),
        }
    }

    pub fn single(cell: ResolvedCell) -> Self {
        Self::new(cell.sheet, cell.row, cell.col, cell.row, cell.col)
    }

    pub fn rows(&self) -> u32 {
        self.bottom - self.top + 1
    }

    pub fn cols(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn is_single_cell(&self) -> bool {
        self.top == self.bottom && self.left == self.right
    }

    pub fn contains(&self, sheet: usize, row: u32, col: u32) -> bool {
        sheet == self.sheet
            && (self.top..=self.bottom).contains(&row)
            && (self.left..=self.right).contains(&col)
    }

    /// The overlap of two areas, `None` when they share no cell
    pub fn intersect(&self, other: &Area) -> Option<Area> {
        if self.sheet != other.sheet {
            return None;
        }
        let top = self.top.max(other.top);
        let left = self.left.max(other.left);
        let bottom = self.bottom.min(other.bottom);
        let right = self.right.min(other.right);

        (top <= bottom && left <= right).then(|| Area {
            sheet: self.sheet,
            top,
            left,
            bottom,
            right,
        })
    }

    /// The smallest area covering both
    pub fn bounding(&self, other: &Area) -> Option<Area> {
        (self.sheet == other.sheet).then(|| Area {
            sheet: self.sheet,
            top: self.top.min(other.top),
            left: self.left.min(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.max(other.right),
        })
    }

    /// Implicit intersection: the single cell of this area that shares the
    /// origin's row (for a column) or column (for a row)
    ///
    /// Two-dimensional areas and areas that miss the origin give `None`.
    pub fn collapse(&self, origin: Origin) -> Option<ResolvedCell> {
        let cell = |row, col| ResolvedCell {
            sheet: self.sheet,
            row,
            col,
        };

        if self.is_single_cell() {
            Some(cell(self.top, self.left))
        } else if self.left == self.right {
            (self.top..=self.bottom)
                .contains(&origin.row)
                .then(|| cell(origin.row, self.left))
        } else if self.top == self.bottom {
            (self.left..=self.right)
                .contains(&origin.col)
                .then(|| cell(self.top, origin.col))
        } else {
            None
        }
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = ResolvedCell> + '_ {
        (self.top..=self.bottom).flat_map(move |row| {
            (self.left..=self.right).map(move |col| ResolvedCell {
                sheet: self.sheet,
                row,
                col,
            })
        })
    }
}

/// Binds address expressions to sheets and grid coordinates
pub struct ReferenceResolver<'a, S: ?Sized> {
    sheets: &'a S,
}

impl<'a, S: SheetLookup + ?Sized> ReferenceResolver<'a, S> {
    pub fn new(sheets: &'a S) -> Self {
        Self { sheets }
    }

    fn sheet_of(&self, addr: &AddressExpr, default: usize) -> Result<usize, ErrorKind> {
        match &addr.sheet {
            Some(name) => self
                .sheets
                .sheet_index(name)
                .ok_or(ErrorKind::CellReference),
            None => Ok(default),
        }
    }

    /// Resolve a single cell; unknown sheets and off-grid cells are `#REF!`
    pub fn resolve_cell(
        &self,
        addr: &AddressExpr,
        origin: Origin,
    ) -> Result<ResolvedCell, ErrorKind> {
        let sheet = self.sheet_of(addr, origin.sheet)?;
        if addr.row >= MAX_ROWS || addr.col >= MAX_COLS as u32 {
            return Err(ErrorKind::CellReference);
        }

        Ok(ResolvedCell {
            sheet,
            row: addr.row,
            col: addr.col,
        })
    }

    /// Resolve a two-corner range
    ///
    /// An unqualified second corner lives on the first corner's sheet; corners
    /// on two different sheets are `#REF!`.
    pub fn resolve_range(
        &self,
        start: &AddressExpr,
        end: &AddressExpr,
        origin: Origin,
    ) -> Result<Area, ErrorKind> {
        let first = self.resolve_cell(start, origin)?;
        let origin_for_end = Origin {
            sheet: first.sheet,
            ..origin
        };
        let second = self.resolve_cell(end, origin_for_end)?;

        if first.sheet != second.sheet {
            return Err(ErrorKind::CellReference);
        }
        Ok(Area::new(
            first.sheet,
            first.row,
            first.col,
            second.row,
            second.col,
        ))
    }
}
