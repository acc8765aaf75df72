//! Calculation culture
//!
//! The culture controls how numeric literals are written in formula text, which
//! character separates function arguments, and how date serials map to calendar
//! dates.

/// Base date used for date serial numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DateSystem {
    /// Serial 1 = 1900-01-01, including the fictional 1900-02-29 (serial 60)
    #[default]
    Excel1900,
    /// Serial 0 = 1904-01-01
    Excel1904,
}

/// Separators and date system used when parsing and coercing values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Culture {
    /// Decimal separator in number literals and number-to-text conversion
    pub decimal_separator: char,
    /// Separator between function arguments and array columns
    pub list_separator: char,
    /// Date system for serial numbers
    pub date_system: DateSystem,
}

impl Culture {
    /// The invariant (en-US style) culture: `.` decimals, `,` lists, 1900 dates
    pub const fn invariant() -> Self {
        Self {
            decimal_separator: '.',
            list_separator: ',',
            date_system: DateSystem::Excel1900,
        }
    }

    /// A culture with custom separators and the 1900 date system
    ///
    /// ```
    /// use cellcalc_core::Culture;
    ///
    /// let de = Culture::with_separators(',', ';');
    /// assert_eq!(de.decimal_separator, ',');
    /// ```
    pub const fn with_separators(decimal_separator: char, list_separator: char) -> Self {
        Self {
            decimal_separator,
            list_separator,
            date_system: DateSystem::Excel1900,
        }
    }

    /// Return a copy using the given date system
    pub const fn with_date_system(mut self, date_system: DateSystem) -> Self {
        self.date_system = date_system;
        self
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}
