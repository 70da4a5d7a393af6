//! Cell identifier parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style identifiers
//! (e.g., "A1", "B2", "AA100") and one-indexed column/row numbers. Columns
//! use bijective base-26: `Z` is followed by `AA`, there is no zero digit.
//!
//! # Examples
//!
//! ```
//! use tallysheet_engine::engine::CellId;
//!
//! let cell = CellId::parse("B3").unwrap();
//! assert_eq!(cell.col, 2);
//! assert_eq!(cell.row, 3);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Upper bound on the number of cells a single range may expand to.
pub const MAX_RANGE_CELLS: usize = 1_000_000;

/// A cell identifier: column and row, both one-indexed.
///
/// Ordering is column-major (`A1 < A2 < B1`).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellId {
    pub col: u32,
    pub row: u32,
}

impl CellId {
    /// Build an identifier from one-indexed coordinates.
    /// Returns None if either coordinate is zero.
    pub fn new(col: u32, row: u32) -> Option<CellId> {
        (col > 0 && row > 0).then_some(CellId { col, row })
    }

    /// Parse an identifier in `A1` notation (uppercase letters only).
    pub fn parse(name: &str) -> Option<CellId> {
        let caps = cell_id_re().captures(name)?;
        let col = letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<u32>().ok()?;
        CellId::new(col, row)
    }

    /// Column letters of this identifier (e.g. `AA` for `AA12`).
    pub fn col_letters(&self) -> String {
        col_to_letters(self.col)
    }
}

fn cell_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Z]+)(?<numbers>[0-9]+)$").expect("cell id regex must compile")
    })
}

/// Convert a one-indexed column number to letters (1 -> A, 26 -> Z, 27 -> AA).
/// Column 0 has no letters and yields an empty string.
pub fn col_to_letters(col: u32) -> String {
    let mut result = Vec::new();
    let mut n = col;
    while n > 0 {
        n -= 1;
        result.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    result.reverse();
    String::from_utf8(result).unwrap_or_default()
}

/// Convert column letters to a one-indexed column number (A -> 1, AA -> 27).
/// Returns None for empty input, non-uppercase characters or overflow.
pub fn letters_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut acc = 0u32;
    for c in letters.bytes() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        let digit = (c - b'A') as u32 + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc)
}

/// Expand a rectangular range into its cells.
///
/// Iterates columns in the outer loop and rows in the inner loop, from the
/// smaller to the larger bound of each axis, so `B2:A1` and `A1:B2` both give
/// `A1, A2, B1, B2`. Returns None when the range exceeds [`MAX_RANGE_CELLS`].
pub fn expand_range(start: CellId, end: CellId) -> Option<Vec<CellId>> {
    let (min_col, max_col) = (start.col.min(end.col), start.col.max(end.col));
    let (min_row, max_row) = (start.row.min(end.row), start.row.max(end.row));

    let col_count = (max_col - min_col) as usize + 1;
    let row_count = (max_row - min_row) as usize + 1;
    let cell_count = col_count.checked_mul(row_count)?;
    if cell_count > MAX_RANGE_CELLS {
        return None;
    }

    let mut cells = Vec::with_capacity(cell_count);
    for col in min_col..=max_col {
        for row in min_row..=max_row {
            cells.push(CellId { col, row });
        }
    }
    Some(cells)
}

impl std::str::FromStr for CellId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl TryFrom<String> for CellId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellId> for String {
    fn from(id: CellId) -> String {
        id.to_string()
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row)
    }
}
