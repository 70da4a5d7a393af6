//! Values exchanged between the engine and the caller's sheet storage.

use serde::{Deserialize, Serialize};

use super::cell_ref::CellId;
use super::error::ErrorCode;

/// The derived value of a cell as seen through a [`ValueLookup`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Error(ErrorCode),
}

impl CellValue {
    /// Interpret a display string: `""` is empty, error codes are errors,
    /// everything else is text.
    pub fn from_display(text: &str) -> CellValue {
        if text.is_empty() {
            CellValue::Empty
        } else if let Some(code) = ErrorCode::parse(text) {
            CellValue::Error(code)
        } else {
            CellValue::Text(text.to_string())
        }
    }

    /// Numeric view of the value: numbers as-is, numeric-looking text parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(t) => parse_numeric(t),
            CellValue::Empty | CellValue::Error(_) => None,
        }
    }
}

/// Parse numeric-looking text. Surrounding whitespace is ignored; `inf` and
/// `NaN` spellings are not numbers.
pub fn parse_numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Read access to the current derived values of a sheet.
///
/// The lookup must return the referenced cell's *derived* value (never its
/// raw formula text) and must reflect the sheet's state at call time.
pub trait ValueLookup {
    fn value(&self, id: &CellId) -> CellValue;
}

impl<F> ValueLookup for F
where
    F: Fn(&CellId) -> CellValue,
{
    fn value(&self, id: &CellId) -> CellValue {
        self(id)
    }
}
