//! Built-in spreadsheet functions and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVG`).
//! - Every built-in is a numeric aggregate: it receives the flattened list of
//!   argument values (ranges already expanded) and returns one number.
//! - If you add a new built-in, add a [`Function`] variant, list it in
//!   `BUILTINS` and implement it in [`Function::apply`]. The tokenizer picks
//!   names up from `BUILTINS`.

use crate::engine::{ErrorCode, EvalResult};

pub struct Builtin {
    pub sheet_name: &'static str,
    pub function: Function,
    #[allow(dead_code)]
    pub description: &'static str,
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        sheet_name: "SUM",
        function: Function::Sum,
        description: "Sum of numeric values",
    },
    Builtin {
        sheet_name: "AVG",
        function: Function::Avg,
        description: "Average of numeric values",
    },
];

/// A built-in aggregate function.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Function {
    Sum,
    Avg,
}

impl Function {
    /// Look up a built-in by its spreadsheet name.
    pub fn from_name(name: &str) -> Option<Function> {
        BUILTINS
            .iter()
            .find(|b| b.sheet_name == name)
            .map(|b| b.function)
    }

    pub fn name(&self) -> &'static str {
        BUILTINS
            .iter()
            .find(|b| b.function == *self)
            .map(|b| b.sheet_name)
            .unwrap_or("?")
    }

    /// Apply the aggregate to already-resolved argument values.
    pub fn apply(&self, values: &[f64]) -> EvalResult<f64> {
        match self {
            Function::Sum => Ok(values.iter().sum()),
            Function::Avg => {
                if values.is_empty() {
                    return Err(ErrorCode::DivZero);
                }
                Ok(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
    }
}
