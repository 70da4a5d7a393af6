//! Error codes surfaced in cells.
//!
//! Evaluation never unwinds: every failure in the tokenizer, resolver and
//! evaluator is one of these codes, returned through [`EvalResult`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A sheet-level error code, displayed in place of a cell's value.
#[derive(Error, Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed token stream, unbalanced parentheses, unknown function.
    #[error("#SYNTAX!")]
    #[serde(rename = "#SYNTAX!")]
    Syntax,

    /// Non-numeric text in a numeric context, or an unusable reference.
    #[error("#VALUE!")]
    #[serde(rename = "#VALUE!")]
    Value,

    /// Division by exactly zero, or `AVG` of no arguments.
    #[error("#DIV/0!")]
    #[serde(rename = "#DIV/0!")]
    DivZero,

    /// The formula depends on a deleted cell.
    #[error("#REF!")]
    #[serde(rename = "#REF!")]
    Ref,

    /// Accepting the formula would close a dependency cycle.
    #[error("#CYCLE!")]
    #[serde(rename = "#CYCLE!")]
    Cycle,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 5] = [
        ErrorCode::Syntax,
        ErrorCode::Value,
        ErrorCode::DivZero,
        ErrorCode::Ref,
        ErrorCode::Cycle,
    ];

    /// The display code, e.g. `#DIV/0!`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Syntax => "#SYNTAX!",
            ErrorCode::Value => "#VALUE!",
            ErrorCode::DivZero => "#DIV/0!",
            ErrorCode::Ref => "#REF!",
            ErrorCode::Cycle => "#CYCLE!",
        }
    }

    /// Recognize a displayed code.
    pub fn parse(code: &str) -> Option<ErrorCode> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }
}

pub type EvalResult<T> = std::result::Result<T, ErrorCode>;

#[cfg(test)]
mod tests {
    use super::ErrorCode;

    #[test]
    fn test_display_matches_parse() {
        for code in ErrorCode::ALL {
            assert_eq!(code.to_string(), code.as_str());
            assert_eq!(ErrorCode::parse(&code.to_string()), Some(code));
        }
        assert_eq!(ErrorCode::parse("#NAME?"), None);
    }
}
