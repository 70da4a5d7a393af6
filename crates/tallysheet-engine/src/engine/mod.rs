//! Spreadsheet engine API.
//!
//! This module provides the formula-evaluation core of the spreadsheet:
//!
//! - [`CellId`] - Cell identifier parsing (A1 notation ↔ column/row numbers)
//! - [`tokenize`] - Split formula text into typed lexemes
//! - [`resolve`] - Substitute references and inline `SUM`/`AVG` calls
//! - [`evaluate`] / [`evaluate_formula`] - Operator-precedence arithmetic
//! - [`extract_references`] - Parse the cells a formula reads
//! - [`DependencyGraph`] - Bidirectional dependency edges and cycle detection
//! - [`format_value`] - Format values for display
//!
//! Nothing here stores a sheet. Every evaluation takes a [`ValueLookup`]
//! supplied by the caller.

mod cell_ref;
mod cycle;
mod deps;
mod error;
mod eval;
mod format;
mod graph;
mod resolve;
mod tokenize;
mod value;

pub use crate::builtins::Function;
pub use cell_ref::{CellId, MAX_RANGE_CELLS, col_to_letters, expand_range, letters_to_col};
pub use deps::extract_references;
pub use error::{ErrorCode, EvalResult};
pub use eval::{evaluate, evaluate_formula};
pub use format::{format_number, format_value};
pub use graph::DependencyGraph;
pub use resolve::{Resolved, resolve};
pub use tokenize::{Operator, Token, TokenizePolicy, tokenize};
pub use value::{CellValue, ValueLookup, parse_numeric};
