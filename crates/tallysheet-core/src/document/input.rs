//! Parsing of user-typed cell addresses and `ID=VALUE` assignments.

use crate::error::{Result, TallyError};
use tallysheet_engine::engine::{CellId, letters_to_col};

/// Parse a cell identifier such as `b12` or ` AA3 `. Case is ignored.
pub fn parse_cell_id(text: &str) -> Result<CellId> {
    let text = text.trim();
    CellId::parse(&text.to_ascii_uppercase())
        .ok_or_else(|| TallyError::InvalidCellId(text.to_string()))
}

/// Parse column letters (`A` = 1) into a column number.
pub fn parse_column(text: &str) -> Result<u32> {
    let text = text.trim();
    letters_to_col(&text.to_ascii_uppercase())
        .ok_or_else(|| TallyError::InvalidColumn(text.to_string()))
}

/// Split `A1=5` or `B1==A1*2` into the target cell and its raw text.
///
/// Only the first `=` separates; everything after it is the raw text
/// verbatim, so a formula keeps its own leading `=`.
pub fn parse_assignment(text: &str) -> Result<(CellId, String)> {
    let Some((target, raw)) = text.split_once('=') else {
        return Err(TallyError::InvalidAssignment(text.to_string()));
    };
    let id = parse_cell_id(target)?;
    Ok((id, raw.to_string()))
}
