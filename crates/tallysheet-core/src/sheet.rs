//! Sheet storage: the mapping from cell identifier to cell record.
//!
//! The engine never holds this mapping; it reads it through
//! [`ValueLookup`], which `Sheet` implements.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use tallysheet_engine::engine::{CellId, CellValue, ErrorCode, EvalResult, ValueLookup, format_value};

/// One cell: what the user typed and what it currently shows.
///
/// Invariant: when `error` is set, `value` is that error's code.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub raw: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
}

impl CellRecord {
    /// A fresh record. Literals show their own text; formulas show nothing
    /// until evaluated.
    pub fn new(raw: &str) -> CellRecord {
        let value = if raw.starts_with('=') {
            String::new()
        } else {
            raw.to_string()
        };
        CellRecord {
            raw: raw.to_string(),
            value,
            error: None,
        }
    }

    pub fn is_formula(&self) -> bool {
        self.raw.starts_with('=')
    }

    pub fn set_error(&mut self, code: ErrorCode) -> bool {
        self.commit(code.to_string(), Some(code))
    }

    /// Store an evaluation result. Returns true if the value or error changed.
    pub fn apply(&mut self, result: EvalResult<CellValue>) -> bool {
        match result {
            Ok(CellValue::Error(code)) | Err(code) => self.set_error(code),
            Ok(value) => self.commit(format_value(&value), None),
        }
    }

    fn commit(&mut self, value: String, error: Option<ErrorCode>) -> bool {
        if self.value == value && self.error == error {
            return false;
        }
        self.value = value;
        self.error = error;
        true
    }
}

/// Cell records keyed by identifier, plus the identifiers removed by
/// structural deletion. Reading a deleted identifier yields `#REF!` until it
/// is written again.
#[derive(Clone, Debug, Default)]
pub struct Sheet {
    cells: BTreeMap<CellId, CellRecord>,
    deleted: BTreeSet<CellId>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &CellId) -> Option<&CellRecord> {
        self.cells.get(id)
    }

    pub fn get_mut(&mut self, id: &CellId) -> Option<&mut CellRecord> {
        self.cells.get_mut(id)
    }

    /// Write raw text to a cell, creating the record if needed.
    ///
    /// Literals take effect immediately; a formula keeps its previous value
    /// until it is evaluated.
    pub fn set_raw(&mut self, id: CellId, raw: &str) -> &mut CellRecord {
        self.deleted.remove(&id);
        let record = self
            .cells
            .entry(id)
            .or_insert_with(|| CellRecord::new(raw));
        if record.raw != raw {
            record.raw = raw.to_string();
            if !record.is_formula() {
                record.value = raw.to_string();
                record.error = None;
            }
        }
        record
    }

    /// Remove a cell's record (the cell becomes empty).
    pub fn remove(&mut self, id: &CellId) -> Option<CellRecord> {
        self.cells.remove(id)
    }

    /// Remove a cell's record and remember that it was deleted.
    pub fn delete(&mut self, id: CellId) -> Option<CellRecord> {
        self.deleted.insert(id);
        self.cells.remove(&id)
    }

    pub fn is_deleted(&self, id: &CellId) -> bool {
        self.deleted.contains(id)
    }

    /// Current derived value of a cell, as formulas see it.
    pub fn value_of(&self, id: &CellId) -> CellValue {
        match self.cells.get(id) {
            Some(CellRecord {
                error: Some(code), ..
            }) => CellValue::Error(*code),
            Some(record) if record.value.is_empty() => CellValue::Empty,
            Some(record) => CellValue::Text(record.value.clone()),
            None if self.deleted.contains(id) => CellValue::Error(ErrorCode::Ref),
            None => CellValue::Empty,
        }
    }

    /// Identifiers with a record, ascending.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = &CellId> {
        self.cells.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellId, &CellRecord)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of records without and with an error.
    pub fn count_states(&self) -> (usize, usize) {
        let errors = self.cells.values().filter(|r| r.error.is_some()).count();
        (self.cells.len() - errors, errors)
    }
}

impl ValueLookup for Sheet {
    fn value(&self, id: &CellId) -> CellValue {
        self.value_of(id)
    }
}
