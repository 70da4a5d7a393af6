//! tallysheet-core - UI-agnostic document model: sheet storage, the edit
//! protocol and fixpoint recomputation.

pub mod config;
pub mod document;
pub mod error;
pub mod recompute;
pub mod sheet;

pub use config::Config;
pub use document::{Document, parse_assignment, parse_cell_id, parse_column};
pub use error::{Result, TallyError};
pub use recompute::{RecomputeStats, recompute_all, recompute_all_with, recompute_cells};
pub use sheet::{CellRecord, Sheet};

pub use tallysheet_engine::engine::{CellId, ErrorCode, TokenizePolicy};
