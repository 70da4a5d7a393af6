//! Document state and logic (UI-agnostic).

mod input;
mod ops;
mod state;

pub use input::{parse_assignment, parse_cell_id, parse_column};
pub use state::Document;
