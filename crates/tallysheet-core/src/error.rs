//! Error types for Tallysheet core.
//!
//! Formula failures are not errors at this level: they are stored in cells
//! as [`ErrorCode`](tallysheet_engine::engine::ErrorCode)s. These are the
//! failures of the surrounding plumbing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid cell reference: {0}")]
    InvalidCellId(String),

    #[error("Invalid column: {0}")]
    InvalidColumn(String),

    #[error("Invalid assignment (expected ID=VALUE): {0}")]
    InvalidAssignment(String),
}

pub type Result<T> = std::result::Result<T, TallyError>;
