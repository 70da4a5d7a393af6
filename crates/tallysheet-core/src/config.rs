//! Engine configuration, read from TOML.
//!
//! ```toml
//! max_iterations = 500
//! tokenizer = "lenient"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TallyError};
use tallysheet_engine::engine::TokenizePolicy;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Pass cap for fixpoint recomputation.
    pub max_iterations: usize,
    /// How the tokenizer treats characters it does not recognize.
    pub tokenizer: TokenizePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tokenizer: TokenizePolicy::Strict,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }

    /// Read a config file. Files over 1 MiB are refused.
    pub fn load(path: &Path) -> Result<Config> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            return Err(TallyError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Refusing to read {}: config file too large ({} bytes, max {})",
                    path.display(),
                    meta.len(),
                    MAX_CONFIG_FILE_BYTES
                ),
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Config> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }
}
