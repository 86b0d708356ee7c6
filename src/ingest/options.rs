//! Ingestion options and configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extract::ColumnOrder;

/// Working directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// How a submitted document is recognised as already processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// A file of the same name in the working directory means duplicate.
    /// The submitted bytes are never read.
    #[default]
    FileName,
    /// A file with the same SHA-256 anywhere in the working directory means
    /// duplicate. A same-named file with other content is rejected.
    ContentHash,
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupPolicy::FileName => write!(f, "file-name"),
            DedupPolicy::ContentHash => write!(f, "content-hash"),
        }
    }
}

impl FromStr for DedupPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file-name" | "name" => Ok(DedupPolicy::FileName),
            "content-hash" | "hash" => Ok(DedupPolicy::ContentHash),
            other => Err(Error::InputValidation(format!(
                "unknown dedup policy '{}'",
                other
            ))),
        }
    }
}

/// Options for the ingestion orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
    /// Flat working directory, one file per distinct name
    pub data_dir: PathBuf,

    /// Column handling on dual-column documents
    pub column_order: ColumnOrder,

    /// Duplicate detection
    pub dedup: DedupPolicy,

    /// Run independent documents of a batch on the rayon pool
    pub parallel: bool,
}

impl IngestOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the column order used on dual-column documents.
    pub fn with_column_order(mut self, order: ColumnOrder) -> Self {
        self.column_order = order;
        self
    }

    /// Set the dedup policy.
    pub fn with_dedup(mut self, dedup: DedupPolicy) -> Self {
        self.dedup = dedup;
        self
    }

    /// Enable or disable parallel batch ingestion.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            column_order: ColumnOrder::default(),
            dedup: DedupPolicy::default(),
            parallel: false,
        }
    }
}
