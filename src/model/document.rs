//! Document-level types.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// A submitted PDF: an immutable byte blob plus the path it was read from.
///
/// Deduplication identifies documents by [`file_name`](Self::file_name), not
/// by content.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl SourceDocument {
    /// Read a document from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        Ok(Self { path, bytes })
    }

    /// Wrap bytes that were already read.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    /// Path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw bytes of the document.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Final path component, used as the dedup key.
    pub fn file_name(&self) -> Result<String> {
        file_name_of(&self.path)
    }

    /// Hex-encoded SHA-256 of the bytes.
    pub fn content_hash(&self) -> String {
        hash_bytes(&self.bytes)
    }
}

/// A unit of normalized text with free-form metadata.
///
/// The whole normalized document is wrapped in one of these before it is
/// handed to the chunk splitter, and every chunk comes back as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocument {
    /// Text content
    pub content: String,
    /// Metadata such as `source`
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl TextDocument {
    /// Create a document without metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `source` metadata entry, if any.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").map(String::as_str)
    }
}

/// Final component of a path as an owned string.
pub(crate) fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InputValidation(format!("{} has no file name", path.display())))
}

/// Hex-encoded SHA-256 of a byte slice.
pub(crate) fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
