//! Default collaborators for the orchestrator.
//!
//! A word-window splitter, a JSON-lines chunk store that also answers
//! questions by lemma overlap, and a document source over the working
//! directory.

mod chunk_store;
mod splitter;

pub use chunk_store::{ChunkStore, ScoredChunk, StoredChunk, DEFAULT_TOP_K, NO_ANSWER};
pub use splitter::{TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::ingest::DocumentSource;
use crate::model::SourceDocument;

/// Every `.pdf` file directly inside a directory, sorted by name.
#[derive(Debug, Clone)]
pub struct PdfDirectory {
    dir: PathBuf,
}

impl PdfDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSource for PdfDirectory {
    fn load_documents(&self) -> Result<Vec<SourceDocument>> {
        if !self.dir.is_dir() {
            log::debug!("{} does not exist, no documents", self.dir.display());
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_pdf = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if is_pdf && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        paths.iter().map(SourceDocument::open).collect()
    }
}
