//! Ingestion orchestrator.
//!
//! Runs one submitted PDF through dedup, copy, layout detection, extraction,
//! chunking and indexing. Each document's pipeline is a single blocking call
//! sequence; pages and chunks are processed in order.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use juripdf::ingest::{IngestOptions, Ingestor};
//! use juripdf::store::{ChunkStore, TextSplitter};
//! use juripdf::TextNormalizer;
//!
//! fn main() -> juripdf::Result<()> {
//!     let normalizer = TextNormalizer::french()?;
//!     let store = Arc::new(ChunkStore::open("index/chunks.jsonl", normalizer.clone())?);
//!     let ingestor = Ingestor::new(
//!         IngestOptions::default(),
//!         normalizer,
//!         Arc::new(TextSplitter::default()),
//!         store,
//!     );
//!     let outcome = ingestor.ingest("contrat.pdf")?;
//!     println!("{}: {}", outcome.file_name, outcome.state);
//!     Ok(())
//! }
//! ```

mod collab;
mod options;
mod state;

pub use collab::{ChunkIndex, ChunkSplitter, DocumentSource, QueryEngine};
pub use options::{DedupPolicy, IngestOptions, DEFAULT_DATA_DIR};
pub use state::{IngestOutcome, IngestState};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::detect::{Layout, LayoutDetector};
use crate::error::{Error, Result};
use crate::extract::extractor_for;
use crate::model::{file_name_of, hash_bytes, SourceDocument, TextDocument};
use crate::normalize::TextNormalizer;

/// Check that `path` names an existing regular file with a `.pdf` extension.
pub fn validate_input<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::InputValidation(format!(
            "{} does not exist",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(Error::InputValidation(format!(
            "{} is not a file",
            path.display()
        )));
    }
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(Error::InputValidation(format!(
            "{} is not a .pdf file",
            path.display()
        )));
    }
    Ok(())
}

/// Copy `from` to `to` byte for byte, keeping the modification time when the
/// platform allows it.
fn copy_preserving_mtime(from: &Path, to: &Path) -> Result<u64> {
    let copied = fs::copy(from, to)?;
    let modified = fs::metadata(from).and_then(|m| m.modified());
    if let Ok(modified) = modified {
        let result = fs::File::options()
            .write(true)
            .open(to)
            .and_then(|file| file.set_modified(modified));
        if let Err(e) = result {
            log::debug!("Could not keep mtime of {}: {}", to.display(), e);
        }
    }
    Ok(copied)
}

/// Copy `from` to `to`, then read the copy back with `open`. When either
/// step fails the copy is removed so the file name is not taken by a file
/// that never went through the pipeline.
fn copy_then_open<T>(
    from: &Path,
    to: &Path,
    open: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    let result = copy_preserving_mtime(from, to).and_then(|_| open(to));
    if result.is_err() && to.is_file() {
        if let Err(e) = fs::remove_file(to) {
            log::warn!("Could not remove partial copy {}: {}", to.display(), e);
        }
    }
    result
}

/// The ingestion orchestrator.
#[derive(Clone)]
pub struct Ingestor {
    options: IngestOptions,
    detector: LayoutDetector,
    normalizer: TextNormalizer,
    splitter: Arc<dyn ChunkSplitter>,
    index: Arc<dyn ChunkIndex>,
}

impl Ingestor {
    /// Create an orchestrator around its collaborators.
    pub fn new(
        options: IngestOptions,
        normalizer: TextNormalizer,
        splitter: Arc<dyn ChunkSplitter>,
        index: Arc<dyn ChunkIndex>,
    ) -> Self {
        Self {
            options,
            detector: LayoutDetector::new(),
            normalizer,
            splitter,
            index,
        }
    }

    /// Options in effect.
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Where a file of this name lives in the working directory.
    pub fn destination(&self, file_name: &str) -> PathBuf {
        self.options.data_dir.join(file_name)
    }

    /// Whether the working directory already holds a file of this name.
    pub fn is_processed(&self, file_name: &str) -> bool {
        self.destination(file_name).is_file()
    }

    /// Ingest one document.
    ///
    /// Invalid input is an `Err`. Everything after validation is reported in
    /// the returned [`IngestOutcome`]; only I/O failures around the copy are
    /// surfaced as errors.
    pub fn ingest<P: AsRef<Path>>(&self, path: P) -> Result<IngestOutcome> {
        let path = path.as_ref();
        validate_input(path)?;
        fs::create_dir_all(&self.options.data_dir)?;

        let file_name = file_name_of(path)?;
        let destination = self.destination(&file_name);
        let mut outcome = IngestOutcome::new(&file_name, &destination);

        if let Some(existing) = self.find_duplicate(path, &file_name)? {
            log::warn!(
                "{} already in {} as {}, skipping",
                file_name,
                self.options.data_dir.display(),
                existing
            );
            outcome.advance(IngestState::SkippedDuplicate);
            return Ok(outcome);
        }

        let document = copy_then_open(path, &destination, |p| SourceDocument::open(p))?;
        log::info!("Saved {} to {}", file_name, destination.display());
        outcome.advance(IngestState::Copied);

        self.process(&mut outcome, &document);
        Ok(outcome)
    }

    /// Ingest several documents.
    ///
    /// With [`IngestOptions::parallel`] documents run as independent rayon
    /// tasks. Two paths sharing a file name in one parallel batch race on
    /// the working directory.
    pub fn ingest_many<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<Result<IngestOutcome>> {
        if self.options.parallel {
            paths.par_iter().map(|p| self.ingest(p)).collect()
        } else {
            paths.iter().map(|p| self.ingest(p)).collect()
        }
    }

    /// Clear the index and rebuild it from every document `source` lists.
    ///
    /// Documents are taken as already copied; no dedup check runs.
    pub fn reindex(&self, source: &dyn DocumentSource) -> Result<Vec<IngestOutcome>> {
        self.index.clear_index()?;
        let documents = source.load_documents()?;
        log::info!("Re-indexing {} documents", documents.len());

        let outcomes = documents
            .iter()
            .map(|document| {
                let file_name = file_name_of(document.path())?;
                let mut outcome =
                    IngestOutcome::starting_at(file_name, document.path(), IngestState::Copied);
                self.process(&mut outcome, document);
                Ok(outcome)
            })
            .collect::<Result<Vec<_>>>()?;

        let indexed = outcomes.iter().filter(|o| o.is_indexed()).count();
        log::info!("Re-indexed {} of {} documents", indexed, outcomes.len());
        Ok(outcomes)
    }

    /// Name of a file in the working directory that makes `path` a duplicate.
    fn find_duplicate(&self, path: &Path, file_name: &str) -> Result<Option<String>> {
        match self.options.dedup {
            DedupPolicy::FileName => Ok(self
                .is_processed(file_name)
                .then(|| file_name.to_string())),
            DedupPolicy::ContentHash => {
                let hash = hash_bytes(&fs::read(path)?);
                for entry in fs::read_dir(&self.options.data_dir)? {
                    let entry = entry?;
                    if entry.file_type()?.is_file() && hash_bytes(&fs::read(entry.path())?) == hash
                    {
                        return Ok(Some(entry.file_name().to_string_lossy().into_owned()));
                    }
                }
                if self.is_processed(file_name) {
                    return Err(Error::InputValidation(format!(
                        "a different file named {} is already in {}",
                        file_name,
                        self.options.data_dir.display()
                    )));
                }
                Ok(None)
            }
        }
    }

    /// Run detection through indexing on a copied document.
    fn process(&self, outcome: &mut IngestOutcome, document: &SourceDocument) {
        let layout = self.detector.detect_bytes(document.bytes());
        outcome.layout = Some(layout.clone());
        if let Layout::Error(msg) = &layout {
            outcome.fail(msg);
            return;
        }
        log::info!("{}: format detected: {}", outcome.file_name, layout);
        outcome.advance(IngestState::FormatDetected);

        let text = match extractor_for(&layout, self.normalizer.clone(), self.options.column_order)
            .and_then(|extractor| extractor.extract_bytes(document.bytes()))
        {
            Ok(text) => text,
            Err(e) => {
                outcome.fail(e);
                return;
            }
        };
        outcome.advance(IngestState::Extracted);

        let logical = TextDocument::new(text)
            .with_metadata("source", outcome.file_name.clone())
            .with_metadata("layout", layout.to_string());
        let chunks = match self.splitter.split_into_chunks(&logical) {
            Ok(chunks) => chunks,
            Err(e) => {
                outcome.fail(e);
                return;
            }
        };
        outcome.chunks_total = chunks.len();
        outcome.advance(IngestState::Chunked);
        log::info!("{}: {} chunks", outcome.file_name, chunks.len());

        for chunk in &chunks {
            if let Err(e) = self.index.add_to_index(std::slice::from_ref(chunk)) {
                log::error!(
                    "{}: indexing stopped after {} of {} chunks: {}",
                    outcome.file_name,
                    outcome.chunks_indexed,
                    outcome.chunks_total,
                    e
                );
                outcome.error = Some(e.to_string());
                return;
            }
            outcome.chunks_indexed += 1;
        }
        outcome.advance(IngestState::Indexed);
        log::info!(
            "{}: indexed {} chunks",
            outcome.file_name,
            outcome.chunks_indexed
        );
    }
}
