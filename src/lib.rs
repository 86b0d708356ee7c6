//! # juripdf
//!
//! Layout-aware ingestion of legal PDF documents for question answering.
//!
//! A document's first page decides whether it is laid out in one or two
//! columns; the matching extractor reads its text, which is then reduced to
//! lower-cased French lemmas without stop words or punctuation and handed to
//! a chunk splitter and an index.
//!
//! ## Quick Start
//!
//! ```no_run
//! use juripdf::{LayoutDetector, TextNormalizer};
//! use juripdf::extract::{extractor_for, ColumnOrder};
//!
//! fn main() -> juripdf::Result<()> {
//!     let normalizer = TextNormalizer::french()?;
//!
//!     // Classify from page 1
//!     let layout = LayoutDetector::new().detect("bail.pdf");
//!
//!     // Extract and normalize
//!     let extractor = extractor_for(&layout, normalizer, ColumnOrder::default())?;
//!     println!("{}", extractor.extract("bail.pdf".as_ref())?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Layout detection**: single or dual column, from page-1 block geometry
//! - **Normalization**: whitespace and punctuation cleanup, lemmatization, stop-word removal
//! - **Ingestion**: name- or hash-based dedup, per-document state machine, re-indexing
//! - **Default store**: word-window chunking and a JSON-lines chunk index

pub mod detect;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod store;

// Re-export commonly used types
pub use detect::{is_pdf_bytes, Layout, LayoutDetector};
pub use error::{Error, Result};
pub use extract::{ColumnOrder, DoubleColumnExtractor, Extractor, SimpleExtractor};
pub use ingest::{
    validate_input, ChunkIndex, ChunkSplitter, DedupPolicy, DocumentSource, IngestOptions,
    IngestOutcome, IngestState, Ingestor, QueryEngine,
};
pub use model::{BBox, PageBlock, SourceDocument, TextDocument};
pub use normalize::{LinguisticModel, TextNormalizer, Token, Tokenizer};

use std::path::Path;

/// Classify the document at `path`.
///
/// # Example
///
/// ```no_run
/// use juripdf::{detect_layout, Layout};
///
/// if detect_layout("bail.pdf") == Layout::Double {
///     println!("two columns");
/// }
/// ```
pub fn detect_layout<P: AsRef<Path>>(path: P) -> Layout {
    LayoutDetector::new().detect(path)
}

/// Detect the layout of a PDF and return its normalized text.
///
/// Uses the default column order. A document whose layout cannot be
/// detected yields [`Error::FormatDetection`].
pub fn extract_normalized<P: AsRef<Path>>(path: P, normalizer: &TextNormalizer) -> Result<String> {
    let path = path.as_ref();
    let layout = detect_layout(path);
    let extractor = extract::extractor_for(&layout, normalizer.clone(), ColumnOrder::default())?;
    extractor.extract(path)
}

/// Normalize text with the embedded French model.
///
/// Builds the model on every call; keep a [`TextNormalizer`] around when
/// normalizing more than once.
pub fn normalize_text(text: &str) -> Result<String> {
    Ok(TextNormalizer::french()?.normalize(text))
}
