//! Error types for the juripdf library.

use std::io;
use thiserror::Error;

/// Result type alias for juripdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while ingesting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or copying files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The submitted path is missing, not a file, or not a `.pdf`.
    #[error("Invalid input: {0}")]
    InputValidation(String),

    /// The document could not be classified (corrupt, empty, unreadable).
    #[error("Format detection failed: {0}")]
    FormatDetection(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// The tokenizer, lemma lexicon or stop-word table could not be loaded.
    #[error("Linguistic pipeline initialization failed: {0}")]
    LinguisticInit(String),

    /// The chunk splitter rejected the document.
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// The index refused a chunk.
    #[error("Indexing error: {0}")]
    Indexing(String),

    /// Error in the bundled chunk store.
    #[error("Store error: {0}")]
    Store(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
