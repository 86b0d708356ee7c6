//! Page layout detection.
//!
//! A document is classified from the geometry of its first page only: text
//! blocks lying wholly left of the vertical midline and wholly right of it
//! indicate two columns. Blocks straddling the midline are ignored.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::PageBlock;
use crate::parser::{LayoutAnalyzer, LopdfBackend, PdfBackend};

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Layout of a document, computed once from page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", content = "message", rename_all = "lowercase")]
pub enum Layout {
    /// One column of text
    Simple,
    /// Two columns of text
    Double,
    /// The document could not be read; terminal for that document
    Error(String),
}

impl Layout {
    /// Whether detection failed.
    pub fn is_error(&self) -> bool {
        matches!(self, Layout::Error(_))
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Simple => write!(f, "simple"),
            Layout::Double => write!(f, "double"),
            Layout::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Side of the midline a block falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Straddling,
}

/// Place a block relative to the midline.
pub fn side_of(block: &PageBlock, midline: f32) -> Side {
    if block.bbox.x1 <= midline {
        Side::Left
    } else if block.bbox.x0 >= midline {
        Side::Right
    } else {
        Side::Straddling
    }
}

/// Classify a page from its width and blocks.
///
/// Returns [`Layout::Double`] iff at least one block lies wholly on each side
/// of `page_width / 2`.
pub fn classify_blocks(page_width: f32, blocks: &[PageBlock]) -> Layout {
    let midline = page_width / 2.0;
    let mut left = 0usize;
    let mut right = 0usize;

    for block in blocks {
        match side_of(block, midline) {
            Side::Left => left += 1,
            Side::Right => right += 1,
            Side::Straddling => {}
        }
    }

    log::debug!(
        "Page 1: {} blocks, {} left and {} right of x={:.1}",
        blocks.len(),
        left,
        right,
        midline
    );

    if left > 0 && right > 0 {
        Layout::Double
    } else {
        Layout::Simple
    }
}

/// Classifies documents as single- or dual-column.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutDetector;

impl LayoutDetector {
    /// Create a detector.
    pub fn new() -> Self {
        Self
    }

    /// Classify the document at `path`.
    ///
    /// Never fails: unreadable, encrypted, or page-less documents yield
    /// [`Layout::Error`] carrying the diagnostic.
    pub fn detect<P: AsRef<Path>>(&self, path: P) -> Layout {
        let path = path.as_ref();
        match fs::read(path)
            .map_err(Error::from)
            .and_then(|data| self.try_detect_bytes(&data))
        {
            Ok(layout) => layout,
            Err(e) => {
                log::warn!("Layout detection failed for {}: {}", path.display(), e);
                Layout::Error(e.to_string())
            }
        }
    }

    /// Classify a document held in memory.
    pub fn detect_bytes(&self, data: &[u8]) -> Layout {
        self.try_detect_bytes(data)
            .unwrap_or_else(|e| Layout::Error(e.to_string()))
    }

    fn try_detect_bytes(&self, data: &[u8]) -> Result<Layout> {
        if !is_pdf_bytes(data) {
            return Err(Error::FormatDetection("not a PDF file".to_string()));
        }
        let backend = LopdfBackend::load_bytes(data)?;
        self.detect_backend(&backend)
    }

    /// Classify through an already opened backend.
    pub fn detect_backend<B: PdfBackend + ?Sized>(&self, backend: &B) -> Result<Layout> {
        if backend.page_count() == 0 {
            return Err(Error::FormatDetection("document has no pages".to_string()));
        }
        let first = *backend
            .pages()
            .keys()
            .next()
            .ok_or_else(|| Error::FormatDetection("document has no pages".to_string()))?;

        let (width, blocks) = LayoutAnalyzer::new(backend).page_blocks(first)?;
        Ok(classify_blocks(width, &blocks))
    }
}

/// Check whether bytes start with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}
