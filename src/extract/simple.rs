//! Single-column extraction.

use crate::error::Result;
use crate::normalize::TextNormalizer;
use crate::parser::PdfBackend;

use super::Extractor;

/// Reads pages in order and normalizes the whole document once.
#[derive(Debug, Clone)]
pub struct SimpleExtractor {
    normalizer: TextNormalizer,
}

impl SimpleExtractor {
    /// Create an extractor around a normalizer.
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer }
    }

    /// Raw page texts, each followed by a newline.
    pub fn raw_text(&self, backend: &dyn PdfBackend) -> Result<String> {
        let mut text = String::new();
        for page_num in backend.pages().keys() {
            text.push_str(&backend.page_text(*page_num)?);
            text.push('\n');
        }
        Ok(text)
    }
}

impl Extractor for SimpleExtractor {
    fn name(&self) -> &str {
        "simple"
    }

    fn extract_backend(&self, backend: &dyn PdfBackend) -> Result<String> {
        let raw = self.raw_text(backend)?;
        log::debug!(
            "Simple extraction: {} pages, {} raw chars",
            backend.page_count(),
            raw.len()
        );
        Ok(self.normalizer.normalize(&raw))
    }
}
